use std::collections::BTreeMap;

use crate::models::{FileTree, TreeNode, VersionEntry};

/// Flattens a mirror's raw file tree into version directories with their
/// arch→link maps. All the shape defense lives here and in the serde
/// models; callers get plain data.
#[derive(Clone, Default)]
pub struct TreeNormalizer;

impl TreeNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Descend `nesting_hint` one segment at a time, then collect version
    /// directories at the reached level. A hint segment that cannot be
    /// followed stops the descent; the last level reached is used instead
    /// of failing the resolution.
    pub fn normalize(&self, tree: &FileTree, nesting_hint: &[String]) -> Vec<VersionEntry> {
        let mut current: &[TreeNode] = tree.children.as_deref().unwrap_or(&[]);

        for segment in nesting_hint {
            let next = current
                .iter()
                .find(|node| node.is_directory() && node.name.as_deref() == Some(segment.as_str()));
            match next {
                Some(dir) if dir.children.is_some() => current = dir.child_nodes(),
                _ => {
                    tracing::debug!("nested directory {} not found, using current level", segment);
                    break;
                }
            }
        }

        current
            .iter()
            .filter(|node| {
                node.is_directory()
                    && node.name.as_deref().map(|name| name != "root").unwrap_or(false)
            })
            .map(|dir| VersionEntry {
                label: dir.name.clone().unwrap_or_default(),
                arch_links: extract_arch_links(dir),
            })
            .collect()
    }
}

fn extract_arch_links(dir: &TreeNode) -> BTreeMap<String, Option<String>> {
    let mut links = BTreeMap::new();
    for child in dir.child_nodes() {
        if !child.is_file() {
            continue;
        }
        let Some(arch) = child.arch.as_deref().filter(|arch| !arch.is_empty()) else {
            continue;
        };
        links.insert(arch.to_string(), child.download_link.clone());
    }
    links
}
