use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel latency for a probe that failed, timed out or was blocked.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// File-tree document served by a mirror.
///
/// Providers disagree on how much of this they fill in; every field is
/// optional at the serde boundary. A document without top-level `children`
/// is rejected by the resolver, everything below that level degrades to
/// empty collections instead.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileTree {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<TreeNode>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
    #[serde(other)]
    Unknown,
}

/// One entry of a mirror's file tree, kept deliberately loose: providers
/// omit fields and invent node types, and a single odd entry must not sink
/// the whole document.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TreeNode {
    #[serde(rename = "type", default)]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<TreeNode>>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub download_link: Option<String>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, Some(NodeKind::Directory))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, Some(NodeKind::File))
    }

    /// Children with absent/malformed lists coerced to empty.
    pub fn child_nodes(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// One release version of the target software, with its downloadable files
/// keyed by architecture tag. A link can be present-but-null when the
/// provider lists an arch without a usable URL; the UI renders those as
/// disabled entries.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VersionEntry {
    pub label: String,
    pub arch_links: BTreeMap<String, Option<String>>,
}

impl VersionEntry {
    /// False means "no files available for this version", which is a valid
    /// per-version state and distinct from the source being unreachable.
    pub fn has_files(&self) -> bool {
        !self.arch_links.is_empty()
    }
}

/// Outcome of resolving one source: version directories in document order,
/// plus the provider's own "latest" label when the source is trusted to
/// mark it and the label names a version that actually exists.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResolvedSource {
    pub versions: Vec<VersionEntry>,
    pub recommended: Option<String>,
}

impl ResolvedSource {
    pub fn has_version_data(&self) -> bool {
        !self.versions.is_empty()
    }
}

/// A single probe measurement. Transient, never persisted.
#[derive(Serialize, Clone, Debug)]
pub struct LatencySample {
    pub source_id: String,
    pub latency_ms: f64,
}

impl LatencySample {
    pub fn is_reachable(&self) -> bool {
        self.latency_ms.is_finite()
    }
}
