use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{MirrorError, Result};

/// One named download mirror. Presentation fields are opaque to the engine
/// and ride along for the rendering layer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SourceDescriptor {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Relative path (joined against the fetcher's base URL) or absolute URL.
    pub location: String,
    /// Whether this source's own `latest` label is trusted.
    #[serde(default)]
    pub mark_latest: bool,
    /// Wrapper directories to descend before version directories appear.
    #[serde(default)]
    pub nesting_hint: Vec<String>,
}

impl SourceDescriptor {
    pub fn new(id: &str, display_name: &str, location: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: None,
            provider: None,
            icon: None,
            location: location.to_string(),
            mark_latest: false,
            nesting_hint: Vec::new(),
        }
    }

    pub fn mark_latest(mut self) -> Self {
        self.mark_latest = true;
        self
    }

    pub fn nested(mut self, hint: &[&str]) -> Self {
        self.nesting_hint = hint.iter().map(|segment| segment.to_string()).collect();
        self
    }

    pub fn provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }
}

/// Sources are grouped into a recursive category tree (one branch per
/// launcher flavour); the registry flattens it for lookup.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SourceCategory {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub children: Vec<SourceCategory>,
}

/// Read-only source table, constructed once at startup and passed by
/// reference to every consumer. No ambient globals.
#[derive(Clone, Debug)]
pub struct SourceRegistry {
    categories: Vec<SourceCategory>,
    flat: Vec<SourceDescriptor>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    pub fn new(categories: Vec<SourceCategory>) -> Self {
        let mut flat: Vec<SourceDescriptor> = Vec::new();
        for category in &categories {
            collect_sources(category, &mut flat);
        }

        let mut index = HashMap::new();
        let mut unique = Vec::new();
        for descriptor in flat {
            if index.contains_key(&descriptor.id) {
                tracing::warn!("duplicate source id {} ignored", descriptor.id);
                continue;
            }
            index.insert(descriptor.id.clone(), unique.len());
            unique.push(descriptor);
        }

        Self {
            categories,
            flat: unique,
            index,
        }
    }

    pub fn get(&self, id: &str) -> Result<&SourceDescriptor> {
        self.index
            .get(id)
            .map(|&position| &self.flat[position])
            .ok_or_else(|| MirrorError::UnknownSource(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn list<P>(&self, predicate: P) -> Vec<&SourceDescriptor>
    where
        P: Fn(&SourceDescriptor) -> bool,
    {
        self.flat.iter().filter(|source| predicate(source)).collect()
    }

    /// All sources in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.flat.iter()
    }

    pub fn categories(&self) -> &[SourceCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// The production mirror catalog for the FCL and ZL download sites.
    pub fn builtin() -> Self {
        let fcl = SourceCategory {
            name: "fcl".to_string(),
            sources: vec![
                SourceDescriptor::new("F1", "FCL Mirror 1", "./file/data/fclDownWay1.json"),
                SourceDescriptor::new(
                    "F2",
                    "FCL Mirror 2",
                    "https://frostlynx.work/external/fcl/file_tree.json",
                )
                .provider("frostlynx.work")
                .mark_latest()
                .nested(&["fcl"]),
                SourceDescriptor::new("F3", "FCL Mirror 3", "./file/data/fclDownWay3.json"),
                SourceDescriptor::new("F4", "FCL Mirror 4", "./file/data/fclDownWay4.json"),
                SourceDescriptor::new(
                    "F5",
                    "FCL Mirror 5",
                    "https://fcl.switch.api.072211.xyz/?from=foldcraftlauncher&isDev=1",
                )
                .provider("072211.xyz")
                .mark_latest(),
                SourceDescriptor::new(
                    "F6",
                    "FCL Mirror 6",
                    "https://bbs.xn--rhqx00c95nv9a.club/mirror.json",
                ),
                SourceDescriptor::new(
                    "F8",
                    "FCL Mirror 8",
                    "https://api.cxsjmc.cn/api/FCL/filelist.json",
                )
                .provider("cxsjmc.cn"),
            ],
            children: Vec::new(),
        };

        let zl = SourceCategory {
            name: "zl".to_string(),
            sources: vec![
                SourceDescriptor::new("Z1", "ZL Mirror 1", "./file/data/zlDownWay1.json"),
                SourceDescriptor::new("Z3", "ZL Mirror 3", "./file/data/ZlDownWay3.json"),
            ],
            children: vec![SourceCategory {
                name: "zl2".to_string(),
                sources: vec![
                    SourceDescriptor::new("Z21", "ZL2 Mirror 1", "./file/data/zl2DownWay1.json"),
                    SourceDescriptor::new(
                        "Z22",
                        "ZL2 Mirror 2",
                        "https://frostlynx.work/external/zl2/file_tree.json",
                    )
                    .provider("frostlynx.work")
                    .nested(&["zl2"]),
                ],
                children: Vec::new(),
            }],
        };

        Self::new(vec![fcl, zl])
    }
}

fn collect_sources(category: &SourceCategory, out: &mut Vec<SourceDescriptor>) {
    out.extend(category.sources.iter().cloned());
    for child in &category.children {
        collect_sources(child, out);
    }
}

/// Which sources take part in a race. The exclusion list exists because one
/// legacy mirror is kept out of auto-selection by policy; it is data here,
/// not a hardcoded id.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SourceFilter {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SourceFilter {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            exclude: Vec::new(),
        }
    }

    pub fn without(mut self, id: &str) -> Self {
        self.exclude.push(id.to_string());
        self
    }

    pub fn matches(&self, id: &str) -> bool {
        id.starts_with(&self.prefix) && !self.exclude.iter().any(|excluded| excluded == id)
    }
}
