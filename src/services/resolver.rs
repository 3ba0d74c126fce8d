use std::sync::Arc;
use std::time::Duration;

use crate::errors::{MirrorError, Result};
use crate::models::{FileTree, ResolvedSource};
use crate::registry::SourceRegistry;
use crate::services::fetcher::{Fetch, FetchOptions};
use crate::services::normalizer::TreeNormalizer;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns a source id into the canonical version/arch/link structure the
/// rendering layer consumes. Each call is independent; nothing is cached
/// across navigations because mirrors change between visits.
#[derive(Clone)]
pub struct DownloadResolver {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn Fetch>,
    normalizer: TreeNormalizer,
    timeout: Duration,
}

impl DownloadResolver {
    pub fn new(registry: Arc<SourceRegistry>, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            registry,
            fetcher,
            normalizer: TreeNormalizer::new(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch, parse and normalize one source's document. Failures propagate
    /// typed; an empty version list is a valid result ("no version data"),
    /// not an error. The caller offers another source on failure, there is
    /// no automatic retry here.
    pub async fn resolve(&self, source_id: &str) -> Result<ResolvedSource> {
        let source = self.registry.get(source_id)?;

        let request = self
            .fetcher
            .fetch(&source.location, FetchOptions::get(self.timeout));
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(MirrorError::Timeout(source.location.clone())),
        };
        if !response.is_success() {
            return Err(MirrorError::Http(format!(
                "HTTP {} from {}",
                response.status, source_id
            )));
        }

        let tree: FileTree = serde_json::from_str(&response.body)
            .map_err(|err| MirrorError::MalformedResponse(format!("{}: {}", source_id, err)))?;
        if tree.children.is_none() {
            return Err(MirrorError::MalformedResponse(format!(
                "{}: document has no children",
                source_id
            )));
        }

        let versions = self.normalizer.normalize(&tree, &source.nesting_hint);
        if versions.is_empty() {
            tracing::warn!("{}: no version data found", source_id);
        } else {
            tracing::debug!("{}: {} version(s)", source_id, versions.len());
        }

        let recommended = match tree.latest {
            Some(ref latest) if source.mark_latest => {
                if versions.iter().any(|version| version.label == *latest) {
                    Some(latest.clone())
                } else {
                    tracing::debug!(
                        "{}: latest label {} names no version directory",
                        source_id,
                        latest
                    );
                    None
                }
            }
            _ => None,
        };

        Ok(ResolvedSource {
            versions,
            recommended,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::future::BoxFuture;

    use crate::registry::{SourceCategory, SourceDescriptor};
    use crate::services::fetcher::FetchResponse;

    #[derive(Default)]
    struct MapFetcher {
        responses: HashMap<String, (u16, String)>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MapFetcher {
        fn with(mut self, location: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(location.to_string(), (status, body.to_string()));
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetch for MapFetcher {
        fn fetch<'a>(&'a self, url: &'a str, _options: FetchOptions) -> BoxFuture<'a, Result<FetchResponse>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                let (status, body) = self
                    .responses
                    .get(url)
                    .cloned()
                    .unwrap_or((404, String::new()));
                Ok(FetchResponse { status, body })
            })
        }
    }

    fn registry() -> Arc<SourceRegistry> {
        Arc::new(SourceRegistry::new(vec![SourceCategory {
            name: "test".to_string(),
            sources: vec![
                SourceDescriptor::new("F1", "Mirror 1", "./local.json"),
                SourceDescriptor::new("F2", "Mirror 2", "https://remote.example.com/remote.json")
                    .nested(&["fcl"]),
                SourceDescriptor::new("F5", "Mirror 5", "./latest.json").mark_latest(),
            ],
            children: Vec::new(),
        }]))
    }

    fn resolver_with(fetcher: MapFetcher) -> (DownloadResolver, Arc<MapFetcher>) {
        let fetcher = Arc::new(fetcher);
        let resolver = DownloadResolver::new(registry(), fetcher.clone());
        (resolver, fetcher)
    }

    const LOCAL_TREE: &str = r#"{"children": [
        {"type": "directory", "name": "1.0", "children": [
            {"type": "file", "name": "a", "arch": "all", "download_link": "L1"}
        ]}
    ]}"#;

    const NESTED_TREE: &str = r#"{"children": [
        {"type": "directory", "name": "fcl", "children": [
            {"type": "directory", "name": "2.0", "children": []}
        ]}
    ]}"#;

    #[tokio::test]
    async fn resolves_a_local_source() {
        let (resolver, _) = resolver_with(MapFetcher::default().with("./local.json", 200, LOCAL_TREE));
        let resolved = resolver.resolve("F1").await.expect("resolve F1");
        assert_eq!(resolved.versions.len(), 1);
        assert_eq!(resolved.versions[0].label, "1.0");
        assert_eq!(
            resolved.versions[0].arch_links.get("all"),
            Some(&Some("L1".to_string()))
        );
        assert!(resolved.recommended.is_none());
    }

    #[tokio::test]
    async fn resolves_a_nested_source_with_fileless_version() {
        let (resolver, _) = resolver_with(
            MapFetcher::default().with("https://remote.example.com/remote.json", 200, NESTED_TREE),
        );
        let resolved = resolver.resolve("F2").await.expect("resolve F2");
        assert_eq!(resolved.versions.len(), 1);
        assert_eq!(resolved.versions[0].label, "2.0");
        assert!(!resolved.versions[0].has_files());
    }

    #[tokio::test]
    async fn unknown_source_fails_without_a_network_call() {
        let (resolver, fetcher) = resolver_with(MapFetcher::default());
        let err = resolver.resolve("ZZZ").await.unwrap_err();
        assert!(matches!(err, MirrorError::UnknownSource(ref id) if id == "ZZZ"));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let (resolver, _) =
            resolver_with(MapFetcher::default().with("./local.json", 200, "not json at all"));
        let err = resolver.resolve("F1").await.unwrap_err();
        assert!(matches!(err, MirrorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn missing_top_level_children_is_malformed() {
        let (resolver, _) =
            resolver_with(MapFetcher::default().with("./local.json", 200, r#"{"latest": "1.0"}"#));
        let err = resolver.resolve("F1").await.unwrap_err();
        assert!(matches!(err, MirrorError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn http_failure_propagates() {
        let (resolver, _) = resolver_with(MapFetcher::default().with("./local.json", 503, ""));
        let err = resolver.resolve("F1").await.unwrap_err();
        assert!(matches!(err, MirrorError::Http(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let fetcher = MapFetcher {
            responses: HashMap::new(),
            delay: Some(Duration::from_secs(60)),
            calls: AtomicUsize::new(0),
        };
        let (resolver, _) = resolver_with(fetcher.with("./local.json", 200, LOCAL_TREE));
        let err = resolver.resolve("F1").await.unwrap_err();
        assert!(matches!(err, MirrorError::Timeout(_)));
    }

    #[tokio::test]
    async fn trusted_latest_label_becomes_the_recommendation() {
        let body = r#"{"latest": "1.0", "children": [
            {"type": "directory", "name": "1.0", "children": []}
        ]}"#;
        let (resolver, _) = resolver_with(MapFetcher::default().with("./latest.json", 200, body));
        let resolved = resolver.resolve("F5").await.expect("resolve F5");
        assert_eq!(resolved.recommended.as_deref(), Some("1.0"));
    }

    #[tokio::test]
    async fn latest_naming_a_missing_directory_yields_no_recommendation() {
        let body = r#"{"latest": "9.9", "children": [
            {"type": "directory", "name": "1.0", "children": []}
        ]}"#;
        let (resolver, _) = resolver_with(MapFetcher::default().with("./latest.json", 200, body));
        let resolved = resolver.resolve("F5").await.expect("resolve F5");
        assert!(resolved.recommended.is_none());
        assert_eq!(resolved.versions.len(), 1);
    }

    #[tokio::test]
    async fn untrusted_source_never_recommends() {
        let body = r#"{"latest": "1.0", "children": [
            {"type": "directory", "name": "1.0", "children": []}
        ]}"#;
        let (resolver, _) = resolver_with(MapFetcher::default().with("./local.json", 200, body));
        let resolved = resolver.resolve("F1").await.expect("resolve F1");
        assert!(resolved.recommended.is_none());
    }

    #[tokio::test]
    async fn empty_document_is_no_version_data_not_an_error() {
        let (resolver, _) =
            resolver_with(MapFetcher::default().with("./local.json", 200, r#"{"children": []}"#));
        let resolved = resolver.resolve("F1").await.expect("resolve F1");
        assert!(!resolved.has_version_data());
    }
}
