use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::registry::{SourceFilter, SourceRegistry};
use crate::services::prober::LatencyProber;

pub const DEFAULT_RACE_TIMEOUT: Duration = Duration::from_secs(3);

/// Fans the prober out over a filtered slice of the registry and streams
/// samples back in completion order, not declaration order.
pub struct LatencyRace {
    registry: Arc<SourceRegistry>,
    prober: LatencyProber,
}

impl LatencyRace {
    pub fn new(registry: Arc<SourceRegistry>, prober: LatencyProber) -> Self {
        Self { registry, prober }
    }

    /// Probe every matching source concurrently (the source set is small,
    /// no concurrency cap). `on_sample` fires per probe in arrival order;
    /// `on_done` fires exactly once, at the overall deadline or when every
    /// probe has finished, whichever comes first. The deadline is soft: in-
    /// flight probes are not cancelled and their late samples are still
    /// delivered to `on_sample`, the caller decides whether to act on them.
    pub async fn run<S, D>(
        &self,
        filter: &SourceFilter,
        mut on_sample: S,
        on_done: D,
        overall_timeout: Duration,
    ) where
        S: FnMut(&str, f64),
        D: FnOnce(),
    {
        let mut probes: FuturesUnordered<_> = self
            .registry
            .list(|source| filter.matches(&source.id))
            .into_iter()
            .map(|source| {
                let prober = self.prober.clone();
                let id = source.id.clone();
                let url = source.location.clone();
                async move {
                    let latency = prober.probe(&url).await;
                    (id, latency)
                }
            })
            .collect();

        let mut on_done = Some(on_done);
        if probes.is_empty() {
            if let Some(done) = on_done.take() {
                done();
            }
            return;
        }

        let deadline = tokio::time::sleep(overall_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                Some((id, latency)) = probes.next() => {
                    on_sample(&id, latency);
                    if probes.is_empty() {
                        if let Some(done) = on_done.take() {
                            done();
                        }
                        break;
                    }
                }
                _ = &mut deadline, if on_done.is_some() => {
                    tracing::debug!(
                        "race deadline reached with {} probe(s) outstanding",
                        probes.len()
                    );
                    if let Some(done) = on_done.take() {
                        done();
                    }
                }
                else => break,
            }
        }
    }

    /// One-shot variant: probe all matching sources and return the full
    /// latency map once every probe has resolved.
    pub async fn check_all(&self, filter: &SourceFilter) -> HashMap<String, f64> {
        let probes = self
            .registry
            .list(|source| filter.matches(&source.id))
            .into_iter()
            .map(|source| {
                let prober = self.prober.clone();
                let id = source.id.clone();
                let url = source.location.clone();
                async move {
                    let latency = prober.probe(&url).await;
                    (id, latency)
                }
            });
        futures_util::future::join_all(probes).await.into_iter().collect()
    }
}
