use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::UNREACHABLE;
use crate::services::fetcher::{Fetch, FetchOptions};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Times a single reachability check against one source URL.
#[derive(Clone)]
pub struct LatencyProber {
    fetcher: Arc<dyn Fetch>,
    timeout: Duration,
}

impl LatencyProber {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One HEAD round-trip, wall-clock milliseconds. Any HTTP answer counts
    /// as reachable; transport errors, blocks and timeouts yield the
    /// sentinel. Never returns an error: a bad mirror is just "unreachable"
    /// for this race cycle, and there is no retry.
    pub async fn probe(&self, url: &str) -> f64 {
        let started = Instant::now();
        let request = self.fetcher.fetch(url, FetchOptions::head(self.timeout));
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => started.elapsed().as_secs_f64() * 1000.0,
            Ok(Err(err)) => {
                tracing::debug!("probe failed for {}: {}", url, err);
                UNREACHABLE
            }
            Err(_) => {
                tracing::debug!("probe timed out for {} after {:?}", url, self.timeout);
                UNREACHABLE
            }
        }
    }
}
