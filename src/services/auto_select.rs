use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::LatencySample;
use crate::registry::SourceFilter;
use crate::services::race::{LatencyRace, DEFAULT_RACE_TIMEOUT};
use crate::services::selector::FastestSelector;

/// Automatic mirror selection: race the configured field, follow the best
/// candidate live, freeze the answer at the deadline.
pub struct AutoSelectService {
    race: Arc<LatencyRace>,
    filter: SourceFilter,
    overall_timeout: Duration,
}

impl AutoSelectService {
    pub fn new(race: Arc<LatencyRace>, filter: SourceFilter) -> Self {
        Self {
            race,
            filter,
            overall_timeout: DEFAULT_RACE_TIMEOUT,
        }
    }

    /// The production policy for the FCL field: race every F-prefixed
    /// mirror except F1, which stays out of auto-selection by
    /// long-standing site policy.
    pub fn fcl_default(race: Arc<LatencyRace>) -> Self {
        Self::new(race, SourceFilter::with_prefix("F").without("F1"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// Run one selection cycle. Every improvement is forwarded to
    /// `on_update` as it happens so the line picker can follow along.
    /// Returns the fastest mirror seen before the deadline, or `None` when
    /// no mirror answered in time. Samples that straggle in after the
    /// deadline are logged but no longer change anything.
    pub async fn select_fastest<U>(&self, mut on_update: U) -> Option<LatencySample>
    where
        U: FnMut(&str, f64) + Send + 'static,
    {
        tracing::info!("auto-selection: probing mirrors with prefix {}", self.filter.prefix);

        let selector = Arc::new(Mutex::new(FastestSelector::new()));
        let completed = Arc::new(AtomicBool::new(false));

        let race = self.race.clone();
        let filter = self.filter.clone();
        let overall_timeout = self.overall_timeout;
        {
            let selector = selector.clone();
            let completed = completed.clone();
            let done_flag = completed.clone();
            tokio::spawn(async move {
                race.run(
                    &filter,
                    move |id, latency| {
                        if completed.load(Ordering::SeqCst) {
                            tracing::debug!("late sample from {} ignored ({} ms)", id, latency);
                            return;
                        }
                        if !latency.is_finite() {
                            return;
                        }
                        let improved = match selector.lock() {
                            Ok(mut locked) => locked.consider(id, latency),
                            Err(_) => false,
                        };
                        if improved {
                            tracing::info!("auto-selection: faster mirror {} ({:.0} ms)", id, latency);
                            on_update(id, latency);
                        }
                    },
                    move || {
                        done_flag.store(true, Ordering::SeqCst);
                    },
                    overall_timeout,
                )
                .await;
            });
        }

        tokio::time::sleep(overall_timeout).await;
        completed.store(true, Ordering::SeqCst);

        let choice = selector
            .lock()
            .ok()
            .and_then(|locked| locked.current().cloned());
        match choice {
            Some(sample) => {
                tracing::info!(
                    "auto-selection: picked {} ({:.0} ms)",
                    sample.source_id,
                    sample.latency_ms
                );
                Some(sample)
            }
            None => {
                tracing::warn!("auto-selection: no reachable mirror");
                None
            }
        }
    }
}
