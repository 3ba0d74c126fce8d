use std::collections::HashMap;

use crate::models::{LatencySample, UNREACHABLE};

/// Minimum-latency reducer for one race. Each race owns a fresh instance;
/// nothing is shared across races.
#[derive(Debug, Default)]
pub struct FastestSelector {
    best: Option<LatencySample>,
}

impl FastestSelector {
    pub fn new() -> Self {
        Self { best: None }
    }

    /// Feed one sample. Returns true when the sample became the new best.
    /// Comparison is strictly-less-than, so the first source to reach a
    /// given minimum keeps it and unreachable samples never win.
    pub fn consider(&mut self, source_id: &str, latency_ms: f64) -> bool {
        let best_so_far = self
            .best
            .as_ref()
            .map(|sample| sample.latency_ms)
            .unwrap_or(UNREACHABLE);
        if latency_ms < best_so_far {
            self.best = Some(LatencySample {
                source_id: source_id.to_string(),
                latency_ms,
            });
            return true;
        }
        false
    }

    pub fn current(&self) -> Option<&LatencySample> {
        self.best.as_ref()
    }

    pub fn reset(&mut self) {
        self.best = None;
    }
}

/// One-shot reduction over an already-collected latency map, for callers
/// using the non-streaming race variant.
pub fn fastest_of(latencies: &HashMap<String, f64>) -> Option<LatencySample> {
    let mut selector = FastestSelector::new();
    for (id, &latency) in latencies {
        selector.consider(id, latency);
    }
    selector.current().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_latency_never_increases() {
        let mut selector = FastestSelector::new();
        let inputs = [("A", 120.0), ("B", 80.0), ("C", 200.0), ("D", 80.0), ("E", 10.0)];
        let mut previous = UNREACHABLE;
        for (id, latency) in inputs {
            selector.consider(id, latency);
            let current = selector.current().expect("a finite sample was seen").latency_ms;
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(selector.current().unwrap().source_id, "E");
    }

    #[test]
    fn unreachable_samples_never_win() {
        let mut selector = FastestSelector::new();
        assert!(!selector.consider("A", UNREACHABLE));
        assert!(selector.current().is_none());

        assert!(selector.consider("B", 50.0));
        assert!(!selector.consider("C", UNREACHABLE));
        assert_eq!(selector.current().unwrap().source_id, "B");
    }

    #[test]
    fn first_sample_wins_ties() {
        let mut selector = FastestSelector::new();
        assert!(selector.consider("X", 50.0));
        assert!(!selector.consider("Y", 50.0));
        assert_eq!(selector.current().unwrap().source_id, "X");
    }

    #[test]
    fn fastest_of_ignores_unreachable_entries() {
        let mut latencies = HashMap::new();
        latencies.insert("A".to_string(), UNREACHABLE);
        latencies.insert("B".to_string(), 90.0);
        latencies.insert("C".to_string(), 40.0);
        let fastest = fastest_of(&latencies).expect("finite entries exist");
        assert_eq!(fastest.source_id, "C");

        let mut unreachable = HashMap::new();
        unreachable.insert("A".to_string(), UNREACHABLE);
        assert!(fastest_of(&unreachable).is_none());
    }

    #[test]
    fn reset_clears_the_best() {
        let mut selector = FastestSelector::new();
        selector.consider("A", 10.0);
        selector.reset();
        assert!(selector.current().is_none());
    }
}
