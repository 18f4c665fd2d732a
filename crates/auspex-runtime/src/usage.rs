//! Usage metering across concurrent provider calls.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::providers::TokenUsage;

/// Accumulated provider usage for an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationUsage {
    /// Provider calls that returned text
    pub calls: u32,

    /// Provider calls that failed or timed out
    pub failures: u32,

    /// Prompt/input tokens across all calls
    pub prompt_tokens: u32,

    /// Completion/output tokens across all calls
    pub completion_tokens: u32,
}

impl EvaluationUsage {
    /// Total tokens used.
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Lock-protected usage accumulator.
///
/// Cheap to clone; all clones share one counter. This is the only piece of
/// state provider tasks touch concurrently.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    inner: Arc<Mutex<EvaluationUsage>>,
}

impl UsageTracker {
    /// Create a fresh tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful completion.
    pub fn record_completion(&self, usage: &TokenUsage) {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        inner.prompt_tokens += usage.prompt_tokens;
        inner.completion_tokens += usage.completion_tokens;
    }

    /// Record a failed or timed-out call.
    pub fn record_failure(&self) {
        self.inner.lock().failures += 1;
    }

    /// Snapshot the counters.
    pub fn snapshot(&self) -> EvaluationUsage {
        *self.inner.lock()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        *self.inner.lock() = EvaluationUsage::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_accumulates() {
        let tracker = UsageTracker::new();

        tracker.record_completion(&TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 40,
        });
        tracker.record_completion(&TokenUsage {
            prompt_tokens: 80,
            completion_tokens: 30,
        });
        tracker.record_failure();

        let usage = tracker.snapshot();
        assert_eq!(usage.calls, 2);
        assert_eq!(usage.failures, 1);
        assert_eq!(usage.total_tokens(), 250);
    }

    #[test]
    fn test_clones_share_counters() {
        let tracker = UsageTracker::new();
        let clone = tracker.clone();

        clone.record_failure();
        assert_eq!(tracker.snapshot().failures, 1);

        tracker.reset();
        assert_eq!(clone.snapshot(), EvaluationUsage::default());
    }

    #[test]
    fn test_concurrent_recording_loses_nothing() {
        let tracker = UsageTracker::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        t.record_completion(&TokenUsage {
                            prompt_tokens: 1,
                            completion_tokens: 1,
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker thread panicked");
        }

        assert_eq!(tracker.snapshot().calls, 800);
    }
}
