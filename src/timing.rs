use std::time::Duration;

use serde::{Deserialize, Serialize};

// @module: Per-utterance network time budget

/// Bounded timeout derived from an utterance's duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    /// Multiplier applied to the audio duration
    pub ratio: f64,
    /// Hard ceiling in seconds
    pub max_secs: f64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self { ratio: 2.0, max_secs: 30.0 }
    }
}

impl TimeoutPolicy {
    pub fn new(ratio: f64, max_secs: f64) -> Self {
        Self { ratio, max_secs }
    }

    /// `min(max_secs, duration * ratio)`.
    ///
    /// Callers reject zero-length utterances before asking for a budget;
    /// the policy itself must have been validated positive and finite.
    pub fn budget(&self, duration_ms: u64) -> Duration {
        debug_assert!(duration_ms > 0, "budget requested for an empty utterance");
        let secs = (duration_ms as f64 / 1000.0 * self.ratio).min(self.max_secs);
        Duration::from_secs_f64(secs)
    }
}
