//! Pipeline configuration.
//!
//! Every field has a default, so a partial JSON object is a valid config:
//!
//! ```json
//! { "cooldown_ms": 800, "cursor": { "slow_factor": 0.05 } }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cursor::CursorConfig;
use crate::error::ConfigError;
use crate::mode::DEFAULT_COOLDOWN_MS;
use crate::stabilizer::DEFAULT_CAPACITY;

// ════════════════════════════════════════════════════════════════════════════
// RetryPolicy
// ════════════════════════════════════════════════════════════════════════════

/// Linear backoff for source initialization: retry `n` waits `n × base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries:   u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(retry as u64))
    }

    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        RetryPolicy { max_retries, base_delay_ms: 0 }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_retries: 3, base_delay_ms: 1_000 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PipelineConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stabilizer window length.
    pub history_capacity: usize,
    /// Debounce between committed mode transitions.
    pub cooldown_ms:      u64,
    pub cursor:           CursorConfig,
    pub retry:            RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            history_capacity: DEFAULT_CAPACITY,
            cooldown_ms:      DEFAULT_COOLDOWN_MS,
            cursor:           CursorConfig::default(),
            retry:            RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        for (name, value) in [
            ("fast_factor", self.cursor.fast_factor),
            ("slow_factor", self.cursor.slow_factor),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::SmoothingFactor { name, value });
            }
        }
        let jump = self.cursor.jump_threshold;
        if !jump.is_finite() || jump < 0.0 {
            return Err(ConfigError::JumpThreshold(jump));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: PipelineConfig =
            serde_json::from_str(r#"{ "cooldown_ms": 800, "cursor": { "slow_factor": 0.05 } }"#).unwrap();
        assert_eq!(c.cooldown_ms, 800);
        assert_eq!(c.cursor.slow_factor, 0.05);
        assert_eq!(c.cursor.fast_factor, 0.3);
        assert_eq!(c.history_capacity, 8);
        assert_eq!(c.retry, RetryPolicy::default());
    }

    #[test]
    fn linear_backoff() {
        let p = RetryPolicy::default();
        assert_eq!(p.total_attempts(), 4);
        assert_eq!(p.delay_before(1), Duration::from_millis(1_000));
        assert_eq!(p.delay_before(2), Duration::from_millis(2_000));
        assert_eq!(p.delay_before(3), Duration::from_millis(3_000));
    }

    #[test]
    fn rejects_bad_values() {
        let mut c = PipelineConfig::default();
        c.history_capacity = 0;
        assert_eq!(c.validate(), Err(ConfigError::EmptyHistory));

        let mut c = PipelineConfig::default();
        c.cursor.slow_factor = 0.0;
        assert!(matches!(c.validate(), Err(ConfigError::SmoothingFactor { name: "slow_factor", .. })));

        let mut c = PipelineConfig::default();
        c.cursor.fast_factor = f32::NAN;
        assert!(c.validate().is_err());

        let mut c = PipelineConfig::default();
        c.cursor.jump_threshold = -0.1;
        assert_eq!(c.validate(), Err(ConfigError::JumpThreshold(-0.1)));
    }
}
