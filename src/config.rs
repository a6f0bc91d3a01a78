//! Monitor configuration
//!
//! Timeouts, throttle interval, fallback text limits and the harmful keyword
//! list shared by the text and screen analyzers.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Keywords flagged as potentially harmful in text and on screen
pub const DEFAULT_HARMFUL_KEYWORDS: [&str; 8] = [
    "self-harm",
    "suicide",
    "kill myself",
    "worthless",
    "panic",
    "violence",
    "abuse",
    "trigger warning",
];

/// Reason attached to alert records raised by the coordinator
pub const DEFAULT_ALERT_REASON: &str = "Behavior engine flagged elevated risk";

/// Configuration for a [`FusionCoordinator`](crate::coordinator::FusionCoordinator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Bounded wait on speech analysis (ms)
    pub speech_timeout_ms: u64,
    /// Bounded wait on face analysis (ms)
    pub face_timeout_ms: u64,
    /// Minimum spacing between full-depth screen OCR passes (ms)
    pub screen_interval_ms: u64,
    /// Wait on a full-depth screen pass (ms)
    pub screen_full_timeout_ms: u64,
    /// Wait on a best-effort pass inside the throttle window (ms)
    pub screen_quick_timeout_ms: u64,
    /// Screen text must be longer than this to be sent to sentiment analysis
    pub fallback_min_chars: usize,
    /// Screen text is capped at this many characters before sentiment analysis
    pub fallback_max_chars: usize,
    /// Wait on each alert or interaction append before giving up on it (ms)
    pub sink_timeout_ms: u64,
    /// Keywords flagged by analyzers built with `from_config`
    pub harmful_keywords: Vec<String>,
    pub alert_reason: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            speech_timeout_ms: 2_500,
            face_timeout_ms: 2_500,
            screen_interval_ms: 10_000,
            screen_full_timeout_ms: 8_000,
            screen_quick_timeout_ms: 5_000,
            fallback_min_chars: 10,
            fallback_max_chars: 512,
            sink_timeout_ms: 2_000,
            harmful_keywords: DEFAULT_HARMFUL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            alert_reason: DEFAULT_ALERT_REASON.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Parse and validate configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: MonitorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Reject configurations the coordinator cannot honor
    pub fn validate(&self) -> Result<(), ComputeError> {
        let timeouts = [
            ("speech_timeout_ms", self.speech_timeout_ms),
            ("face_timeout_ms", self.face_timeout_ms),
            ("screen_full_timeout_ms", self.screen_full_timeout_ms),
            ("screen_quick_timeout_ms", self.screen_quick_timeout_ms),
            ("sink_timeout_ms", self.sink_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ComputeError::Config(format!("{name} must be positive")));
            }
        }

        if self.fallback_min_chars >= self.fallback_max_chars {
            return Err(ComputeError::Config(format!(
                "fallback_min_chars ({}) must be below fallback_max_chars ({})",
                self.fallback_min_chars, self.fallback_max_chars
            )));
        }

        if self.harmful_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ComputeError::Config(
                "harmful_keywords must not contain blank entries".to_string(),
            ));
        }

        Ok(())
    }

    pub fn speech_timeout(&self) -> Duration {
        Duration::from_millis(self.speech_timeout_ms)
    }

    pub fn face_timeout(&self) -> Duration {
        Duration::from_millis(self.face_timeout_ms)
    }

    pub fn screen_interval(&self) -> Duration {
        Duration::from_millis(self.screen_interval_ms)
    }

    pub fn screen_full_timeout(&self) -> Duration {
        Duration::from_millis(self.screen_full_timeout_ms)
    }

    pub fn screen_quick_timeout(&self) -> Duration {
        Duration::from_millis(self.screen_quick_timeout_ms)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speech_timeout(), Duration::from_millis(2_500));
        assert_eq!(config.screen_interval(), Duration::from_secs(10));
        assert_eq!(config.sink_timeout(), Duration::from_secs(2));
        assert_eq!(config.harmful_keywords.len(), 8);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MonitorConfig::from_json(r#"{"screen_interval_ms": 3000}"#).unwrap();
        assert_eq!(config.screen_interval_ms, 3_000);
        assert_eq!(config.screen_full_timeout_ms, 8_000);
        assert_eq!(config.alert_reason, DEFAULT_ALERT_REASON);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let config = MonitorConfig {
            face_timeout_ms: 900,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(MonitorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = MonitorConfig::from_json(r#"{"face_timeout_ms": 0}"#);
        assert!(matches!(result, Err(ComputeError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_fallback_bounds() {
        let result =
            MonitorConfig::from_json(r#"{"fallback_min_chars": 600, "fallback_max_chars": 512}"#);
        assert!(matches!(result, Err(ComputeError::Config(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            MonitorConfig::from_json("not json"),
            Err(ComputeError::JsonError(_))
        ));
    }
}
