//! Configuration for the annotation player
//!
//! All timing constants the navigation engine relies on live here so that
//! hosts can tune them without touching the engine.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{RehearseurError, Result};

/// Period of the loop that samples the player's current time
pub const DEFAULT_POLLING_INTERVAL_MS: u32 = 100;

/// An annotation fires when playback is closer than this to its timestamp
pub const DEFAULT_TRIGGER_THRESHOLD_MS: u64 = 300;

/// A backward jump larger than this during playback re-arms every annotation
pub const DEFAULT_SEEKING_BACKWARD_THRESHOLD_MS: u64 = 1000;

/// Applied to annotations that do not declare `autopause`
pub const DEFAULT_AUTOPAUSE: bool = true;

/// Display colour for annotations that do not declare `color`
pub const DEFAULT_ANNOTATION_COLOR: &str = "#2196F3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    pub polling_interval_ms: u32,
    pub trigger_threshold_ms: u64,
    pub seeking_backward_threshold_ms: u64,
    pub default_autopause: bool,
    pub default_color: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            trigger_threshold_ms: DEFAULT_TRIGGER_THRESHOLD_MS,
            seeking_backward_threshold_ms: DEFAULT_SEEKING_BACKWARD_THRESHOLD_MS,
            default_autopause: DEFAULT_AUTOPAUSE,
            default_color: DEFAULT_ANNOTATION_COLOR.to_string(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from `REHEARSEUR_*` environment variables.
    ///
    /// Absent or unparsable values fall back to the defaults; the result is
    /// validated before it is returned.
    pub fn from_env() -> Result<Self> {
        let defaults = PlayerConfig::default();

        let config = PlayerConfig {
            polling_interval_ms: env_or("REHEARSEUR_POLLING_INTERVAL_MS", defaults.polling_interval_ms),
            trigger_threshold_ms: env_or("REHEARSEUR_TRIGGER_THRESHOLD_MS", defaults.trigger_threshold_ms),
            seeking_backward_threshold_ms: env_or(
                "REHEARSEUR_SEEK_BACK_THRESHOLD_MS",
                defaults.seeking_backward_threshold_ms,
            ),
            default_autopause: env_or("REHEARSEUR_DEFAULT_AUTOPAUSE", defaults.default_autopause),
            default_color: env::var("REHEARSEUR_DEFAULT_COLOR").unwrap_or(defaults.default_color),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the constraints between the timing constants.
    ///
    /// The trigger window must be wider than one polling period, otherwise an
    /// annotation can fall between two samples and never fire.
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval_ms == 0 {
            return Err(RehearseurError::InvalidConfig(
                "pollingIntervalMs must be greater than zero".to_string(),
            ));
        }

        if self.trigger_threshold_ms <= u64::from(self.polling_interval_ms) {
            return Err(RehearseurError::InvalidConfig(format!(
                "triggerThresholdMs ({}) must exceed pollingIntervalMs ({})",
                self.trigger_threshold_ms, self.polling_interval_ms
            )));
        }

        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.default_autopause);
        assert_eq!(config.default_color, "#2196F3");
    }

    #[test]
    fn test_threshold_must_exceed_polling_interval() {
        let config = PlayerConfig {
            polling_interval_ms: 250,
            trigger_threshold_ms: 250,
            ..PlayerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RehearseurError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_polling_interval_rejected() {
        let config = PlayerConfig {
            polling_interval_ms: 0,
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "triggerThresholdMs": 500 }"#).unwrap();
        assert_eq!(config.trigger_threshold_ms, 500);
        assert_eq!(config.polling_interval_ms, DEFAULT_POLLING_INTERVAL_MS);
        assert_eq!(
            config.seeking_backward_threshold_ms,
            DEFAULT_SEEKING_BACKWARD_THRESHOLD_MS
        );
    }
}
