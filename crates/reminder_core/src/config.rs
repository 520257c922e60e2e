//! Host-supplied core configuration.
//!
//! # Responsibility
//! - Carry logging and notification settings from the host into core.
//! - Reject unusable values at load time instead of at first use.
//!
//! # Invariants
//! - Missing JSON fields fall back to `CoreConfig::default()` values.
//! - A validated config has at least one positive snooze preset.

use crate::logging::{default_log_level, normalize_level};
use crate::schedule::notification::{NotificationTemplate, DEFAULT_NOTIFICATION_BODY};
use crate::schedule::snooze::DEFAULT_SNOOZE_PRESETS_MINUTES;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Core settings, typically shipped by the host as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// One of trace|debug|info|warn|error.
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` leaves logging off.
    pub log_dir: Option<String>,
    /// Snooze actions offered on fired notifications, in minutes.
    pub snooze_presets_minutes: Vec<u32>,
    /// Body shown when a reminder's description is blank.
    pub default_notification_body: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            snooze_presets_minutes: DEFAULT_SNOOZE_PRESETS_MINUTES.to_vec(),
            default_notification_body: DEFAULT_NOTIFICATION_BODY.to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// - `InvalidLogLevel` for unknown levels.
    /// - `InvalidSnoozePreset` for a zero preset; `NoSnoozePresets` for none.
    /// - `EmptyNotificationBody` for a blank default body.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;

        if self.snooze_presets_minutes.is_empty() {
            return Err(ConfigError::NoSnoozePresets);
        }
        if let Some(zero) = self.snooze_presets_minutes.iter().find(|m| **m == 0) {
            return Err(ConfigError::InvalidSnoozePreset(*zero));
        }
        if self.default_notification_body.trim().is_empty() {
            return Err(ConfigError::EmptyNotificationBody);
        }
        Ok(())
    }

    pub fn notification_template(&self) -> NotificationTemplate {
        NotificationTemplate::new(
            self.snooze_presets_minutes.clone(),
            self.default_notification_body.clone(),
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidLogLevel(String),
    NoSnoozePresets,
    InvalidSnoozePreset(u32),
    EmptyNotificationBody,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::NoSnoozePresets => write!(f, "at least one snooze preset is required"),
            Self::InvalidSnoozePreset(minutes) => {
                write!(f, "snooze preset must be positive, got {minutes}")
            }
            Self::EmptyNotificationBody => {
                write!(f, "default notification body must not be empty")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.snooze_presets_minutes, [5, 10, 15]);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = CoreConfig::from_json_str(
            r#"{"log_level":"warn","snooze_presets_minutes":[1,30],"log_dir":"/var/log/rem"}"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/rem"));
        assert_eq!(
            config.notification_template().snooze_presets_minutes(),
            [1, 30]
        );
    }

    #[test]
    fn rejects_bad_values() {
        let err = CoreConfig::from_json_str(r#"{"log_level":"loud"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));

        let err = CoreConfig::from_json_str(r#"{"snooze_presets_minutes":[]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoSnoozePresets));

        let err = CoreConfig::from_json_str(r#"{"snooze_presets_minutes":[5,0]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSnoozePreset(0)));

        let err = CoreConfig::from_json_str("[").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
