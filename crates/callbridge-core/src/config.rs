//! Bridge configuration
//!
//! Configuration is plain serde data with defaults for every field, so a TOML
//! file only needs to name what it overrides:
//!
//! ```toml
//! ringtone_preference_key = "custom_ringtone"
//! photo_lookup_timeout_ms = 1500
//!
//! [alerts]
//! full_screen = "always"
//! vibrate = true
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::logging::LoggingConfig;

/// When an incoming-call notification requests a full-screen alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullScreenPolicy {
    /// Only while the screen is locked
    WhenLocked,
    /// Regardless of lock state
    Always,
    /// Never request full-screen
    Never,
}

impl FullScreenPolicy {
    pub fn full_screen(&self, screen_locked: bool) -> bool {
        match self {
            FullScreenPolicy::WhenLocked => screen_locked,
            FullScreenPolicy::Always => true,
            FullScreenPolicy::Never => false,
        }
    }
}

impl Default for FullScreenPolicy {
    fn default() -> Self {
        FullScreenPolicy::WhenLocked
    }
}

/// On/off vibration waveform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationPattern {
    /// Alternating wait/vibrate durations in milliseconds, starting with a wait
    pub timings_ms: Vec<u64>,
    /// Index to loop back to, `None` to play once
    pub repeat_from: Option<usize>,
}

impl VibrationPattern {
    /// Wait 0, vibrate 1000 ms, pause 1000 ms, repeating until stopped
    pub fn ringing() -> Self {
        Self {
            timings_ms: vec![0, 1000, 1000],
            repeat_from: Some(0),
        }
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self::ringing()
    }
}

/// Alerting policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub full_screen: FullScreenPolicy,
    /// Whether ringing also vibrates
    pub vibrate: bool,
    pub vibration_pattern: VibrationPattern,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            full_screen: FullScreenPolicy::default(),
            vibrate: true,
            vibration_pattern: VibrationPattern::ringing(),
        }
    }
}

/// Notification texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub incoming_title: String,
    pub ongoing_title: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            incoming_title: "Incoming call".to_string(),
            ongoing_title: "Ongoing call".to_string(),
        }
    }
}

/// Configuration for the call bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub alerts: AlertConfig,
    pub notifications: NotificationConfig,
    /// Preference key holding the custom ringtone identifier
    pub ringtone_preference_key: String,
    /// Upper bound for a contact photo lookup
    pub photo_lookup_timeout_ms: u64,
    /// Number shown when the host reports none
    pub unknown_number_label: String,
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            alerts: AlertConfig::default(),
            notifications: NotificationConfig::default(),
            ringtone_preference_key: "custom_ringtone".to_string(),
            photo_lookup_timeout_ms: 2000,
            unknown_number_label: "Unknown".to_string(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded bridge configuration");
        Self::from_toml_str(&source)
    }

    pub fn with_full_screen_policy(mut self, policy: FullScreenPolicy) -> Self {
        self.alerts.full_screen = policy;
        self
    }

    pub fn with_vibration(mut self, enabled: bool) -> Self {
        self.alerts.vibrate = enabled;
        self
    }

    pub fn with_vibration_pattern(mut self, pattern: VibrationPattern) -> Self {
        self.alerts.vibration_pattern = pattern;
        self
    }

    pub fn with_ringtone_preference_key(mut self, key: impl Into<String>) -> Self {
        self.ringtone_preference_key = key.into();
        self
    }

    pub fn with_photo_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.photo_lookup_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_unknown_number_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_number_label = label.into();
        self
    }

    pub fn photo_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.photo_lookup_timeout_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> BridgeResult<()> {
        if self.ringtone_preference_key.trim().is_empty() {
            return Err(BridgeError::invalid_configuration(
                "ringtone_preference_key",
                "must not be empty",
            ));
        }
        if self.photo_lookup_timeout_ms == 0 {
            return Err(BridgeError::invalid_configuration(
                "photo_lookup_timeout_ms",
                "must be greater than zero",
            ));
        }
        let pattern = &self.alerts.vibration_pattern;
        if pattern.timings_ms.is_empty() {
            return Err(BridgeError::invalid_configuration(
                "alerts.vibration_pattern.timings_ms",
                "must contain at least one timing",
            ));
        }
        if let Some(index) = pattern.repeat_from {
            if index >= pattern.timings_ms.len() {
                return Err(BridgeError::invalid_configuration(
                    "alerts.vibration_pattern.repeat_from",
                    format!("index {} outside pattern of {} timings", index, pattern.timings_ms.len()),
                ));
            }
        }
        self.logging.validate()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}
