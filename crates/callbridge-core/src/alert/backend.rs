//! Platform capabilities the alert orchestrator drives
//!
//! Every method may fail; the orchestrator logs and swallows failures.
//! Stop and cancel calls must be safe when nothing is running.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::VibrationPattern;
use crate::error::BridgeResult;

use super::notification::{ContactPhoto, NotificationDescriptor};

/// Which ringtone to play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingtoneSource {
    /// User-chosen ringtone identifier
    Custom(String),
    /// Platform default ringtone
    PlatformDefault,
}

pub trait RingtonePlayer: Send + Sync {
    /// Whether a custom identifier resolves to a playable ringtone
    fn is_available(&self, id: &str) -> bool;

    /// Start looping playback
    fn start(&self, source: &RingtoneSource) -> BridgeResult<()>;

    fn stop(&self) -> BridgeResult<()>;
}

pub trait Vibrator: Send + Sync {
    fn start(&self, pattern: &VibrationPattern) -> BridgeResult<()>;

    fn stop(&self) -> BridgeResult<()>;
}

/// The single call notification
pub trait NotificationPresenter: Send + Sync {
    fn post(&self, notification: &NotificationDescriptor) -> BridgeResult<()>;

    fn update(&self, notification: &NotificationDescriptor) -> BridgeResult<()>;

    fn cancel(&self) -> BridgeResult<()>;
}

/// Contact picture lookup by phone number
#[async_trait]
pub trait ContactPhotoLookup: Send + Sync {
    /// `Ok(None)` when the number has no contact or no picture
    async fn lookup_photo(&self, number: &str) -> BridgeResult<Option<ContactPhoto>>;
}

/// Read access to host string preferences
pub trait PreferenceStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
}

pub trait ScreenLockProbe: Send + Sync {
    fn is_screen_locked(&self) -> bool;
}

/// Preference store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

/// Lock probe with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct FixedScreenLock(pub bool);

impl ScreenLockProbe for FixedScreenLock {
    fn is_screen_locked(&self) -> bool {
        self.0
    }
}
