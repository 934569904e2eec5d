//! Ringtone, vibration and notification orchestration
//!
//! | Session state | Screen locked | Effects |
//! |---|---|---|
//! | Ringing (incoming) | yes | start ringtone, start vibration, post full-screen notification |
//! | Ringing (incoming) | no | start ringtone, start vibration, post notification |
//! | Active | any | stop ringtone, stop vibration, replace with ongoing notification |
//! | Disconnected | any | cancel notification, stop whatever still runs |
//! | anything else | any | nothing |
//!
//! Whether a locked screen gets a full-screen alert is governed by
//! [`FullScreenPolicy`](crate::config::FullScreenPolicy).

pub mod backend;
pub mod notification;
pub mod orchestrator;
pub mod policy;

pub use backend::{
    ContactPhotoLookup, FixedScreenLock, InMemoryPreferences, NotificationPresenter, PreferenceStore,
    RingtonePlayer, RingtoneSource, ScreenLockProbe, Vibrator,
};
pub use notification::{ContactPhoto, NotificationAction, NotificationDescriptor, NotificationKind};
pub use orchestrator::{select_ringtone, AlertBackends, AlertOrchestrator};
pub use policy::{AlertEffect, AlertState, AlertTarget};
