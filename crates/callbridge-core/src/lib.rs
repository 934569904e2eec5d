//! # callbridge-core
//!
//! Single-call session controller and alert orchestrator sitting between a
//! device telephony host and an application UI.
//!
//! The host reports calls through [`CallBridge::on_call_added`] and
//! [`CallBridge::on_call_removed`], and per-call state changes through the
//! listener registered for each session. The bridge keeps exactly one current
//! [`Session`], normalizes raw state codes into [`SessionState`], fans events
//! out to a single UI listener, and drives ringtone, vibration and the call
//! notification as a diff against what is already running.
//!
//! ```text
//! TelephonyAdapter ──► SessionRegistry ──► SessionStateMachine ──► AlertOrchestrator
//!                                                    │
//!                                                    └───────────► EventSinkBridge ──► UI
//! notification intents ──► ActionDispatcher ──► SessionRegistry ──► TelephonyAdapter
//! ```
//!
//! Events reach the UI as JSON:
//!
//! ```json
//! {"event":"incoming","number":"+15551234567","name":"","state":"ringing"}
//! {"event":"stateChanged","number":"+15551234567","state":"active"}
//! ```

pub mod actions;
pub mod alert;
pub mod bridge;
pub mod call;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod session;
pub mod sink;
pub mod state_machine;
pub mod telephony;

// Public API exports
pub use actions::{ActionDispatcher, CallAction};
pub use alert::{
    AlertBackends, AlertEffect, AlertOrchestrator, AlertState, ContactPhoto, ContactPhotoLookup,
    FixedScreenLock, InMemoryPreferences, NotificationDescriptor, NotificationKind,
    NotificationPresenter, PreferenceStore, RingtonePlayer, RingtoneSource, ScreenLockProbe, Vibrator,
};
pub use bridge::CallBridge;
pub use call::{CallDirection, CallHandle, RawCall, SessionId, SessionState};
pub use config::{AlertConfig, BridgeConfig, FullScreenPolicy, NotificationConfig, VibrationPattern};
pub use error::{BridgeError, BridgeResult};
pub use events::SessionEvent;
pub use logging::{setup_logging, LogFormat, LoggingConfig};
pub use registry::{InstallOutcome, SessionRegistry};
pub use session::Session;
pub use sink::{ChannelEventListener, EventSinkBridge, SessionEventListener};
pub use state_machine::{SessionStateMachine, Transition};
pub use telephony::{CallStateListener, CallbackRegistration, ListenerToken, TelephonyAdapter, VideoState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
