//! Error types for the callbridge core
//!
//! Nothing in this crate is fatal to the host process. The worst outcome of
//! any failure is a missing visual or audio cue, never a stuck or duplicated
//! session. Errors fall into a few groups:
//!
//! - **Caller errors** - a command was issued with a missing or malformed
//!   argument (`InvalidArgument`). These are returned to the caller.
//! - **Silent races** - an action arrived after the call already ended
//!   (`NoActiveSession`). The command surface treats these as no-ops.
//! - **Side effects** - ringtone, vibration or notification failures
//!   (`SideEffectFailure`) and contact photo lookups (`LookupFailure`). These
//!   are logged and swallowed at the orchestration boundary.
//! - **Telephony** - the host rejected a command (`Telephony`).
//! - **Configuration** - invalid or unreadable configuration.
//!
//! ```rust
//! use callbridge_core::BridgeError;
//!
//! let err = BridgeError::invalid_argument("digit", "missing DTMF digit");
//! assert_eq!(err.category(), "argument");
//! assert!(!err.is_silent());
//! ```

use thiserror::Error;

/// Result type alias for callbridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the session controller and its collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A command argument was missing or malformed
    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// An action was issued while no call is current
    #[error("No active call session")]
    NoActiveSession,

    /// Ringtone, vibration or notification platform failure
    #[error("Side effect {effect} failed: {reason}")]
    SideEffectFailure { effect: String, reason: String },

    /// Contact photo lookup or decode failure
    #[error("Contact lookup failed: {reason}")]
    LookupFailure { reason: String },

    /// The telephony host rejected or failed a command
    #[error("Telephony {operation} failed: {reason}")]
    Telephony { operation: String, reason: String },

    /// Configuration value out of range or malformed
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Configuration source could not be parsed
    #[error("Failed to parse configuration: {reason}")]
    ConfigParse { reason: String },

    /// Configuration file could not be read
    #[error("I/O error: {reason}")]
    Io { reason: String },
}

impl BridgeError {
    /// Create an invalid argument error
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { field: field.into(), reason: reason.into() }
    }

    /// Create a side effect failure
    pub fn side_effect(effect: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SideEffectFailure { effect: effect.into(), reason: reason.into() }
    }

    /// Create a contact lookup failure
    pub fn lookup_failure(reason: impl Into<String>) -> Self {
        Self::LookupFailure { reason: reason.into() }
    }

    /// Create a telephony command failure
    pub fn telephony(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Telephony { operation: operation.into(), reason: reason.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { field: field.into(), reason: reason.into() }
    }

    /// Whether this error is swallowed rather than surfaced to the UI
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            BridgeError::NoActiveSession
                | BridgeError::SideEffectFailure { .. }
                | BridgeError::LookupFailure { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument { .. } => "argument",
            BridgeError::NoActiveSession => "session",
            BridgeError::SideEffectFailure { .. } => "alert",
            BridgeError::LookupFailure { .. } => "lookup",
            BridgeError::Telephony { .. } => "telephony",
            BridgeError::InvalidConfiguration { .. }
            | BridgeError::ConfigParse { .. }
            | BridgeError::Io { .. } => "configuration",
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io { reason: err.to_string() }
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::ConfigParse { reason: err.to_string() }
    }
}
