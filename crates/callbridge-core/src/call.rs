//! Call and session state types
//!
//! The telephony host owns the call itself; the core only references it
//! through an opaque [`CallHandle`]. Raw host state codes are normalized into
//! [`SessionState`] by a single total mapping.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw call state codes reported by the telephony host
pub mod raw {
    pub const STATE_NEW: i32 = 0;
    pub const STATE_DIALING: i32 = 1;
    pub const STATE_RINGING: i32 = 2;
    pub const STATE_HOLDING: i32 = 3;
    pub const STATE_ACTIVE: i32 = 4;
    pub const STATE_DISCONNECTED: i32 = 7;
    pub const STATE_SELECT_PHONE_ACCOUNT: i32 = 8;
    pub const STATE_CONNECTING: i32 = 9;
    pub const STATE_DISCONNECTING: i32 = 10;
    pub const STATE_PULLING_CALL: i32 = 11;
}

/// Opaque reference to a host-owned call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle(pub String);

impl CallHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one session installation
///
/// Two installs of different calls never share an id, so late callbacks and
/// in-flight lookups can be matched against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized call state
///
/// Serializes to the strings the UI layer consumes
/// (`new`, `dialing`, `ringing`, `selectAccount`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "dialing")]
    Dialing,
    #[serde(rename = "ringing")]
    Ringing,
    #[serde(rename = "holding")]
    Holding,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "disconnecting")]
    Disconnecting,
    #[serde(rename = "disconnected")]
    Disconnected,
    #[serde(rename = "connecting")]
    Connecting,
    #[serde(rename = "selectAccount")]
    SelectingAccount,
    #[serde(rename = "pulling")]
    Pulling,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SessionState {
    /// Map a raw host code; unrecognized codes become `Unknown`
    pub fn from_raw(code: i32) -> Self {
        match code {
            raw::STATE_NEW => SessionState::New,
            raw::STATE_DIALING => SessionState::Dialing,
            raw::STATE_RINGING => SessionState::Ringing,
            raw::STATE_HOLDING => SessionState::Holding,
            raw::STATE_ACTIVE => SessionState::Active,
            raw::STATE_DISCONNECTED => SessionState::Disconnected,
            raw::STATE_SELECT_PHONE_ACCOUNT => SessionState::SelectingAccount,
            raw::STATE_CONNECTING => SessionState::Connecting,
            raw::STATE_DISCONNECTING => SessionState::Disconnecting,
            raw::STATE_PULLING_CALL => SessionState::Pulling,
            _ => SessionState::Unknown,
        }
    }

    /// Wire string for the UI layer
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::New => "new",
            SessionState::Dialing => "dialing",
            SessionState::Ringing => "ringing",
            SessionState::Holding => "holding",
            SessionState::Active => "active",
            SessionState::Disconnecting => "disconnecting",
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::SelectingAccount => "selectAccount",
            SessionState::Pulling => "pulling",
            SessionState::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a call from the device's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

impl CallDirection {
    /// Infer the direction from the state a call was first reported in
    ///
    /// Only calls that start out ringing are incoming.
    pub fn from_initial_state(state: SessionState) -> Self {
        match state {
            SessionState::Ringing => CallDirection::Incoming,
            _ => CallDirection::Outgoing,
        }
    }
}

/// Snapshot of a call as reported by the telephony host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall {
    /// Host handle for the call
    pub handle: CallHandle,
    /// Remote number, if the host exposes one
    pub number: Option<String>,
    /// Caller display name, if the host exposes one
    pub display_name: Option<String>,
    /// Raw state code at the time of the report
    pub state: i32,
    /// Direction, if the host reports it
    pub direction: Option<CallDirection>,
}

impl RawCall {
    pub fn new(handle: CallHandle, state: i32) -> Self {
        Self {
            handle,
            number: None,
            display_name: None,
            state,
            direction: None,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_direction(mut self, direction: CallDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn session_state(&self) -> SessionState {
        SessionState::from_raw(self.state)
    }

    /// Reported direction, falling back to inference from the initial state
    pub fn resolved_direction(&self) -> CallDirection {
        self.direction
            .unwrap_or_else(|| CallDirection::from_initial_state(self.session_state()))
    }
}
