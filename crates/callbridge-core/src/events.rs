//! Session events delivered to the UI layer
//!
//! Two shapes cross the boundary, serialized as flat JSON maps:
//!
//! ```json
//! {"event": "incoming", "number": "+15551234567", "name": "Alice", "state": "ringing"}
//! {"event": "stateChanged", "number": "+15551234567", "state": "active"}
//! ```
//!
//! Consumers must tolerate duplicate `stateChanged` events for the same state.

use serde::{Deserialize, Serialize};

use crate::call::SessionState;

/// Event published through the [`EventSinkBridge`](crate::sink::EventSinkBridge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A call was installed as the current session
    #[serde(rename = "incoming")]
    Incoming {
        number: String,
        /// Caller display name, empty when the host has none
        name: String,
        state: SessionState,
    },
    /// The current call reported a state
    #[serde(rename = "stateChanged")]
    StateChanged {
        number: String,
        state: SessionState,
    },
}

impl SessionEvent {
    pub fn incoming(number: impl Into<String>, name: impl Into<String>, state: SessionState) -> Self {
        SessionEvent::Incoming {
            number: number.into(),
            name: name.into(),
            state,
        }
    }

    pub fn state_changed(number: impl Into<String>, state: SessionState) -> Self {
        SessionEvent::StateChanged {
            number: number.into(),
            state,
        }
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Incoming { .. } => "incoming",
            SessionEvent::StateChanged { .. } => "stateChanged",
        }
    }

    pub fn number(&self) -> &str {
        match self {
            SessionEvent::Incoming { number, .. } | SessionEvent::StateChanged { number, .. } => number,
        }
    }

    pub fn state(&self) -> SessionState {
        match self {
            SessionEvent::Incoming { state, .. } | SessionEvent::StateChanged { state, .. } => *state,
        }
    }

    /// Flat JSON map as handed to the UI channel
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing a tagged enum of strings cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
