//! The single in-flight call session

use chrono::{DateTime, Utc};

use crate::call::{CallDirection, CallHandle, RawCall, SessionId, SessionState};

/// Snapshot of the current call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity of this installation
    pub id: SessionId,
    /// Host handle; referenced, not owned
    pub handle: CallHandle,
    /// Remote number, or the configured unknown-number label
    pub number: String,
    pub display_name: Option<String>,
    pub state: SessionState,
    pub direction: CallDirection,
    pub created_at: DateTime<Utc>,
    /// First time the call reached `Active`
    pub connected_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Wrap a host call report into a fresh session
    pub fn from_raw(raw: &RawCall, unknown_number_label: &str) -> Self {
        let number = raw
            .number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(unknown_number_label)
            .to_string();
        let display_name = raw
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Self {
            id: SessionId::new(),
            handle: raw.handle.clone(),
            number,
            display_name,
            state: raw.session_state(),
            direction: raw.resolved_direction(),
            created_at: Utc::now(),
            connected_at: None,
        }
    }

    /// Record a new state, stamping `connected_at` on first activation
    pub fn apply_state(&mut self, state: SessionState) {
        if state == SessionState::Active && self.connected_at.is_none() {
            self.connected_at = Some(Utc::now());
        }
        self.state = state;
    }

    /// Name for display: the caller name when known, else the number
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.number)
    }

    pub fn is_incoming(&self) -> bool {
        self.direction == CallDirection::Incoming
    }
}
