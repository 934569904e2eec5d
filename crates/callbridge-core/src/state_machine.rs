//! Session state machine
//!
//! Receives raw host state codes for the current session, normalizes them,
//! publishes a `stateChanged` event for every report (duplicates included),
//! drives the alert orchestrator, and clears the registry once the call is
//! disconnected. That last step is the only place a session is torn down
//! because its call completed.

use std::fmt;
use std::sync::Arc;

use crate::alert::{AlertEffect, AlertOrchestrator, ScreenLockProbe};
use crate::call::{SessionId, SessionState};
use crate::events::SessionEvent;
use crate::registry::{SessionRegistry, SessionStateHandler};
use crate::session::Session;
use crate::sink::EventSinkBridge;

/// Outcome of one processed state report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session after the state was applied
    pub session: Session,
    /// Alert effects issued for the transition
    pub effects: Vec<AlertEffect>,
    /// Whether the session was cleared as a result
    pub cleared: bool,
}

pub struct SessionStateMachine {
    registry: Arc<SessionRegistry>,
    sink: Arc<EventSinkBridge>,
    alerts: Arc<AlertOrchestrator>,
    screen: Arc<dyn ScreenLockProbe>,
}

impl SessionStateMachine {
    pub fn new(
        registry: Arc<SessionRegistry>,
        sink: Arc<EventSinkBridge>,
        alerts: Arc<AlertOrchestrator>,
        screen: Arc<dyn ScreenLockProbe>,
    ) -> Self {
        Self {
            registry,
            sink,
            alerts,
            screen,
        }
    }

    /// Process a raw state report for `session_id`
    ///
    /// Returns `None` when the report belongs to a session that is no longer
    /// current, including one replaced by the event listener mid-report.
    pub fn handle_state_change(&self, session_id: SessionId, raw_state: i32) -> Option<Transition> {
        let _span = tracing::debug_span!("state_change", session = %session_id, raw_state).entered();
        let state = SessionState::from_raw(raw_state);
        if state == SessionState::Unknown {
            tracing::debug!(session = %session_id, raw_state, "Unrecognized raw call state");
        }

        let Some(session) = self.registry.update_state(session_id, state) else {
            tracing::debug!(session = %session_id, %state, "Dropping state change for stale session");
            return None;
        };

        tracing::info!(call = %session.handle, number = %session.number, %state, "Call state changed");
        self.sink
            .publish(SessionEvent::state_changed(session.number.clone(), state));

        // The listener may have installed another call from inside publish
        if !self.registry.is_current(session_id) {
            tracing::debug!(session = %session_id, %state, "Session replaced while publishing; skipping alerts");
            return None;
        }

        let effects = self
            .alerts
            .on_session_event(&session, self.screen.is_screen_locked());

        let cleared = if state.is_terminal() {
            tracing::debug!(session = %session_id, "Call disconnected, clearing current session");
            self.registry.clear_session(session_id).is_some()
        } else {
            false
        };

        Some(Transition {
            session,
            effects,
            cleared,
        })
    }
}

impl SessionStateHandler for SessionStateMachine {
    fn on_raw_state_changed(&self, session_id: SessionId, raw_state: i32) {
        self.handle_state_change(session_id, raw_state);
    }
}

impl fmt::Debug for SessionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStateMachine")
            .field("registry", &self.registry)
            .finish()
    }
}
