//! Out-of-process user actions
//!
//! Notification buttons deliver fire-and-forget intents (`ANSWER_CALL`,
//! `DECLINE_CALL`, `END_CALL`). There is no response channel, so the
//! dispatcher never fails: a missing session or a host error is logged and
//! dropped.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::registry::SessionRegistry;
use crate::telephony::{TelephonyAdapter, VideoState};

/// User action on the current call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallAction {
    /// Answer audio-only
    Answer,
    /// Reject without a text message
    Decline,
    /// Hang up
    End,
}

impl CallAction {
    /// Intent string carried by the notification button
    pub fn intent(&self) -> &'static str {
        match self {
            CallAction::Answer => "ANSWER_CALL",
            CallAction::Decline => "DECLINE_CALL",
            CallAction::End => "END_CALL",
        }
    }
}

impl fmt::Display for CallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.intent())
    }
}

impl FromStr for CallAction {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANSWER_CALL" => Ok(CallAction::Answer),
            "DECLINE_CALL" => Ok(CallAction::Decline),
            "END_CALL" => Ok(CallAction::End),
            other => Err(BridgeError::invalid_argument("action", format!("unknown call action {}", other))),
        }
    }
}

/// Routes user actions to the telephony host
pub struct ActionDispatcher {
    registry: Arc<SessionRegistry>,
    adapter: Arc<dyn TelephonyAdapter>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<SessionRegistry>, adapter: Arc<dyn TelephonyAdapter>) -> Self {
        Self { registry, adapter }
    }

    /// Issue `action` against the current call, if there is one
    pub async fn dispatch(&self, action: CallAction) {
        match self.execute(action).await {
            Ok(()) => {}
            Err(BridgeError::NoActiveSession) => {
                tracing::debug!(%action, "No current call; ignoring action");
            }
            Err(e) => {
                tracing::warn!(%action, error = %e, "Call action failed");
            }
        }
    }

    /// Parse and dispatch an intent string; unknown intents are ignored
    pub async fn dispatch_intent(&self, intent: &str) {
        match intent.parse::<CallAction>() {
            Ok(action) => self.dispatch(action).await,
            Err(e) => tracing::warn!(intent, error = %e, "Ignoring unrecognized call intent"),
        }
    }

    /// Issue `action`, reporting `NoActiveSession` and host failures
    pub async fn execute(&self, action: CallAction) -> BridgeResult<()> {
        let session = self.registry.current().ok_or(BridgeError::NoActiveSession)?;
        tracing::info!(%action, call = %session.handle, "Dispatching call action");

        match action {
            CallAction::Answer => self.adapter.answer(&session.handle, VideoState::AudioOnly).await,
            CallAction::Decline => self.adapter.reject(&session.handle, false).await,
            CallAction::End => self.adapter.disconnect(&session.handle).await,
        }
    }
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher").finish_non_exhaustive()
    }
}
