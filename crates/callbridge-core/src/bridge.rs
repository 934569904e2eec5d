//! Call bridge
//!
//! The composition root. A [`CallBridge`] owns one registry, one state
//! machine, one alert orchestrator, one event sink and one action dispatcher,
//! and exposes two faces:
//!
//! - the telephony entry points the host drives ([`CallBridge::on_call_added`],
//!   [`CallBridge::on_call_removed`]); per-call state changes arrive through
//!   the listener the registry registers for each session
//! - the command surface the UI drives (answer, reject, end, DTMF, dial)
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use callbridge_core::*;
//! # async fn example(adapter: Arc<dyn TelephonyAdapter>, backends: AlertBackends) -> BridgeResult<()> {
//! let bridge = CallBridge::new(
//!     BridgeConfig::default(),
//!     adapter,
//!     backends,
//!     Arc::new(FixedScreenLock(true)),
//! )?;
//! let mut events = bridge.subscribe_channel();
//!
//! bridge.on_call_added(
//!     RawCall::new(CallHandle::new("call-1"), call::raw::STATE_RINGING).with_number("+15551234567"),
//! );
//! if let Some(event) = events.recv().await {
//!     println!("{}", event.to_json());
//! }
//! bridge.answer_call().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::actions::{ActionDispatcher, CallAction};
use crate::alert::{AlertBackends, AlertEffect, AlertOrchestrator, ScreenLockProbe};
use crate::call::{CallHandle, RawCall, SessionId};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::SessionEvent;
use crate::registry::{InstallOutcome, SessionRegistry, SessionStateHandler};
use crate::session::Session;
use crate::sink::{EventSinkBridge, SessionEventListener};
use crate::state_machine::{SessionStateMachine, Transition};
use crate::telephony::TelephonyAdapter;

/// Characters accepted by [`CallBridge::send_dtmf`]
pub const DTMF_DIGITS: &str = "0123456789*#ABCD";

/// Owner of the single-call session controller
pub struct CallBridge {
    config: BridgeConfig,
    adapter: Arc<dyn TelephonyAdapter>,
    sink: Arc<EventSinkBridge>,
    registry: Arc<SessionRegistry>,
    alerts: Arc<AlertOrchestrator>,
    machine: Arc<SessionStateMachine>,
    dispatcher: ActionDispatcher,
    screen: Arc<dyn ScreenLockProbe>,
}

impl CallBridge {
    /// Wire up a bridge; fails only on invalid configuration
    pub fn new(
        config: BridgeConfig,
        adapter: Arc<dyn TelephonyAdapter>,
        backends: AlertBackends,
        screen: Arc<dyn ScreenLockProbe>,
    ) -> BridgeResult<Self> {
        config.validate()?;

        let sink = Arc::new(EventSinkBridge::new());
        let registry = Arc::new(SessionRegistry::new(
            adapter.clone(),
            sink.clone(),
            config.unknown_number_label.clone(),
        ));
        let alerts = Arc::new(AlertOrchestrator::new(config.clone(), backends));
        let machine = Arc::new(SessionStateMachine::new(
            registry.clone(),
            sink.clone(),
            alerts.clone(),
            screen.clone(),
        ));

        let handler: Arc<dyn SessionStateHandler> = machine.clone();
        registry.bind_state_handler(Arc::downgrade(&handler));

        let dispatcher = ActionDispatcher::new(registry.clone(), adapter.clone());

        tracing::debug!(
            full_screen = ?config.alerts.full_screen,
            vibrate = config.alerts.vibrate,
            "Call bridge ready"
        );

        Ok(Self {
            config,
            adapter,
            sink,
            registry,
            alerts,
            machine,
            dispatcher,
            screen,
        })
    }

    // ---- Telephony entry points ----

    /// The host reports a new call
    ///
    /// Installs it as the current session (replacing any other), publishes
    /// `incoming` and applies the alerting for its initial state.
    pub fn on_call_added(&self, raw: RawCall) -> InstallOutcome {
        tracing::debug!(call = %raw.handle, raw_state = raw.state, "Call added");
        let outcome = self.registry.install(&raw);

        if let InstallOutcome::Installed { session, replaced } = &outcome {
            if replaced.is_some() {
                self.alerts.on_session_cleared();
            }
            self.alerts.bind_session(session.id);
            self.alerts
                .on_session_event(session, self.screen.is_screen_locked());
        }
        outcome
    }

    /// The host reports a call is gone
    ///
    /// Clears the session only if `handle` is the current call; a stale
    /// removal never clears a newer session.
    pub fn on_call_removed(&self, handle: &CallHandle) -> Option<Session> {
        tracing::debug!(call = %handle, "Call removed");
        let removed = self.registry.clear_handle(handle)?;
        self.alerts.on_session_cleared();
        Some(removed)
    }

    /// Feed a raw state report for `session_id` directly
    ///
    /// Hosts normally deliver these through the registered listener.
    pub fn on_state_changed(&self, session_id: SessionId, raw_state: i32) -> Option<Transition> {
        self.machine.handle_state_change(session_id, raw_state)
    }

    // ---- Command surface ----

    pub async fn answer_call(&self) -> BridgeResult<()> {
        self.command(CallAction::Answer).await
    }

    pub async fn reject_call(&self) -> BridgeResult<()> {
        self.command(CallAction::Decline).await
    }

    pub async fn end_call(&self) -> BridgeResult<()> {
        self.command(CallAction::End).await
    }

    /// Play then stop one DTMF tone on the current call
    pub async fn send_dtmf(&self, digit: char) -> BridgeResult<()> {
        let digit = digit.to_ascii_uppercase();
        if !DTMF_DIGITS.contains(digit) {
            return Err(BridgeError::invalid_argument(
                "digit",
                format!("'{}' is not a DTMF digit", digit),
            ));
        }
        let Some(session) = self.registry.current() else {
            tracing::debug!(%digit, "No current call; ignoring DTMF");
            return Ok(());
        };

        tracing::debug!(call = %session.handle, %digit, "Sending DTMF");
        self.adapter.play_dtmf(&session.handle, digit).await?;
        self.adapter.stop_dtmf(&session.handle).await
    }

    /// Ask the host to dial `number`
    pub async fn make_call(&self, number: &str) -> BridgeResult<()> {
        let number = number.trim();
        if number.is_empty() {
            return Err(BridgeError::invalid_argument("number", "phone number is empty"));
        }
        tracing::info!(%number, "Placing outgoing call");
        self.adapter.place_call(number).await
    }

    pub fn has_active_call(&self) -> bool {
        self.registry.has_session()
    }

    /// Route a notification intent (`ANSWER_CALL`, `DECLINE_CALL`, `END_CALL`)
    pub async fn handle_intent(&self, intent: &str) {
        self.dispatcher.dispatch_intent(intent).await;
    }

    async fn command(&self, action: CallAction) -> BridgeResult<()> {
        match self.dispatcher.execute(action).await {
            Err(BridgeError::NoActiveSession) => {
                tracing::debug!(%action, "No current call; command ignored");
                Ok(())
            }
            result => result,
        }
    }

    // ---- UI event subscription ----

    pub fn subscribe(&self, listener: Arc<dyn SessionEventListener>) {
        self.sink.subscribe(listener);
    }

    /// Subscribe a channel; replaces any previous listener
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.sink.subscribe_channel()
    }

    pub fn unsubscribe(&self) {
        self.sink.unsubscribe();
    }

    // ---- Accessors ----

    pub fn current_session(&self) -> Option<Session> {
        self.registry.current()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn alerts(&self) -> &Arc<AlertOrchestrator> {
        &self.alerts
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn events(&self) -> &Arc<EventSinkBridge> {
        &self.sink
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Drop the current session and silence every alert
    pub fn shutdown(&self) -> Vec<AlertEffect> {
        if let Some(session) = self.registry.clear() {
            tracing::info!(call = %session.handle, "Shutting down with a call still current");
        }
        self.alerts.on_session_cleared()
    }
}

impl fmt::Debug for CallBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBridge")
            .field("registry", &self.registry)
            .field("alerts", &self.alerts)
            .field("has_listener", &self.sink.has_listener())
            .finish()
    }
}
