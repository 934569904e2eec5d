//! Session registry
//!
//! Owns the single current session and its listener registration. Every
//! mutation happens under one mutex, and a replaced session's registration is
//! released inside that critical section before the new one is stored, so no
//! late callback from the old call can act on the new session.
//!
//! Listeners registered with the host are bound to a [`SessionId`]; the state
//! handler they forward to checks that id against the current session and
//! ignores anything stale.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::call::{CallHandle, RawCall, SessionId, SessionState};
use crate::events::SessionEvent;
use crate::session::Session;
use crate::sink::EventSinkBridge;
use crate::telephony::{CallStateListener, CallbackRegistration, TelephonyAdapter};

/// Receives raw state changes tagged with the session they were registered for
pub trait SessionStateHandler: Send + Sync {
    fn on_raw_state_changed(&self, session_id: SessionId, raw_state: i32);
}

/// Result of [`SessionRegistry::install`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A new session was installed, possibly replacing an older one
    Installed {
        session: Session,
        replaced: Option<Session>,
    },
    /// The call is already the current session
    Unchanged(Session),
    /// The call was reported already disconnected and was not installed
    Ignored,
}

impl InstallOutcome {
    pub fn installed(&self) -> Option<&Session> {
        match self {
            InstallOutcome::Installed { session, .. } => Some(session),
            _ => None,
        }
    }
}

/// Counters for registry activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total_installed: usize,
    pub total_replaced: usize,
    pub total_cleared: usize,
}

struct ActiveSession {
    session: Session,
    registration: CallbackRegistration,
}

/// Forwards host callbacks for one session to the state handler
struct SessionBoundListener {
    session_id: SessionId,
    handler: Weak<dyn SessionStateHandler>,
}

impl CallStateListener for SessionBoundListener {
    fn on_state_changed(&self, handle: &CallHandle, raw_state: i32) {
        match self.handler.upgrade() {
            Some(handler) => handler.on_raw_state_changed(self.session_id, raw_state),
            None => {
                tracing::debug!(call = %handle, raw_state, "State handler gone; dropping callback");
            }
        }
    }
}

/// Owner of the single current session
pub struct SessionRegistry {
    adapter: Arc<dyn TelephonyAdapter>,
    sink: Arc<EventSinkBridge>,
    unknown_number_label: String,
    handler: RwLock<Option<Weak<dyn SessionStateHandler>>>,
    current: Mutex<Option<ActiveSession>>,
    stats: Mutex<RegistryStats>,
}

impl SessionRegistry {
    pub fn new(
        adapter: Arc<dyn TelephonyAdapter>,
        sink: Arc<EventSinkBridge>,
        unknown_number_label: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            sink,
            unknown_number_label: unknown_number_label.into(),
            handler: RwLock::new(None),
            current: Mutex::new(None),
            stats: Mutex::new(RegistryStats::default()),
        }
    }

    /// Set the handler that listeners registered from now on forward to
    pub fn bind_state_handler(&self, handler: Weak<dyn SessionStateHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// Make `raw` the current session
    ///
    /// Re-installing the current call is a no-op. Otherwise the previous
    /// session's listener is released first, the new call gets its own
    /// listener, and an `incoming` event is published.
    pub fn install(&self, raw: &RawCall) -> InstallOutcome {
        let initial_state = raw.session_state();

        let (session, replaced) = {
            let mut current = self.current.lock();

            if let Some(active) = current.as_ref() {
                if active.session.handle == raw.handle {
                    tracing::debug!(call = %raw.handle, session = %active.session.id, "Call already current; install is a no-op");
                    return InstallOutcome::Unchanged(active.session.clone());
                }
            }

            if initial_state.is_terminal() {
                tracing::debug!(call = %raw.handle, "Ignoring call reported already disconnected");
                return InstallOutcome::Ignored;
            }

            let replaced = current.take().map(|previous| {
                let ActiveSession { session, registration } = previous;
                registration.release();
                tracing::info!(call = %session.handle, session = %session.id, "Replacing current session");
                session
            });

            let session = Session::from_raw(raw, &self.unknown_number_label);
            let registration = CallbackRegistration::acquire(
                self.adapter.clone(),
                session.handle.clone(),
                self.bound_listener(session.id),
            );
            *current = Some(ActiveSession {
                session: session.clone(),
                registration,
            });

            let mut stats = self.stats.lock();
            stats.total_installed += 1;
            if replaced.is_some() {
                stats.total_replaced += 1;
            }

            (session, replaced)
        };

        tracing::info!(
            call = %session.handle,
            session = %session.id,
            state = %session.state,
            direction = ?session.direction,
            "Installed call session"
        );

        self.sink.publish(SessionEvent::incoming(
            session.number.clone(),
            session.display_name.clone().unwrap_or_default(),
            session.state,
        ));

        InstallOutcome::Installed { session, replaced }
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.current.lock().as_ref().map(|active| active.session.clone())
    }

    pub fn has_session(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Whether `id` is still the current session
    pub fn is_current(&self, id: SessionId) -> bool {
        self.current
            .lock()
            .as_ref()
            .map(|active| active.session.id == id)
            .unwrap_or(false)
    }

    /// Record `state` on session `id` if it is still current
    pub fn update_state(&self, id: SessionId, state: SessionState) -> Option<Session> {
        let mut current = self.current.lock();
        match current.as_mut() {
            Some(active) if active.session.id == id => {
                active.session.apply_state(state);
                Some(active.session.clone())
            }
            _ => None,
        }
    }

    /// Release the current registration and drop the session
    pub fn clear(&self) -> Option<Session> {
        let taken = self.current.lock().take();
        self.finish_clear(taken)
    }

    /// Clear only if `id` is still the current session
    pub fn clear_session(&self, id: SessionId) -> Option<Session> {
        let taken = {
            let mut current = self.current.lock();
            match current.as_ref() {
                Some(active) if active.session.id == id => current.take(),
                _ => None,
            }
        };
        self.finish_clear(taken)
    }

    /// Clear only if `handle` belongs to the current session
    pub fn clear_handle(&self, handle: &CallHandle) -> Option<Session> {
        let taken = {
            let mut current = self.current.lock();
            match current.as_ref() {
                Some(active) if &active.session.handle == handle => current.take(),
                _ => None,
            }
        };
        self.finish_clear(taken)
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.lock().clone()
    }

    fn finish_clear(&self, taken: Option<ActiveSession>) -> Option<Session> {
        let ActiveSession { session, registration } = taken?;
        registration.release();
        self.stats.lock().total_cleared += 1;
        tracing::info!(call = %session.handle, session = %session.id, "Cleared call session");
        Some(session)
    }

    fn bound_listener(&self, session_id: SessionId) -> Arc<dyn CallStateListener> {
        let handler = self
            .handler
            .read()
            .clone()
            .unwrap_or_else(|| Weak::<DetachedHandler>::new() as Weak<dyn SessionStateHandler>);
        Arc::new(SessionBoundListener { session_id, handler })
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("current", &self.current())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Placeholder type for listeners created before a handler is bound
struct DetachedHandler;

impl SessionStateHandler for DetachedHandler {
    fn on_raw_state_changed(&self, _session_id: SessionId, _raw_state: i32) {}
}
