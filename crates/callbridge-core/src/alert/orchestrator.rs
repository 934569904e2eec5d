//! Alert orchestrator
//!
//! Turns session transitions into ringtone, vibration and notification side
//! effects. Each transition is planned as a diff against the alert state in
//! effect, then executed in order. A failing effect is logged and the rest of
//! the transition still runs.
//!
//! Contact photos are looked up off the critical path: the notification goes
//! out without a photo, and a spawned, time-bounded lookup updates it later
//! only if the same session is still current and its state has not moved on.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::call::{SessionId, SessionState};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::session::Session;

use super::backend::{
    ContactPhotoLookup, NotificationPresenter, PreferenceStore, RingtonePlayer, RingtoneSource, Vibrator,
};
use super::notification::ContactPhoto;
use super::policy::{diff, target_for, AlertEffect, AlertState, AlertTarget};

/// Platform capabilities used by the orchestrator
#[derive(Clone)]
pub struct AlertBackends {
    pub ringtone: Arc<dyn RingtonePlayer>,
    pub vibrator: Arc<dyn Vibrator>,
    pub notifications: Arc<dyn NotificationPresenter>,
    pub preferences: Arc<dyn PreferenceStore>,
    /// Optional; without it notifications never carry a photo
    pub contacts: Option<Arc<dyn ContactPhotoLookup>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PhotoStatus {
    Pending,
    Found(ContactPhoto),
    Missing,
}

#[derive(Debug, Default)]
struct AlertInner {
    alert: AlertState,
    session: Option<SessionId>,
    last_state: Option<SessionState>,
    /// Bumped whenever the session or its state changes
    generation: u64,
    photo: Option<(SessionId, PhotoStatus)>,
}

impl AlertInner {
    fn photo_for(&self, session: SessionId) -> Option<ContactPhoto> {
        match &self.photo {
            Some((id, PhotoStatus::Found(photo))) if *id == session => Some(photo.clone()),
            _ => None,
        }
    }

    fn needs_lookup(&self, session: SessionId) -> bool {
        !matches!(&self.photo, Some((id, _)) if *id == session)
    }
}

/// Drives alert side effects from session transitions
pub struct AlertOrchestrator {
    config: BridgeConfig,
    backends: AlertBackends,
    inner: Arc<Mutex<AlertInner>>,
}

impl AlertOrchestrator {
    pub fn new(config: BridgeConfig, backends: AlertBackends) -> Self {
        Self {
            config,
            backends,
            inner: Arc::new(Mutex::new(AlertInner::default())),
        }
    }

    /// Make `session_id` the only session whose transitions drive alerting
    ///
    /// Called when a session is installed. Transitions reported for any other
    /// session are ignored until the next bind.
    pub fn bind_session(&self, session_id: SessionId) {
        let mut inner = self.inner.lock();
        if inner.session == Some(session_id) {
            return;
        }
        inner.session = Some(session_id);
        inner.last_state = None;
        inner.generation += 1;
        if !matches!(&inner.photo, Some((id, _)) if *id == session_id) {
            inner.photo = None;
        }
        tracing::trace!(session = %session_id, "Bound alerting to session");
    }

    /// Session currently driving alerting
    pub fn bound_session(&self) -> Option<SessionId> {
        self.inner.lock().session
    }

    /// Apply the alerting `session` calls for; returns the effects issued
    ///
    /// Transitions of a session other than the bound one issue nothing.
    pub fn on_session_event(&self, session: &Session, screen_locked: bool) -> Vec<AlertEffect> {
        let mut inner = self.inner.lock();

        if inner.session != Some(session.id) {
            tracing::debug!(
                session = %session.id,
                state = %session.state,
                bound = ?inner.session,
                "Ignoring transition of unbound session"
            );
            return Vec::new();
        }
        if inner.last_state != Some(session.state) {
            inner.last_state = Some(session.state);
            inner.generation += 1;
        }

        let photo = inner.photo_for(session.id);
        let next = match target_for(
            session,
            screen_locked,
            &self.config.alerts,
            &self.config.notifications,
            photo,
        ) {
            AlertTarget::Keep => {
                tracing::trace!(session = %session.id, state = %session.state, "No alert change for state");
                return Vec::new();
            }
            AlertTarget::Set(next) => next,
        };

        let effects = diff(&inner.alert, &next, self.config.alerts.vibrate);
        self.execute(&effects);
        let showing = next.notification.is_some();
        inner.alert = next;

        if showing && inner.needs_lookup(session.id) {
            self.spawn_photo_lookup(&mut inner, session);
        }

        if !effects.is_empty() {
            tracing::debug!(
                session = %session.id,
                state = %session.state,
                screen_locked,
                effects = ?effects.iter().map(AlertEffect::name).collect::<Vec<_>>(),
                "Applied alert transition"
            );
        }
        effects
    }

    /// Wind all alerting down, e.g. when the session is replaced or removed
    pub fn on_session_cleared(&self) -> Vec<AlertEffect> {
        let mut inner = self.inner.lock();
        let effects = diff(&inner.alert, &AlertState::idle(), self.config.alerts.vibrate);
        self.execute(&effects);

        inner.alert = AlertState::idle();
        inner.session = None;
        inner.last_state = None;
        inner.generation += 1;
        inner.photo = None;

        if !effects.is_empty() {
            tracing::debug!(
                effects = ?effects.iter().map(AlertEffect::name).collect::<Vec<_>>(),
                "Cleared alerting"
            );
        }
        effects
    }

    /// Alert state currently in effect
    pub fn alert_state(&self) -> AlertState {
        self.inner.lock().alert.clone()
    }

    /// Ringtone to use: the configured preference if it resolves, else the default
    pub fn select_ringtone(&self) -> RingtoneSource {
        select_ringtone(
            self.backends.preferences.as_ref(),
            self.backends.ringtone.as_ref(),
            &self.config.ringtone_preference_key,
        )
    }

    fn execute(&self, effects: &[AlertEffect]) {
        for effect in effects {
            if let Err(e) = self.apply(effect) {
                tracing::warn!(effect = effect.name(), error = %e, "Alert side effect failed");
            }
        }
    }

    fn apply(&self, effect: &AlertEffect) -> BridgeResult<()> {
        let b = &self.backends;
        match effect {
            AlertEffect::StartRingtone => self.start_ringtone(),
            AlertEffect::StopRingtone => b.ringtone.stop(),
            AlertEffect::StartVibration => b.vibrator.start(&self.config.alerts.vibration_pattern),
            AlertEffect::StopVibration => b.vibrator.stop(),
            AlertEffect::PostNotification(n) => b.notifications.post(n),
            AlertEffect::UpdateNotification(n) => b.notifications.update(n),
            AlertEffect::CancelNotification => b.notifications.cancel(),
        }
    }

    fn start_ringtone(&self) -> BridgeResult<()> {
        let source = self.select_ringtone();
        match self.backends.ringtone.start(&source) {
            Err(e) if source != RingtoneSource::PlatformDefault => {
                tracing::warn!(?source, error = %e, "Custom ringtone failed; falling back to default");
                self.backends.ringtone.start(&RingtoneSource::PlatformDefault)
            }
            result => result,
        }
    }

    fn spawn_photo_lookup(&self, inner: &mut AlertInner, session: &Session) {
        let Some(contacts) = self.backends.contacts.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(session = %session.id, "No async runtime; skipping contact photo lookup");
            return;
        };

        inner.photo = Some((session.id, PhotoStatus::Pending));

        let shared = self.inner.clone();
        let notifications = self.backends.notifications.clone();
        let timeout = self.config.photo_lookup_timeout();
        let session_id = session.id;
        let generation = inner.generation;
        let number = session.number.clone();

        runtime.spawn(async move {
            let status = match tokio::time::timeout(timeout, contacts.lookup_photo(&number)).await {
                Ok(Ok(Some(photo))) => PhotoStatus::Found(photo),
                Ok(Ok(None)) => PhotoStatus::Missing,
                Ok(Err(e)) => {
                    tracing::debug!(session = %session_id, error = %e, "Contact photo lookup failed");
                    PhotoStatus::Missing
                }
                Err(_) => {
                    tracing::debug!(session = %session_id, ?timeout, "Contact photo lookup timed out");
                    PhotoStatus::Missing
                }
            };
            apply_photo(&shared, notifications.as_ref(), session_id, generation, status);
        });
    }
}

/// Record a finished lookup and refresh the notification if still relevant
///
/// The photo is kept for later descriptors of the same session, but the
/// notification is only updated now if the state has not changed since the
/// lookup started.
fn apply_photo(
    shared: &Mutex<AlertInner>,
    notifications: &dyn NotificationPresenter,
    session_id: SessionId,
    generation: u64,
    status: PhotoStatus,
) {
    let mut inner = shared.lock();

    match &inner.photo {
        Some((id, PhotoStatus::Pending)) if *id == session_id => {}
        _ => {
            tracing::debug!(session = %session_id, "Discarding contact photo for replaced session");
            return;
        }
    }
    inner.photo = Some((session_id, status.clone()));

    let PhotoStatus::Found(photo) = status else {
        return;
    };
    if inner.session != Some(session_id) || inner.generation != generation {
        tracing::debug!(session = %session_id, "State moved on; photo kept for the next notification");
        return;
    }
    let Some(current) = inner.alert.notification.clone() else {
        return;
    };
    if current.photo.is_some() {
        return;
    }

    let updated = current.with_photo(photo);
    match notifications.update(&updated) {
        Ok(()) => {
            tracing::debug!(session = %session_id, generation, "Attached contact photo");
            inner.alert.notification = Some(updated);
        }
        Err(e) => {
            tracing::warn!(effect = "update_notification", error = %e, "Alert side effect failed");
        }
    }
}

/// Resolve the ringtone to play from the preference store
pub fn select_ringtone(
    preferences: &dyn PreferenceStore,
    player: &dyn RingtonePlayer,
    key: &str,
) -> RingtoneSource {
    match preferences.get_string(key) {
        Some(id) if !id.trim().is_empty() && player.is_available(id.trim()) => {
            RingtoneSource::Custom(id.trim().to_string())
        }
        Some(id) if !id.trim().is_empty() => {
            tracing::debug!(ringtone = %id, "Configured ringtone unavailable; using default");
            RingtoneSource::PlatformDefault
        }
        _ => RingtoneSource::PlatformDefault,
    }
}

impl fmt::Debug for AlertOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertOrchestrator")
            .field("alert", &self.alert_state())
            .finish()
    }
}
