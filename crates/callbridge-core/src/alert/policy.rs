//! Alert transition planning
//!
//! Planning is pure: given the alert state currently in effect and the state
//! a session transition calls for, [`diff`] yields the ordered effects that
//! move one to the other. Nothing already in effect is issued again.

use std::fmt;

use crate::call::SessionState;
use crate::config::{AlertConfig, NotificationConfig};
use crate::session::Session;

use super::notification::{ContactPhoto, NotificationDescriptor};

/// Alerting currently in effect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    /// Ringtone (and vibration, when enabled) running
    pub ringing: bool,
    /// Notification currently shown
    pub notification: Option<NotificationDescriptor>,
}

impl AlertState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        !self.ringing && self.notification.is_none()
    }
}

/// One platform side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEffect {
    StartRingtone,
    StopRingtone,
    StartVibration,
    StopVibration,
    PostNotification(NotificationDescriptor),
    UpdateNotification(NotificationDescriptor),
    CancelNotification,
}

impl AlertEffect {
    pub fn name(&self) -> &'static str {
        match self {
            AlertEffect::StartRingtone => "start_ringtone",
            AlertEffect::StopRingtone => "stop_ringtone",
            AlertEffect::StartVibration => "start_vibration",
            AlertEffect::StopVibration => "stop_vibration",
            AlertEffect::PostNotification(_) => "post_notification",
            AlertEffect::UpdateNotification(_) => "update_notification",
            AlertEffect::CancelNotification => "cancel_notification",
        }
    }
}

impl fmt::Display for AlertEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a session transition asks of the alerting layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertTarget {
    /// Leave alerting as it is
    Keep,
    /// Move to this alert state
    Set(AlertState),
}

/// Alert state called for by `session` in its current state
pub fn target_for(
    session: &Session,
    screen_locked: bool,
    alerts: &AlertConfig,
    texts: &NotificationConfig,
    photo: Option<ContactPhoto>,
) -> AlertTarget {
    match session.state {
        SessionState::Ringing if session.is_incoming() => AlertTarget::Set(AlertState {
            ringing: true,
            notification: Some(NotificationDescriptor::incoming(
                session,
                texts,
                alerts.full_screen,
                screen_locked,
                photo,
            )),
        }),
        SessionState::Active => AlertTarget::Set(AlertState {
            ringing: false,
            notification: Some(NotificationDescriptor::ongoing(session, texts, photo)),
        }),
        SessionState::Disconnected => AlertTarget::Set(AlertState::idle()),
        _ => AlertTarget::Keep,
    }
}

/// Ordered effects moving `current` to `next`
///
/// When alerting winds down completely the notification goes first, so the
/// user stops seeing the call before the sound stops.
pub fn diff(current: &AlertState, next: &AlertState, vibrate: bool) -> Vec<AlertEffect> {
    let ringing = ringing_effects(current.ringing, next.ringing, vibrate);
    let notification = notification_effect(&current.notification, &next.notification);

    let mut effects = Vec::with_capacity(ringing.len() + 1);
    if next.is_idle() {
        effects.extend(notification);
        effects.extend(ringing);
    } else {
        effects.extend(ringing);
        effects.extend(notification);
    }
    effects
}

fn ringing_effects(was: bool, now: bool, vibrate: bool) -> Vec<AlertEffect> {
    match (was, now) {
        (false, true) if vibrate => vec![AlertEffect::StartRingtone, AlertEffect::StartVibration],
        (false, true) => vec![AlertEffect::StartRingtone],
        (true, false) if vibrate => vec![AlertEffect::StopRingtone, AlertEffect::StopVibration],
        (true, false) => vec![AlertEffect::StopRingtone],
        _ => Vec::new(),
    }
}

fn notification_effect(
    current: &Option<NotificationDescriptor>,
    next: &Option<NotificationDescriptor>,
) -> Option<AlertEffect> {
    match (current, next) {
        (None, Some(next)) => Some(AlertEffect::PostNotification(next.clone())),
        (Some(current), Some(next)) if current != next => Some(AlertEffect::UpdateNotification(next.clone())),
        (Some(_), None) => Some(AlertEffect::CancelNotification),
        _ => None,
    }
}
