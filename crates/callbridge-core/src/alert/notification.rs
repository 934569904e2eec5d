//! Immutable call notification descriptors
//!
//! A descriptor is rebuilt for every transition and compared with the one
//! currently shown; only a difference results in a post, update or cancel.

use chrono::{DateTime, Utc};

use crate::actions::CallAction;
use crate::config::{FullScreenPolicy, NotificationConfig};
use crate::session::Session;

/// Decoded contact picture attached to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPhoto {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    IncomingCall,
    OngoingCall,
}

/// Button on the call notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub label: String,
    pub action: CallAction,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, action: CallAction) -> Self {
        Self { label: label.into(), action }
    }
}

/// Everything the host needs to render the call notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDescriptor {
    pub kind: NotificationKind,
    pub title: String,
    pub text: String,
    pub number: String,
    /// Request a full-screen alert over the lock screen
    pub full_screen: bool,
    /// Render elapsed time counting from `when`
    pub show_chronometer: bool,
    pub when: Option<DateTime<Utc>>,
    pub photo: Option<ContactPhoto>,
    pub actions: Vec<NotificationAction>,
    /// Not dismissable by the user
    pub ongoing: bool,
}

impl NotificationDescriptor {
    /// Ringing variant with answer/decline buttons
    pub fn incoming(
        session: &Session,
        texts: &NotificationConfig,
        policy: FullScreenPolicy,
        screen_locked: bool,
        photo: Option<ContactPhoto>,
    ) -> Self {
        Self {
            kind: NotificationKind::IncomingCall,
            title: texts.incoming_title.clone(),
            text: session.display_label().to_string(),
            number: session.number.clone(),
            full_screen: policy.full_screen(screen_locked),
            show_chronometer: false,
            when: None,
            photo,
            actions: vec![
                NotificationAction::new("Answer", CallAction::Answer),
                NotificationAction::new("Decline", CallAction::Decline),
            ],
            ongoing: true,
        }
    }

    /// In-call variant showing elapsed time since the call connected
    pub fn ongoing(session: &Session, texts: &NotificationConfig, photo: Option<ContactPhoto>) -> Self {
        Self {
            kind: NotificationKind::OngoingCall,
            title: texts.ongoing_title.clone(),
            text: session.display_label().to_string(),
            number: session.number.clone(),
            full_screen: false,
            show_chronometer: true,
            when: session.connected_at,
            photo,
            actions: vec![NotificationAction::new("End", CallAction::End)],
            ongoing: true,
        }
    }

    pub fn with_photo(mut self, photo: ContactPhoto) -> Self {
        self.photo = Some(photo);
        self
    }
}
