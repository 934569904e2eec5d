//! Console-backed host capabilities
//!
//! Each capability logs what a real platform would do. The telephony fake
//! keeps its listeners so the scenario script can play the host's part.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use callbridge_core::{
    BridgeResult, CallHandle, CallStateListener, ContactPhoto, ContactPhotoLookup, ListenerToken,
    NotificationDescriptor, NotificationPresenter, RingtonePlayer, RingtoneSource, TelephonyAdapter,
    VibrationPattern, Vibrator, VideoState,
};

#[derive(Default)]
pub struct ConsoleTelephony {
    next_token: AtomicU64,
    listeners: Mutex<HashMap<ListenerToken, (CallHandle, Arc<dyn CallStateListener>)>>,
}

impl ConsoleTelephony {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Play the host reporting `raw_state` for `handle`
    pub fn report_state(&self, handle: &CallHandle, raw_state: i32) {
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .values()
            .filter(|(h, _)| h == handle)
            .map(|(_, listener)| listener.clone())
            .collect();
        info!(call = %handle, raw_state, listeners = listeners.len(), "[host] state change");
        for listener in listeners {
            listener.on_state_changed(handle, raw_state);
        }
    }
}

#[async_trait]
impl TelephonyAdapter for ConsoleTelephony {
    fn register_state_listener(&self, handle: &CallHandle, listener: Arc<dyn CallStateListener>) -> ListenerToken {
        let token = ListenerToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().insert(token, (handle.clone(), listener));
        token
    }

    fn unregister_state_listener(&self, _handle: &CallHandle, token: ListenerToken) {
        self.listeners.lock().remove(&token);
    }

    async fn answer(&self, handle: &CallHandle, video_state: VideoState) -> BridgeResult<()> {
        info!(call = %handle, ?video_state, "[host] answer");
        Ok(())
    }

    async fn reject(&self, handle: &CallHandle, with_message: bool) -> BridgeResult<()> {
        info!(call = %handle, with_message, "[host] reject");
        Ok(())
    }

    async fn disconnect(&self, handle: &CallHandle) -> BridgeResult<()> {
        info!(call = %handle, "[host] disconnect");
        Ok(())
    }

    async fn play_dtmf(&self, handle: &CallHandle, digit: char) -> BridgeResult<()> {
        info!(call = %handle, %digit, "[host] play dtmf");
        Ok(())
    }

    async fn stop_dtmf(&self, handle: &CallHandle) -> BridgeResult<()> {
        info!(call = %handle, "[host] stop dtmf");
        Ok(())
    }

    async fn place_call(&self, number: &str) -> BridgeResult<()> {
        info!(%number, "[host] place call");
        Ok(())
    }
}

pub struct ConsoleRingtone;

impl RingtonePlayer for ConsoleRingtone {
    fn is_available(&self, _id: &str) -> bool {
        true
    }

    fn start(&self, source: &RingtoneSource) -> BridgeResult<()> {
        info!(?source, "[ringtone] start");
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        info!("[ringtone] stop");
        Ok(())
    }
}

pub struct ConsoleVibrator;

impl Vibrator for ConsoleVibrator {
    fn start(&self, pattern: &VibrationPattern) -> BridgeResult<()> {
        info!(timings = ?pattern.timings_ms, repeat_from = ?pattern.repeat_from, "[vibrator] start");
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        info!("[vibrator] stop");
        Ok(())
    }
}

pub struct ConsoleNotifications;

impl ConsoleNotifications {
    fn show(verb: &str, n: &NotificationDescriptor) {
        info!(
            kind = ?n.kind,
            title = %n.title,
            text = %n.text,
            full_screen = n.full_screen,
            chronometer = n.show_chronometer,
            photo = n.photo.is_some(),
            actions = ?n.actions.iter().map(|a| a.action.intent()).collect::<Vec<_>>(),
            "[notification] {}",
            verb
        );
    }
}

impl NotificationPresenter for ConsoleNotifications {
    fn post(&self, notification: &NotificationDescriptor) -> BridgeResult<()> {
        Self::show("post", notification);
        Ok(())
    }

    fn update(&self, notification: &NotificationDescriptor) -> BridgeResult<()> {
        Self::show("update", notification);
        Ok(())
    }

    fn cancel(&self) -> BridgeResult<()> {
        info!("[notification] cancel");
        Ok(())
    }
}

/// Contact book where every number has a one-pixel avatar
pub struct ConsoleContacts;

#[async_trait]
impl ContactPhotoLookup for ConsoleContacts {
    async fn lookup_photo(&self, number: &str) -> BridgeResult<Option<ContactPhoto>> {
        info!(%number, "[contacts] lookup");
        Ok(Some(ContactPhoto {
            mime_type: "image/png".to_string(),
            data: vec![0x89, b'P', b'N', b'G'],
        }))
    }
}
