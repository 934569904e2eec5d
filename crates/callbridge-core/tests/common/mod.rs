//! Shared fakes for callbridge-core integration tests
//!
//! Every fake records into one [`EffectLog`] so tests can assert the order in
//! which side effects reached the platform. Failures can be injected per
//! capability.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use callbridge_core::call::raw;
use callbridge_core::{
    AlertBackends, BridgeConfig, BridgeError, BridgeResult, CallBridge, CallDirection, CallHandle,
    CallStateListener, ContactPhoto, ContactPhotoLookup, InMemoryPreferences, ListenerToken,
    NotificationDescriptor, NotificationPresenter, RawCall, RingtonePlayer, RingtoneSource,
    ScreenLockProbe, SessionEvent, TelephonyAdapter, VibrationPattern, Vibrator, VideoState,
};

pub const CALLER: &str = "+15551234567";

// ---- Telephony ----

/// Command the core issued to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Answer(CallHandle, VideoState),
    Reject(CallHandle, bool),
    Disconnect(CallHandle),
    PlayDtmf(CallHandle, char),
    StopDtmf(CallHandle),
    PlaceCall(String),
}

/// Telephony host fake tracking listener registrations and commands
#[derive(Default)]
pub struct FakeTelephony {
    next_token: AtomicU64,
    live: Mutex<HashMap<ListenerToken, (CallHandle, Arc<dyn CallStateListener>)>>,
    /// Every listener ever registered, kept to simulate late callbacks
    history: Mutex<Vec<(CallHandle, Arc<dyn CallStateListener>)>>,
    unregistered: Mutex<Vec<ListenerToken>>,
    commands: Mutex<Vec<Command>>,
    fail_commands: AtomicBool,
}

impl FakeTelephony {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn live_registrations(&self) -> usize {
        self.live.lock().len()
    }

    pub fn total_registrations(&self) -> usize {
        self.history.lock().len()
    }

    pub fn unregistered(&self) -> Vec<ListenerToken> {
        self.unregistered.lock().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    /// Deliver `raw_state` to every live listener on `handle`
    pub fn report_state(&self, handle: &CallHandle, raw_state: i32) {
        let listeners: Vec<_> = self
            .live
            .lock()
            .values()
            .filter(|(h, _)| h == handle)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.on_state_changed(handle, raw_state);
        }
    }

    /// Invoke the n-th listener ever registered, live or not
    pub fn report_state_via(&self, index: usize, raw_state: i32) {
        let entry = self.history.lock().get(index).cloned();
        if let Some((handle, listener)) = entry {
            listener.on_state_changed(&handle, raw_state);
        }
    }

    fn record(&self, command: Command) -> BridgeResult<()> {
        self.commands.lock().push(command.clone());
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(BridgeError::telephony(format!("{:?}", command), "host refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl TelephonyAdapter for FakeTelephony {
    fn register_state_listener(&self, handle: &CallHandle, listener: Arc<dyn CallStateListener>) -> ListenerToken {
        let token = ListenerToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        self.live.lock().insert(token, (handle.clone(), listener.clone()));
        self.history.lock().push((handle.clone(), listener));
        token
    }

    fn unregister_state_listener(&self, _handle: &CallHandle, token: ListenerToken) {
        let removed = self.live.lock().remove(&token);
        assert!(removed.is_some(), "unregister of unknown or released {}", token);
        self.unregistered.lock().push(token);
    }

    async fn answer(&self, handle: &CallHandle, video_state: VideoState) -> BridgeResult<()> {
        self.record(Command::Answer(handle.clone(), video_state))
    }

    async fn reject(&self, handle: &CallHandle, with_message: bool) -> BridgeResult<()> {
        self.record(Command::Reject(handle.clone(), with_message))
    }

    async fn disconnect(&self, handle: &CallHandle) -> BridgeResult<()> {
        self.record(Command::Disconnect(handle.clone()))
    }

    async fn play_dtmf(&self, handle: &CallHandle, digit: char) -> BridgeResult<()> {
        self.record(Command::PlayDtmf(handle.clone(), digit))
    }

    async fn stop_dtmf(&self, handle: &CallHandle) -> BridgeResult<()> {
        self.record(Command::StopDtmf(handle.clone()))
    }

    async fn place_call(&self, number: &str) -> BridgeResult<()> {
        self.record(Command::PlaceCall(number.to_string()))
    }
}

// ---- Alert backends ----

/// Ordered record of side effects that reached the platform
#[derive(Default)]
pub struct EffectLog {
    entries: Mutex<Vec<&'static str>>,
}

impl EffectLog {
    pub fn push(&self, entry: &'static str) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().clone()
    }

    /// Return and forget what has been logged so far
    pub fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.entries.lock())
    }
}

fn injected(effect: &str) -> BridgeError {
    BridgeError::side_effect(effect, "injected failure")
}

pub struct FakeRingtone {
    log: Arc<EffectLog>,
    available: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<RingtoneSource>>,
    playing: AtomicBool,
    fail_custom: AtomicBool,
    fail_all: AtomicBool,
}

impl FakeRingtone {
    pub fn new(log: Arc<EffectLog>) -> Self {
        Self {
            log,
            available: Mutex::new(HashSet::new()),
            attempts: Mutex::new(Vec::new()),
            playing: AtomicBool::new(false),
            fail_custom: AtomicBool::new(false),
            fail_all: AtomicBool::new(false),
        }
    }

    pub fn make_available(&self, id: &str) {
        self.available.lock().insert(id.to_string());
    }

    pub fn attempts(&self) -> Vec<RingtoneSource> {
        self.attempts.lock().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn fail_custom(&self, fail: bool) {
        self.fail_custom.store(fail, Ordering::SeqCst);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }
}

impl RingtonePlayer for FakeRingtone {
    fn is_available(&self, id: &str) -> bool {
        self.available.lock().contains(id)
    }

    fn start(&self, source: &RingtoneSource) -> BridgeResult<()> {
        self.attempts.lock().push(source.clone());
        let custom = matches!(source, RingtoneSource::Custom(_));
        if self.fail_all.load(Ordering::SeqCst) || (custom && self.fail_custom.load(Ordering::SeqCst)) {
            return Err(injected("start_ringtone"));
        }
        self.playing.store(true, Ordering::SeqCst);
        self.log.push("start_ringtone");
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.log.push("stop_ringtone");
        Ok(())
    }
}

pub struct FakeVibrator {
    log: Arc<EffectLog>,
    patterns: Mutex<Vec<VibrationPattern>>,
    running: AtomicBool,
}

impl FakeVibrator {
    pub fn new(log: Arc<EffectLog>) -> Self {
        Self {
            log,
            patterns: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn patterns(&self) -> Vec<VibrationPattern> {
        self.patterns.lock().clone()
    }
}

impl Vibrator for FakeVibrator {
    fn start(&self, pattern: &VibrationPattern) -> BridgeResult<()> {
        self.patterns.lock().push(pattern.clone());
        self.running.store(true, Ordering::SeqCst);
        self.log.push("start_vibration");
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        self.running.store(false, Ordering::SeqCst);
        self.log.push("stop_vibration");
        Ok(())
    }
}

pub struct FakeNotifications {
    log: Arc<EffectLog>,
    shown: Mutex<Option<NotificationDescriptor>>,
    posted: Mutex<Vec<NotificationDescriptor>>,
    updated: Mutex<Vec<NotificationDescriptor>>,
    fail_post: AtomicBool,
}

impl FakeNotifications {
    pub fn new(log: Arc<EffectLog>) -> Self {
        Self {
            log,
            shown: Mutex::new(None),
            posted: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            fail_post: AtomicBool::new(false),
        }
    }

    pub fn shown(&self) -> Option<NotificationDescriptor> {
        self.shown.lock().clone()
    }

    pub fn posted(&self) -> Vec<NotificationDescriptor> {
        self.posted.lock().clone()
    }

    pub fn updated(&self) -> Vec<NotificationDescriptor> {
        self.updated.lock().clone()
    }

    pub fn fail_post(&self, fail: bool) {
        self.fail_post.store(fail, Ordering::SeqCst);
    }
}

impl NotificationPresenter for FakeNotifications {
    fn post(&self, notification: &NotificationDescriptor) -> BridgeResult<()> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(injected("post_notification"));
        }
        self.posted.lock().push(notification.clone());
        *self.shown.lock() = Some(notification.clone());
        self.log.push("post_notification");
        Ok(())
    }

    fn update(&self, notification: &NotificationDescriptor) -> BridgeResult<()> {
        self.updated.lock().push(notification.clone());
        *self.shown.lock() = Some(notification.clone());
        self.log.push("update_notification");
        Ok(())
    }

    fn cancel(&self) -> BridgeResult<()> {
        self.shown.lock().take();
        self.log.push("cancel_notification");
        Ok(())
    }
}

/// Contact lookup answering every number with a photo derived from it
pub struct FakeContacts {
    delay: Duration,
    fail: bool,
    lookups: AtomicUsize,
}

impl FakeContacts {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            delay: Duration::ZERO,
            fail: true,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn photo_for(number: &str) -> ContactPhoto {
        ContactPhoto {
            mime_type: "image/png".to_string(),
            data: number.as_bytes().to_vec(),
        }
    }
}

#[async_trait]
impl ContactPhotoLookup for FakeContacts {
    async fn lookup_photo(&self, number: &str) -> BridgeResult<Option<ContactPhoto>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(BridgeError::lookup_failure("contacts provider unavailable"));
        }
        Ok(Some(Self::photo_for(number)))
    }
}

/// Screen lock flag the test can flip
#[derive(Default)]
pub struct ToggleLock(AtomicBool);

impl ToggleLock {
    pub fn set(&self, locked: bool) {
        self.0.store(locked, Ordering::SeqCst);
    }
}

impl ScreenLockProbe for ToggleLock {
    fn is_screen_locked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---- Harness ----

pub struct Harness {
    pub bridge: Arc<CallBridge>,
    pub telephony: Arc<FakeTelephony>,
    pub log: Arc<EffectLog>,
    pub ringtone: Arc<FakeRingtone>,
    pub vibrator: Arc<FakeVibrator>,
    pub notifications: Arc<FakeNotifications>,
    pub preferences: Arc<InMemoryPreferences>,
    pub lock: Arc<ToggleLock>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Harness {
    pub fn new(locked: bool) -> Self {
        Self::build(BridgeConfig::default(), locked, None)
    }

    pub fn with_config(config: BridgeConfig, locked: bool) -> Self {
        Self::build(config, locked, None)
    }

    pub fn with_contacts(config: BridgeConfig, contacts: Arc<FakeContacts>) -> Self {
        Self::build(config, false, Some(contacts))
    }

    fn build(config: BridgeConfig, locked: bool, contacts: Option<Arc<FakeContacts>>) -> Self {
        let telephony = FakeTelephony::new();
        let log = Arc::new(EffectLog::default());
        let ringtone = Arc::new(FakeRingtone::new(log.clone()));
        let vibrator = Arc::new(FakeVibrator::new(log.clone()));
        let notifications = Arc::new(FakeNotifications::new(log.clone()));
        let preferences = Arc::new(InMemoryPreferences::new());
        let lock = Arc::new(ToggleLock::default());
        lock.set(locked);

        let backends = AlertBackends {
            ringtone: ringtone.clone(),
            vibrator: vibrator.clone(),
            notifications: notifications.clone(),
            preferences: preferences.clone(),
            contacts: contacts.map(|c| c as Arc<dyn ContactPhotoLookup>),
        };

        let bridge = Arc::new(
            CallBridge::new(config, telephony.clone(), backends, lock.clone()).expect("valid test configuration"),
        );
        let events = bridge.subscribe_channel();

        Self {
            bridge,
            telephony,
            log,
            ringtone,
            vibrator,
            notifications,
            preferences,
            lock,
            events,
        }
    }

    /// Drain every event published so far
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn is_alerting(&self) -> bool {
        self.ringtone.is_playing() || self.vibrator.is_running()
    }
}

pub fn ringing_call(id: &str) -> RawCall {
    RawCall::new(CallHandle::new(id), raw::STATE_RINGING).with_number(CALLER)
}

pub fn outgoing_call(id: &str, number: &str) -> RawCall {
    RawCall::new(CallHandle::new(id), raw::STATE_DIALING)
        .with_number(number)
        .with_direction(CallDirection::Outgoing)
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
