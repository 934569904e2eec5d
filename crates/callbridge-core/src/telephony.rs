//! Telephony host capability interface
//!
//! The host platform owns calls. The core consumes it through
//! [`TelephonyAdapter`]: listener registration is synchronous so that a
//! replaced session's listener is gone before the next one is installed,
//! while commands are async like every other host round trip.
//!
//! Registrations are modelled as an owned resource. Registering returns a
//! [`CallbackRegistration`] that must be released exactly once; releasing
//! consumes it, and dropping an unreleased registration releases it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::call::CallHandle;
use crate::error::BridgeResult;

/// Token identifying one listener registration on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Media profile used when answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    AudioOnly,
}

/// Receives raw state changes for one call
pub trait CallStateListener: Send + Sync {
    fn on_state_changed(&self, handle: &CallHandle, raw_state: i32);
}

/// Host telephony capabilities consumed by the core
#[async_trait]
pub trait TelephonyAdapter: Send + Sync {
    /// Attach a state listener to a call
    fn register_state_listener(
        &self,
        handle: &CallHandle,
        listener: Arc<dyn CallStateListener>,
    ) -> ListenerToken;

    /// Detach a listener previously returned by `register_state_listener`
    fn unregister_state_listener(&self, handle: &CallHandle, token: ListenerToken);

    async fn answer(&self, handle: &CallHandle, video_state: VideoState) -> BridgeResult<()>;

    async fn reject(&self, handle: &CallHandle, with_message: bool) -> BridgeResult<()>;

    async fn disconnect(&self, handle: &CallHandle) -> BridgeResult<()>;

    async fn play_dtmf(&self, handle: &CallHandle, digit: char) -> BridgeResult<()>;

    async fn stop_dtmf(&self, handle: &CallHandle) -> BridgeResult<()>;

    /// Ask the host to place an outgoing call
    async fn place_call(&self, number: &str) -> BridgeResult<()>;
}

/// Owned listener registration for one call
pub struct CallbackRegistration {
    adapter: Arc<dyn TelephonyAdapter>,
    handle: CallHandle,
    token: Option<ListenerToken>,
}

impl CallbackRegistration {
    /// Register `listener` on `handle` and take ownership of the registration
    pub fn acquire(
        adapter: Arc<dyn TelephonyAdapter>,
        handle: CallHandle,
        listener: Arc<dyn CallStateListener>,
    ) -> Self {
        let token = adapter.register_state_listener(&handle, listener);
        tracing::debug!(call = %handle, %token, "Registered call state listener");
        Self {
            adapter,
            handle,
            token: Some(token),
        }
    }

    pub fn handle(&self) -> &CallHandle {
        &self.handle
    }

    pub fn token(&self) -> Option<ListenerToken> {
        self.token
    }

    /// Unregister the listener
    pub fn release(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if let Some(token) = self.token.take() {
            self.adapter.unregister_state_listener(&self.handle, token);
            tracing::debug!(call = %self.handle, %token, "Unregistered call state listener");
        }
    }
}

impl Drop for CallbackRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl fmt::Debug for CallbackRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistration")
            .field("handle", &self.handle)
            .field("token", &self.token)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingAdapter {
        next: AtomicU64,
        unregistered: Mutex<Vec<ListenerToken>>,
    }

    #[async_trait]
    impl TelephonyAdapter for CountingAdapter {
        fn register_state_listener(&self, _: &CallHandle, _: Arc<dyn CallStateListener>) -> ListenerToken {
            ListenerToken(self.next.fetch_add(1, Ordering::SeqCst))
        }
        fn unregister_state_listener(&self, _: &CallHandle, token: ListenerToken) {
            self.unregistered.lock().push(token);
        }
        async fn answer(&self, _: &CallHandle, _: VideoState) -> BridgeResult<()> { Ok(()) }
        async fn reject(&self, _: &CallHandle, _: bool) -> BridgeResult<()> { Ok(()) }
        async fn disconnect(&self, _: &CallHandle) -> BridgeResult<()> { Ok(()) }
        async fn play_dtmf(&self, _: &CallHandle, _: char) -> BridgeResult<()> { Ok(()) }
        async fn stop_dtmf(&self, _: &CallHandle) -> BridgeResult<()> { Ok(()) }
        async fn place_call(&self, _: &str) -> BridgeResult<()> { Ok(()) }
    }

    struct NoopListener;

    impl CallStateListener for NoopListener {
        fn on_state_changed(&self, _: &CallHandle, _: i32) {}
    }

    #[test]
    fn release_unregisters_once() {
        let adapter = Arc::new(CountingAdapter::default());
        let registration = CallbackRegistration::acquire(
            adapter.clone(),
            CallHandle::new("c1"),
            Arc::new(NoopListener),
        );
        registration.release();
        assert_eq!(*adapter.unregistered.lock(), vec![ListenerToken(0)]);
    }

    #[test]
    fn drop_releases_unreleased_registration() {
        let adapter = Arc::new(CountingAdapter::default());
        {
            let _registration = CallbackRegistration::acquire(
                adapter.clone(),
                CallHandle::new("c1"),
                Arc::new(NoopListener),
            );
        }
        assert_eq!(adapter.unregistered.lock().len(), 1);
    }
}
