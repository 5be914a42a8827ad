//! Unauthorized propagation hook.
//!
//! The API client cannot depend on the session layer, so session teardown
//! is announced through a registered callback instead. The session manager
//! installs its handler at construction; anything above it (UI state,
//! navigation) reacts from there.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

type Handler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Registration point for the session-expired notification.
///
/// Holds at most one handler; registering again replaces the previous
/// one. Notifying with no handler installed is a no-op.
#[derive(Default)]
pub struct UnauthorizedSlot {
    handler: Mutex<Option<Handler>>,
}

impl UnauthorizedSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler invoked when a session is torn down.
    pub fn on_unauthorized<F>(&self, handler: F)
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        *self.handler.lock() = Some(Arc::new(handler));
    }

    /// Remove the installed handler, if any.
    pub fn clear(&self) {
        *self.handler.lock() = None;
    }

    /// Invoke the handler and wait for it to finish.
    ///
    /// The handler is cloned out of the lock before awaiting so a handler
    /// that re-registers (or clears) the slot cannot deadlock.
    pub async fn notify(&self) {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => handler().await,
            None => debug!("session expired with no unauthorized handler installed"),
        }
    }
}

impl std::fmt::Debug for UnauthorizedSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnauthorizedSlot")
            .field("installed", &self.handler.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn notify_without_handler_is_noop() {
        let slot = UnauthorizedSlot::new();
        slot.notify().await;
    }

    #[tokio::test]
    async fn notify_runs_installed_handler() {
        let slot = UnauthorizedSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        slot.on_unauthorized(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });

        slot.notify().await;
        slot.notify().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reinstalling_replaces_previous_handler() {
        let slot = UnauthorizedSlot::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        slot.on_unauthorized(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        let counter = second.clone();
        slot.on_unauthorized(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });

        slot.notify().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cleared_handler_is_not_invoked() {
        let slot = UnauthorizedSlot::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        slot.on_unauthorized(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        slot.clear();

        slot.notify().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
