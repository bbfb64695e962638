//! Session change stream and the provider that consumes it.
//!
//! The [`SessionHub`] is the single writer: the auth client publishes every
//! sign-in, sign-out and restore through it. A [`SessionProvider`] is one
//! subscription to that stream, handed to whatever needs to know who is
//! signed in. Dropping the provider unsubscribes.

use std::sync::Arc;

use shared::Session;
use tokio::sync::watch;
use tracing::debug;

/// Publisher side of the session change stream
#[derive(Debug, Clone)]
pub struct SessionHub {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    /// Create a hub with no signed-in user
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current session and notify every subscriber
    pub fn publish(&self, session: Option<Session>) {
        debug!(
            signed_in = session.is_some(),
            subscribers = self.tx.receiver_count(),
            "Publishing session change"
        );
        self.tx.send_replace(session);
    }

    /// Latest published session
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Number of mounted providers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

/// Holds the current identity for the lifetime of one subscription
#[derive(Debug)]
pub struct SessionProvider {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionProvider {
    /// Subscribe to `hub`; the provider starts with the hub's current session
    pub fn mount(hub: &SessionHub) -> Self {
        Self { rx: hub.subscribe() }
    }

    /// Current session, if any
    pub fn session(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Current user id, if any
    pub fn user_id(&self) -> Option<String> {
        self.rx.borrow().as_ref().map(|s| s.user_id().to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the next notification and return the new session
    ///
    /// Returns `None` once the hub is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Tear down the subscription
    pub fn unmount(self) {
        debug!("Session provider unmounted");
    }
}
