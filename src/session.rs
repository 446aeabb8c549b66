//! Signed-in user, published over a watch channel.
//!
//! Consumers subscribe to the channel instead of registering callbacks;
//! the returned [`Subscription`] stops the consumer when dropped.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Source of truth for who is signed in.
#[derive(Debug)]
pub struct SessionChannel {
    tx: watch::Sender<Option<String>>,
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionChannel {
    /// Channel with nobody signed in.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Bind `user_id` as the signed-in user.
    pub fn sign_in(&self, user_id: &str) {
        self.tx.send_replace(Some(user_id.to_string()));
    }

    /// Clear the signed-in user.
    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// Currently signed-in user.
    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    /// Receive every change of the signed-in user.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

/// Handle to a background consumer. Dropping it stops the consumer.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Wrap a spawned consumer task.
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stop the consumer now.
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Whether the consumer has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
