//! Single-write boolean latch used to coordinate trace sessions.
//!
//! A [`Signal`] starts unfired; [`fire`][Signal::fire] flips it exactly once
//! and it stays fired. Clones share state, so a caller can hand the same
//! latch to several observers. Waiters that arrive after the fire return
//! immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Signal {
    tx: Arc<watch::Sender<bool>>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the latch. Returns `true` for the call that actually flipped it;
    /// later calls are no-ops.
    pub fn fire(&self) -> bool {
        let mut flipped = false;
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                flipped = true;
                true
            }
        });
        flipped
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the latch fires.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives inside self, so the channel cannot close while we
        // hold &self.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// Wait up to `timeout` for the latch. Returns `true` if it fired,
    /// `false` if the timeout elapsed first.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
