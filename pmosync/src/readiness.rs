//! One-shot readiness signal.
//!
//! The players of a channel set become usable at some point after start-up.
//! [`readiness`] returns the two halves of a signal that fires once: every
//! sync loop waits on a [`ReadySignal`] clone before its first tick.

use crate::error::{Result, SyncError};
use tokio::sync::watch;

/// Sending half, consumed by [`Readiness::signal`].
#[derive(Debug)]
pub struct Readiness {
    tx: watch::Sender<bool>,
}

/// Waiting half, cheap to clone.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<bool>,
}

/// Creates a new, not yet fired, readiness signal.
pub fn readiness() -> (Readiness, ReadySignal) {
    let (tx, rx) = watch::channel(false);
    (Readiness { tx }, ReadySignal { rx })
}

impl Readiness {
    /// Fires the signal. Waiters created later see it immediately.
    pub fn signal(self) {
        self.tx.send_replace(true);
    }

    /// Another waiting half.
    pub fn subscribe(&self) -> ReadySignal {
        ReadySignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ReadySignal {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal fires.
    ///
    /// Fails if the sending half is dropped without firing.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(|ready| *ready).await.map(|_| ());
        result.map_err(|_| SyncError::capability("player never became ready"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_after_signal() {
        let (ready, signal) = readiness();
        assert!(!signal.is_ready());
        ready.signal();
        assert!(signal.is_ready());
        signal.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_all_waiters_wake_up() {
        let (ready, signal) = readiness();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let signal = signal.clone();
                tokio::spawn(async move { signal.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        ready.signal();

        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_dropped_sender_fails() {
        let (ready, signal) = readiness();
        drop(ready);
        assert!(matches!(signal.wait().await, Err(SyncError::Capability(_))));
    }
}
