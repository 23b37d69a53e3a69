//! Cancellation signal shared by network calls, backoff sleeps and scans
//!
//! The signal is a `tokio::sync::watch` receiver that flips to `true` once.
//! Every suspension point selects on [`ShutdownSignal::cancelled`] so that an
//! in-flight wait returns promptly with [`DocsiftError::Cancelled`].

use super::errors::DocsiftError;
use super::result::Result;
use tokio::sync::watch;

/// Cloneable view of a cancellation channel
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wrap an existing receiver
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Create a signal together with the sender that triggers it
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Return `Err(Cancelled)` if cancellation has been requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(DocsiftError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation is requested
    ///
    /// If the sender is dropped without ever firing, this never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_fires() {
        let (tx, signal) = ShutdownSignal::channel();
        assert!(!signal.is_cancelled());
        assert!(signal.check().is_ok());

        tx.send(true).unwrap();
        assert!(signal.is_cancelled());
        assert!(matches!(signal.check(), Err(DocsiftError::Cancelled)));

        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .expect("cancelled() should resolve after the signal fires");
    }

    #[tokio::test]
    async fn test_never_signal_stays_pending() {
        let signal = ShutdownSignal::never();
        let waited = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let (tx, signal) = ShutdownSignal::channel();
        drop(tx);
        let waited = tokio::time::timeout(Duration::from_millis(50), signal.cancelled()).await;
        assert!(waited.is_err());
        assert!(!signal.is_cancelled());
    }
}
