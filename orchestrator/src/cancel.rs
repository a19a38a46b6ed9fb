//! User abandonment of a pending signature request.
//!
//! Only the `AwaitingSignature` step listens for abandonment. Once a
//! transaction is broadcast it can only be awaited or timed out.

use tokio::sync::watch;

/// Held by the UI; call [`AbandonHandle::abandon`] when the user closes the
/// signer prompt.
#[derive(Debug)]
pub struct AbandonHandle {
    tx: watch::Sender<bool>,
}

impl AbandonHandle {
    pub fn abandon(&self) {
        let _ = self.tx.send(true);
    }
}

/// Passed to the orchestrator alongside the transaction.
#[derive(Debug, Clone)]
pub struct AbandonSignal {
    rx: watch::Receiver<bool>,
}

impl AbandonSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_abandoned(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the user abandons. Pends forever if the handle is dropped
    /// without abandoning.
    pub async fn abandoned(&mut self) {
        if self.rx.wait_for(|abandoned| *abandoned).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a connected handle and signal.
pub fn abandon_pair() -> (AbandonHandle, AbandonSignal) {
    let (tx, rx) = watch::channel(false);
    (AbandonHandle { tx }, AbandonSignal { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn abandon_resolves_signal() {
        let (handle, mut signal) = abandon_pair();
        handle.abandon();
        tokio::time::timeout(Duration::from_secs(1), signal.abandoned())
            .await
            .expect("signal should resolve");
        assert!(signal.is_abandoned());
    }

    #[tokio::test(start_paused = true)]
    async fn never_signal_pends() {
        let mut signal = AbandonSignal::never();
        let result = tokio::time::timeout(Duration::from_secs(5), signal.abandoned()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_pends() {
        let (handle, mut signal) = abandon_pair();
        drop(handle);
        let result = tokio::time::timeout(Duration::from_secs(5), signal.abandoned()).await;
        assert!(result.is_err());
    }
}
