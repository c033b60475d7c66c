//! Shutdown coordination.

use tokio::sync::watch;

/// One-shot shutdown signal shared by long-running tasks.
///
/// The fired state is retained, so a subscriber that joins after the trigger
/// still observes it. Dropping the `Shutdown` also releases every waiter.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn trigger(&self) -> bool {
        if self.tx.send_replace(true) {
            return false;
        }
        tracing::info!(receivers = self.tx.receiver_count(), "Shutdown triggered");
        true
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `shutdown` has fired or its sender is gone.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|fired| *fired).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers_once() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();

        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());

        wait_for_shutdown(&mut a).await;
        wait_for_shutdown(&mut b).await;
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        assert!(shutdown.trigger());

        let mut late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_millis(500), wait_for_shutdown(&mut late))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_releases_waiters() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);

        tokio::time::timeout(Duration::from_millis(500), wait_for_shutdown(&mut rx))
            .await
            .unwrap();
    }
}
