use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Fan-out point for "the shared record set changed" signals.
///
/// Signals carry no payload. Subscribers only learn that they must refetch.
#[derive(Debug, Clone)]
pub struct InvalidationHub {
    tx: broadcast::Sender<()>,
}

impl Default for InvalidationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn sender(&self) -> broadcast::Sender<()> {
        self.tx.clone()
    }

    /// Broadcast one signal. Returns how many subscribers were reached.
    pub fn signal(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// One board view's standing subscription. Dropping it tears it down.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<()>,
}

impl Subscription {
    /// Drain every queued signal without blocking.
    ///
    /// Any number of queued signals, including an overflowed queue, collapse
    /// into a single `true`: one refetch covers them all.
    pub fn take_pending(&mut self) -> bool {
        let mut any = false;
        loop {
            match self.rx.try_recv() {
                Ok(()) => any = true,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "invalidation queue overflowed");
                    any = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        any
    }

    /// Wait for the next signal. Returns `false` once the hub is gone.
    pub async fn recv(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => true,
            Err(RecvError::Closed) => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("invalidation subscription closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_coalesce() {
        let hub = InvalidationHub::new();
        let mut sub = hub.subscribe();
        assert!(!sub.take_pending());
        assert_eq!(hub.signal(), 1);
        hub.signal();
        hub.signal();
        assert!(sub.take_pending());
        assert!(!sub.take_pending());
    }

    #[test]
    fn overflow_still_reports_change() {
        let hub = InvalidationHub::new();
        let mut sub = hub.subscribe();
        for _ in 0..200 {
            hub.signal();
        }
        assert!(sub.take_pending());
        assert!(!sub.take_pending());
    }

    #[test]
    fn signal_without_subscribers_is_harmless() {
        let hub = InvalidationHub::new();
        assert_eq!(hub.signal(), 0);
    }

    #[test]
    fn dropped_subscription_stops_counting() {
        let hub = InvalidationHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.tx.receiver_count(), 1);
        drop(sub);
        assert_eq!(hub.tx.receiver_count(), 0);
    }

    #[tokio::test]
    async fn recv_wakes_on_signal() {
        let hub = InvalidationHub::new();
        let mut sub = hub.subscribe();
        let tx = hub.sender();
        tokio::spawn(async move {
            let _ = tx.send(());
        });
        assert!(sub.recv().await);
    }
}
