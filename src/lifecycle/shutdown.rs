//! Shutdown coordination for the server.

use std::future::Future;

use tokio::sync::watch;

/// Latching shutdown flag shared by the signal handler and the runner.
///
/// Once triggered it stays triggered, so late waiters resolve immediately.
#[derive(Clone)]
pub struct Shutdown {
    stopping: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stopping, _) = watch::channel(false);
        Self { stopping }
    }

    /// Future resolving once [`trigger`](Self::trigger) has been called.
    ///
    /// If every coordinator is dropped without triggering, nothing can stop
    /// the server any more and the future stays pending.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.stopping.subscribe();
        async move {
            if rx.wait_for(|stopping| *stopping).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Begin graceful shutdown. Repeated calls are no-ops.
    pub fn trigger(&self) {
        self.stopping.send_if_modified(|stopping| !std::mem::replace(stopping, true));
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopping.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn waiter_observes_trigger() {
        let shutdown = Shutdown::new();
        let waiter = tokio::spawn(shutdown.signalled());

        shutdown.clone().trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("shutdown not observed")
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn late_waiter_resolves_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), shutdown.signalled())
            .await
            .expect("late waiter must not block");
    }

    #[tokio::test]
    async fn dropped_coordinator_does_not_stop_waiters() {
        let waiter = Shutdown::new().signalled();

        let outcome = tokio::time::timeout(Duration::from_millis(50), waiter).await;
        assert!(outcome.is_err(), "waiter resolved without a trigger");
    }
}
