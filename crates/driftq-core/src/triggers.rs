//! Connectivity and wake triggers: everything that can start a flush.
//!
//! Four independent event sources feed one coalescing consumer, and none of
//! them is assumed reliable alone:
//! - offline → online transitions of the shared `Connectivity` state;
//! - best-effort `WakeSignal`s relayed from the host's background-sync
//!   facility (may never fire on some platforms);
//! - a periodic foreground interval;
//! - an initial check at spawn, so actions queued in a prior session are
//!   not stranded waiting for a transition that already happened.
//!
//! The consumer just calls `ActionQueue::flush`, which is fire-and-forget
//! and self-coalescing, so redundant triggers are harmless by construction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

use crate::flush::ActionQueue;
use crate::ports::WakeSignal;

/// Tuning for the trigger loop.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Foreground periodic flush. `None` disables the ticker.
    pub interval: Option<Duration>,

    /// Flush once at spawn when already online.
    pub flush_on_start: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_secs(30)),
            flush_on_start: true,
        }
    }
}

/// Handle to the spawned trigger worker.
///
/// Dropping the handle stops the worker (the shutdown channel closes);
/// `shutdown_and_join` additionally waits for it to finish.
pub struct TriggerLoop {
    shutdown_tx: watch::Sender<bool>,
    notify: Arc<Notify>,
    join: JoinHandle<()>,
}

impl TriggerLoop {
    /// Spawn the worker. `wakes` is the receiving end of the channel the
    /// host shell forwards background wake messages into.
    pub fn spawn(
        queue: Arc<ActionQueue>,
        wakes: mpsc::UnboundedReceiver<WakeSignal>,
        config: TriggerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let notify = Arc::new(Notify::new());

        let join = tokio::spawn(run(queue, wakes, config, shutdown_rx, Arc::clone(&notify)));

        Self {
            shutdown_tx,
            notify,
            join,
        }
    }

    /// Ask for a flush outside the built-in sources (e.g. after a user
    /// retry from the conflicts screen).
    pub fn request_flush(&self) {
        self.notify.notify_one();
    }

    /// Stop taking triggers. Does not cancel a submission already in
    /// flight; the running pass finishes first.
    pub fn request_shutdown(&self) {
        // ignore send error: the worker may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn run(
    queue: Arc<ActionQueue>,
    mut wakes: mpsc::UnboundedReceiver<WakeSignal>,
    config: TriggerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
    notify: Arc<Notify>,
) {
    let mut online_rx = queue.connectivity().subscribe();
    let mut was_online = *online_rx.borrow_and_update();

    if config.flush_on_start && was_online {
        queue.flush().await;
    }

    let mut ticker = config.interval.map(|period| {
        // interval() fires immediately; the initial check above already
        // covers start-up, so push the first tick out by one period.
        tokio::time::interval_at(tokio::time::Instant::now() + period, period)
    });
    let mut wakes_open = true;
    let mut online_open = true;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break; // handle dropped
                }
            }
            _ = notify.notified() => queue.flush().await,
            changed = online_rx.changed(), if online_open => {
                if changed.is_err() {
                    online_open = false;
                    continue;
                }
                let online = *online_rx.borrow_and_update();
                let came_online = online && !was_online;
                was_online = online;
                if came_online {
                    tracing::debug!(namespace = %queue.namespace(), "connectivity regained");
                    queue.flush().await;
                }
            }
            wake = wakes.recv(), if wakes_open => {
                match wake {
                    Some(signal) if signal.namespace == queue.namespace() => {
                        tracing::debug!(namespace = %queue.namespace(), "background wake received");
                        queue.flush().await;
                    }
                    Some(_) => {} // wake for another namespace's queue
                    None => wakes_open = false,
                }
            }
            _ = next_tick(&mut ticker) => queue.flush().await,
        }
    }
}

async fn next_tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::connectivity::Connectivity;
    use crate::domain::{IdempotencyKey, SubmitError};
    use crate::ports::Submitter;
    use crate::store::MemoryStore;

    struct OkSubmitter;

    #[async_trait]
    impl Submitter for OkSubmitter {
        async fn submit(
            &self,
            _payload: &serde_json::Value,
            _idempotency_key: &IdempotencyKey,
        ) -> Result<(), SubmitError> {
            Ok(())
        }
    }

    fn queue(online: bool) -> Arc<ActionQueue> {
        Arc::new(
            ActionQueue::builder("bookings", Arc::new(MemoryStore::new()), Arc::new(OkSubmitter))
                .connectivity(Connectivity::new(online))
                .build(),
        )
    }

    async fn wait_for_drain(queue: &Arc<ActionQueue>) {
        for _ in 0..200 {
            if queue.actions().await.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("queue never drained: {:?}", queue.actions().await);
    }

    fn no_builtin_triggers() -> TriggerConfig {
        TriggerConfig {
            interval: None,
            flush_on_start: false,
        }
    }

    #[tokio::test]
    async fn initial_check_drains_a_prior_session_backlog() {
        let queue = queue(true);
        queue.enqueue(serde_json::json!({"note": "stale"})).await;

        let (_wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(
            queue.clone(),
            wake_rx,
            TriggerConfig {
                interval: None,
                flush_on_start: true,
            },
        );

        wait_for_drain(&queue).await;
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn coming_online_triggers_a_flush() {
        let queue = queue(false);
        queue.enqueue(serde_json::json!({"note": "offline"})).await;

        let (_wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(queue.clone(), wake_rx, TriggerConfig::default());

        // Still offline: nothing should move.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.actions().await.len(), 1);

        queue.connectivity().set_online();
        wait_for_drain(&queue).await;
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn background_wake_triggers_a_flush() {
        let queue = queue(true);
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(queue.clone(), wake_rx, no_builtin_triggers());

        queue.enqueue(serde_json::json!({"note": "woken"})).await;
        wake_tx
            .send(WakeSignal {
                namespace: "bookings".into(),
            })
            .unwrap();

        wait_for_drain(&queue).await;
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn wake_for_another_namespace_is_ignored() {
        let queue = queue(true);
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(queue.clone(), wake_rx, no_builtin_triggers());

        queue.enqueue(serde_json::json!({"note": "mine"})).await;
        wake_tx
            .send(WakeSignal {
                namespace: "someone-elses".into(),
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.actions().await.len(), 1);
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn periodic_interval_flushes() {
        let queue = queue(true);
        let (_wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(
            queue.clone(),
            wake_rx,
            TriggerConfig {
                interval: Some(Duration::from_millis(50)),
                flush_on_start: false,
            },
        );

        queue.enqueue(serde_json::json!({"note": "tick"})).await;
        wait_for_drain(&queue).await;
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn manual_request_flush_works() {
        let queue = queue(true);
        let (_wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(queue.clone(), wake_rx, no_builtin_triggers());

        queue.enqueue(serde_json::json!({"note": "manual"})).await;
        triggers.request_flush();

        wait_for_drain(&queue).await;
        triggers.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn shutdown_joins_cleanly() {
        let queue = queue(true);
        let (_wake_tx, wake_rx) = mpsc::unbounded_channel();
        let triggers = TriggerLoop::spawn(queue.clone(), wake_rx, TriggerConfig::default());

        tokio::time::timeout(Duration::from_secs(1), triggers.shutdown_and_join())
            .await
            .expect("shutdown should not hang");
    }
}
