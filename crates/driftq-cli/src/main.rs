//! Demo: enqueue actions while offline, come back online, watch the queue
//! drain against a submitter that fails a few times first.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::sleep;

use driftq_core::{
    ActionQueue, Connectivity, IdempotencyKey, MemoryStore, RetryPolicy, SubmitError, Submitter,
    TracingSink, TriggerConfig, TriggerLoop, WakeSignal,
};

/// Fails the first `n` submissions with a 503, then succeeds.
struct FlakySubmitter {
    remaining_failures: AtomicU32,
}

impl FlakySubmitter {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl Submitter for FlakySubmitter {
    async fn submit(
        &self,
        payload: &serde_json::Value,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), SubmitError> {
        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(SubmitError::server(503, format!("flaky backend (left={left})")));
        }

        tracing::info!(%payload, key = %idempotency_key, "submitted");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("driftq_core=debug,driftq_cli=info")),
        )
        .init();

    // (A) Wire a queue: in-memory store, flaky remote, short backoff so the
    // demo finishes quickly.
    let connectivity = Connectivity::new(false);
    let queue = Arc::new(
        ActionQueue::builder(
            "activity-bookings",
            Arc::new(MemoryStore::new()),
            Arc::new(FlakySubmitter::new(2)),
        )
        .connectivity(connectivity.clone())
        .retry_policy(RetryPolicy {
            base: Duration::from_millis(200),
            cap: Duration::from_secs(2),
            jitter: Duration::from_millis(50),
        })
        .telemetry(Arc::new(TracingSink))
        .build(),
    );

    // (B) Queue work while offline.
    queue
        .enqueue(serde_json::json!({ "activity": "kayaking", "guests": 2 }))
        .await;
    queue
        .enqueue(serde_json::json!({ "message": "late checkout please" }))
        .await;
    tracing::info!(counts = ?queue.counts().await, "offline");

    // (C) Start the trigger loop (periodic check + online transition +
    // background wakes).
    let (wake_tx, wake_rx) = mpsc::unbounded_channel::<WakeSignal>();
    let triggers = TriggerLoop::spawn(
        queue.clone(),
        wake_rx,
        TriggerConfig {
            interval: Some(Duration::from_millis(100)),
            flush_on_start: true,
        },
    );

    // (D) Connectivity returns; the backlog drains across a few retries.
    sleep(Duration::from_millis(300)).await;
    tracing::info!("going online");
    connectivity.set_online();

    // A background wake arriving later is harmlessly redundant.
    let _ = wake_tx.send(WakeSignal {
        namespace: "activity-bookings".into(),
    });

    loop {
        let counts = queue.counts().await;
        if counts.queued == 0 && counts.conflicted == 0 {
            tracing::info!(?counts, "drained");
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    triggers.shutdown_and_join().await;
}
