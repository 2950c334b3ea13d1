//! Flush engine and the per-namespace queue facade.
//!
//! `ActionQueue` owns one namespace of deferred work: callers enqueue
//! payloads (or try a direct submit with enqueue as the fallback), triggers
//! call `flush`, and the conflict-resolution surface reads and mutates
//! parked actions. All persisted-state edits route through the store's
//! `save`, and counts are recomputed from the stored list on demand.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::classify::{classify, Disposition};
use crate::connectivity::Connectivity;
use crate::domain::{
    ActionId, EventKind, IdempotencyKey, QueuedAction, SubmitError, TelemetryEvent,
};
use crate::ports::{
    Clock, IdGenerator, NoopRegistrar, NoopSink, QueueStore, Submitter, SystemClock,
    TelemetrySink, UlidGenerator, WakeRegistrar,
};
use crate::retry::RetryPolicy;

/// Queue sizes recomputed pull-based from the persisted list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Actions waiting for automatic retry.
    pub queued: usize,

    /// Actions parked on a conflict, waiting for the user.
    pub conflicted: usize,
}

/// Result of an online-first submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Delivered directly; nothing was queued.
    Submitted,

    /// Deferred: the device was offline or the direct attempt failed.
    Enqueued(ActionId),
}

/// Builder wiring an `ActionQueue` from its ports.
///
/// Store and submitter are mandatory; everything else defaults to the
/// production choices (system clock, ULID ids, contract backoff, online,
/// no-op telemetry and wake registration).
pub struct ActionQueueBuilder {
    namespace: String,
    store: Arc<dyn QueueStore>,
    submitter: Arc<dyn Submitter>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    policy: RetryPolicy,
    connectivity: Connectivity,
    wake: Arc<dyn WakeRegistrar>,
}

impl ActionQueueBuilder {
    pub fn new(
        namespace: impl Into<String>,
        store: Arc<dyn QueueStore>,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            store,
            submitter,
            telemetry: Arc::new(NoopSink),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            policy: RetryPolicy::default(),
            connectivity: Connectivity::default(),
            wake: Arc::new(NoopRegistrar),
        }
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn wake_registrar(mut self, wake: Arc<dyn WakeRegistrar>) -> Self {
        self.wake = wake;
        self
    }

    pub fn build(self) -> ActionQueue {
        ActionQueue {
            namespace: self.namespace,
            store: self.store,
            submitter: self.submitter,
            telemetry: self.telemetry,
            clock: self.clock,
            ids: self.ids,
            policy: self.policy,
            connectivity: self.connectivity,
            wake: self.wake,
            pass_guard: Mutex::new(()),
            edit_guard: Mutex::new(()),
        }
    }
}

/// A write-ahead queue for one namespace of deferred actions.
///
/// Lock discipline (the only concurrency control in the crate):
/// - `pass_guard` serializes flush passes; user retry/discard also take it
///   so they can never interleave with a running pass. A flush that finds
///   it taken coalesces to a no-op.
/// - `edit_guard` covers every load-modify-save on the store. `enqueue`
///   takes only this one, so enqueueing never waits on network I/O; the
///   pass merges anything appended mid-flight into its final save.
/// - Acquisition order is always pass then edit.
pub struct ActionQueue {
    namespace: String,
    store: Arc<dyn QueueStore>,
    submitter: Arc<dyn Submitter>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    policy: RetryPolicy,
    connectivity: Connectivity,
    wake: Arc<dyn WakeRegistrar>,
    pass_guard: Mutex<()>,
    edit_guard: Mutex<()>,
}

impl ActionQueue {
    pub fn builder(
        namespace: impl Into<String>,
        store: Arc<dyn QueueStore>,
        submitter: Arc<dyn Submitter>,
    ) -> ActionQueueBuilder {
        ActionQueueBuilder::new(namespace, store, submitter)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Append a new action to the persisted queue.
    ///
    /// The idempotency key is minted here and travels with every retry.
    /// Also registers best-effort background wake interest for the
    /// namespace.
    pub async fn enqueue(&self, payload: serde_json::Value) -> ActionId {
        let key = self.ids.next_idempotency_key();
        self.enqueue_with_key(payload, key).await
    }

    async fn enqueue_with_key(
        &self,
        payload: serde_json::Value,
        key: IdempotencyKey,
    ) -> ActionId {
        let action = QueuedAction::new(
            self.ids.next_action_id(),
            key,
            payload,
            self.clock.now(),
        );
        let id = action.id;

        {
            let _edit = self.edit_guard.lock().await;
            let mut actions = self.store.load(&self.namespace).await;
            actions.push(action);
            self.persist(&actions).await;
        }

        self.wake.register(&self.namespace);
        self.telemetry.record(
            TelemetryEvent::new(&self.namespace, EventKind::Queue, "queued")
                .with_meta(serde_json::json!({ "id": id.to_string() })),
        );
        tracing::debug!(namespace = %self.namespace, action = %id, "action queued");

        id
    }

    /// Online-first submission: try the remote call directly and fall back
    /// to the queue when offline or on failure.
    ///
    /// The idempotency key minted for the direct attempt is reused by the
    /// queued action, so the server can deduplicate even when the direct
    /// attempt succeeded but its response was lost.
    pub async fn submit_or_enqueue(&self, payload: serde_json::Value) -> SubmitOutcome {
        if !self.connectivity.is_online() {
            return SubmitOutcome::Enqueued(self.enqueue(payload).await);
        }

        let key = self.ids.next_idempotency_key();
        match self.submitter.submit(&payload, &key).await {
            Ok(()) => {
                self.telemetry.record(TelemetryEvent::new(
                    &self.namespace,
                    EventKind::Sync,
                    "submitted",
                ));
                SubmitOutcome::Submitted
            }
            Err(err) => {
                tracing::debug!(
                    namespace = %self.namespace,
                    error = %err,
                    "direct submit failed, queueing"
                );
                SubmitOutcome::Enqueued(self.enqueue_with_key(payload, key).await)
            }
        }
    }

    /// One pass over the queue: submit every due action in stored (FIFO)
    /// order, drop successes, reschedule or park failures, persist what
    /// remains.
    ///
    /// Always safe to call fire-and-forget: it swallows submission errors
    /// by contract and returns immediately when offline, when the queue is
    /// empty, or when another pass is already running (concurrent triggers
    /// coalesce).
    pub async fn flush(&self) {
        let Ok(_pass) = self.pass_guard.try_lock() else {
            tracing::debug!(namespace = %self.namespace, "flush already running, coalesced");
            return;
        };

        if !self.connectivity.is_online() {
            return;
        }

        let snapshot = self.store.load(&self.namespace).await;
        if snapshot.is_empty() {
            return;
        }

        let now = self.clock.now();
        let snapshot_ids: HashSet<ActionId> = snapshot.iter().map(|a| a.id).collect();
        let mut remaining = Vec::with_capacity(snapshot.len());

        for mut action in snapshot {
            // Not yet due, or parked on a conflict: keep in place so the
            // relative order survives into the next pass.
            if !action.is_due(now) {
                remaining.push(action);
                continue;
            }

            // Sequential on purpose: actions from one namespace may depend
            // on each other (two messages in one conversation).
            match self
                .submitter
                .submit(&action.payload, &action.idempotency_key)
                .await
            {
                Ok(()) => {
                    self.telemetry.record(
                        TelemetryEvent::new(&self.namespace, EventKind::Sync, "submitted")
                            .with_meta(serde_json::json!({
                                "id": action.id.to_string(),
                                "attempt": action.attempt,
                            })),
                    );
                    tracing::debug!(namespace = %self.namespace, action = %action.id, "submitted");
                    // Confirmed success: the one non-user path that removes
                    // an action.
                }
                Err(err) => {
                    self.handle_failure(&mut action, err, now);
                    remaining.push(action);
                }
            }
        }

        self.persist_after_pass(remaining, snapshot_ids).await;
    }

    fn handle_failure(&self, action: &mut QueuedAction, err: SubmitError, now: DateTime<Utc>) {
        let conflict = classify(&err) == Disposition::Conflict;
        let delay = self.policy.next_delay(action.attempt + 1);
        let next_attempt_at = now + to_chrono(delay);
        action.record_failure(err.to_string(), conflict, next_attempt_at);

        let (kind, status) = if conflict {
            (EventKind::Conflict, "conflict")
        } else {
            (EventKind::Error, "failed")
        };
        self.telemetry.record(
            TelemetryEvent::new(&self.namespace, kind, status)
                .with_message(err.to_string())
                .with_meta(serde_json::json!({
                    "id": action.id.to_string(),
                    "attempt": action.attempt,
                    "next_attempt_at": action.next_attempt_at.to_rfc3339(),
                })),
        );
        tracing::debug!(
            namespace = %self.namespace,
            action = %action.id,
            attempt = action.attempt,
            conflict,
            error = %err,
            "submission failed"
        );
    }

    /// Final persist of a pass: merge in actions enqueued after the
    /// snapshot was taken so they are not lost to the wholesale rewrite.
    async fn persist_after_pass(
        &self,
        mut remaining: Vec<QueuedAction>,
        snapshot_ids: HashSet<ActionId>,
    ) {
        let _edit = self.edit_guard.lock().await;
        let current = self.store.load(&self.namespace).await;
        let appended = current
            .into_iter()
            .filter(|a| !snapshot_ids.contains(&a.id));
        remaining.extend(appended);

        let drained = remaining.is_empty();
        self.persist(&remaining).await;

        if drained {
            self.telemetry.record(TelemetryEvent::new(
                &self.namespace,
                EventKind::Sync,
                "drained",
            ));
            tracing::debug!(namespace = %self.namespace, "queue fully flushed");
        }
    }

    async fn persist(&self, actions: &[QueuedAction]) {
        if let Err(err) = self.store.save(&self.namespace, actions).await {
            tracing::warn!(namespace = %self.namespace, error = %err, "failed to persist queue");
            self.telemetry.record(
                TelemetryEvent::new(&self.namespace, EventKind::Cache, "save_failed")
                    .with_message(err.to_string()),
            );
        }
    }

    /// Queued/conflicted sizes, recomputed from the persisted list.
    pub async fn counts(&self) -> QueueCounts {
        let actions = self.store.load(&self.namespace).await;
        let conflicted = actions.iter().filter(|a| a.conflict).count();
        QueueCounts {
            queued: actions.len() - conflicted,
            conflicted,
        }
    }

    /// The full persisted list, in stored order.
    pub async fn actions(&self) -> Vec<QueuedAction> {
        self.store.load(&self.namespace).await
    }

    /// Actions parked on a conflict, awaiting user resolution.
    pub async fn list_conflicts(&self) -> Vec<QueuedAction> {
        self.store
            .load(&self.namespace)
            .await
            .into_iter()
            .filter(|a| a.conflict)
            .collect()
    }

    /// User-initiated retry of a conflicted action: clears the flag, makes
    /// the action immediately due, and runs a flush. Returns false when the
    /// id is not in the queue, or names an action that is not conflicted —
    /// pending actions keep their backoff schedule and are not user-editable.
    pub async fn retry(&self, id: ActionId) -> bool {
        let found = {
            let _pass = self.pass_guard.lock().await;
            let _edit = self.edit_guard.lock().await;
            let mut actions = self.store.load(&self.namespace).await;
            let Some(action) = actions.iter_mut().find(|a| a.id == id && a.conflict) else {
                return false;
            };
            action.reset_for_retry(self.clock.now());
            self.persist(&actions).await;
            true
        };

        self.telemetry.record(
            TelemetryEvent::new(&self.namespace, EventKind::Sync, "retry_requested")
                .with_meta(serde_json::json!({ "id": id.to_string() })),
        );
        self.flush().await;
        found
    }

    /// Remove an action unconditionally. Idempotent: discarding an absent
    /// id returns false and never errors.
    ///
    /// Waits for a running pass, so it cannot race the store rewrite; it
    /// cannot, however, recall a submission already on the wire. If that
    /// submission succeeds the pass removes the action anyway and this
    /// becomes a no-op.
    pub async fn discard(&self, id: ActionId) -> bool {
        let _pass = self.pass_guard.lock().await;
        let _edit = self.edit_guard.lock().await;
        let mut actions = self.store.load(&self.namespace).await;
        let before = actions.len();
        actions.retain(|a| a.id != id);
        if actions.len() == before {
            return false;
        }
        self.persist(&actions).await;

        self.telemetry.record(
            TelemetryEvent::new(&self.namespace, EventKind::Queue, "discarded")
                .with_meta(serde_json::json!({ "id": id.to_string() })),
        );
        true
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis().min(i64::MAX as u128) as i64)
}
