//! QueueStore port: durable, per-namespace persisted queue.
//!
//! `save` is the single state-mutation choke point: the flush engine and
//! user-initiated retry/discard all route their edits through it, and
//! consumers recompute queued/conflicted counts from the written list
//! (pull-based, no change events).

use async_trait::async_trait;

use crate::domain::{QueuedAction, StoreError};

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load the persisted list for a namespace, in stored order.
    ///
    /// A missing or corrupt persisted value loads as an empty list by
    /// contract; implementations report corruption to telemetry but never
    /// surface it to the caller.
    async fn load(&self, namespace: &str) -> Vec<QueuedAction>;

    /// Overwrite the persisted list for a namespace.
    ///
    /// Atomic from the reader's perspective: a concurrent `load` observes
    /// either the prior list or the new one, never a partial write.
    async fn save(&self, namespace: &str, actions: &[QueuedAction]) -> Result<(), StoreError>;
}
