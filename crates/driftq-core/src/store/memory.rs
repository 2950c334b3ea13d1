//! In-memory store, namespaced like the durable one.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{QueuedAction, StoreError};
use crate::ports::QueueStore;

/// In-memory `QueueStore` for tests and development.
///
/// One `Vec<QueuedAction>` per namespace behind a single lock; the lock is
/// never held across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    queues: Mutex<HashMap<String, Vec<QueuedAction>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn load(&self, namespace: &str) -> Vec<QueuedAction> {
        self.queues
            .lock()
            .ok()
            .and_then(|queues| queues.get(namespace).cloned())
            .unwrap_or_default()
    }

    async fn save(&self, namespace: &str, actions: &[QueuedAction]) -> Result<(), StoreError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| StoreError::Other("store lock poisoned".into()))?;
        queues.insert(namespace.to_string(), actions.to_vec());
        Ok(())
    }
}
