//! File-backed store: one JSON file per namespace.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{EventKind, QueuedAction, StoreError, TelemetryEvent};
use crate::ports::{NoopSink, QueueStore, TelemetrySink};

/// Durable `QueueStore` writing one JSON file per namespace under a root
/// directory.
///
/// - A missing file loads as an empty queue.
/// - An unparsable file loads as an empty queue and is recorded to
///   telemetry as a `cache` event; it is never surfaced to the caller.
/// - `save` writes a sibling temp file and renames it over the target, so a
///   concurrent `load` never observes a partial write.
pub struct FileStore {
    root: PathBuf,
    telemetry: Arc<dyn TelemetrySink>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_telemetry(root, Arc::new(NoopSink))
    }

    pub fn with_telemetry(root: impl Into<PathBuf>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            root: root.into(),
            telemetry,
        }
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        // Namespaces are caller-chosen; keep them filesystem-safe. The
        // escaping is injective (`_` escapes itself), so distinct
        // namespaces never share a file.
        let mut file = String::with_capacity(namespace.len());
        for byte in namespace.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => file.push(byte as char),
                _ => {
                    use std::fmt::Write;
                    let _ = write!(file, "_{byte:02x}");
                }
            }
        }
        self.root.join(format!("{file}.json"))
    }
}

fn read_actions(path: &Path) -> Result<Option<Vec<QueuedAction>>, StoreError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let actions = serde_json::from_str(&json)?;
    Ok(Some(actions))
}

fn write_actions(path: &Path, actions: &[QueuedAction]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec(actions)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl QueueStore for FileStore {
    async fn load(&self, namespace: &str) -> Vec<QueuedAction> {
        let path = self.path_for(namespace);
        let namespace = namespace.to_string();
        let telemetry = Arc::clone(&self.telemetry);

        let loaded = tokio::task::spawn_blocking(move || match read_actions(&path) {
            Ok(actions) => actions.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(namespace = %namespace, error = %e, "corrupt persisted queue, loading as empty");
                telemetry.record(
                    TelemetryEvent::new(&namespace, EventKind::Cache, "corrupt")
                        .with_message(e.to_string()),
                );
                Vec::new()
            }
        })
        .await;

        loaded.unwrap_or_default()
    }

    async fn save(&self, namespace: &str, actions: &[QueuedAction]) -> Result<(), StoreError> {
        let path = self.path_for(namespace);
        let actions = actions.to_vec();

        tokio::task::spawn_blocking(move || write_actions(&path, &actions))
            .await
            .map_err(|e| StoreError::Other(format!("save task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ulid::Ulid;

    use crate::domain::{ActionId, IdempotencyKey};
    use crate::ports::MemorySink;

    fn action(note: &str) -> QueuedAction {
        QueuedAction::new(
            ActionId::from_ulid(Ulid::new()),
            IdempotencyKey::from_ulid(Ulid::new()),
            serde_json::json!({ "note": note }),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("bookings").await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut failing = action("b");
        failing.record_failure("http 500", false, Utc::now() + chrono::Duration::seconds(2));
        let actions = vec![action("a"), failing, action("c")];

        store.save("bookings", &actions).await.unwrap();
        assert_eq!(store.load("bookings").await, actions);
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty_and_records_telemetry() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let store = FileStore::with_telemetry(dir.path(), sink.clone());

        std::fs::write(dir.path().join("bookings.json"), "not json{{{").unwrap();

        assert!(store.load("bookings").await.is_empty());

        let events = sink.events_of_kind(EventKind::Cache);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, "corrupt");
    }

    #[tokio::test]
    async fn save_replaces_the_prior_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("ns", &[action("old"), action("older")]).await.unwrap();
        let replacement = vec![action("new")];
        store.save("ns", &replacement).await.unwrap();

        assert_eq!(store.load("ns").await, replacement);
    }

    #[tokio::test]
    async fn namespaces_map_to_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let bookings = vec![action("book")];
        let messages = vec![action("msg")];
        store.save("activity-bookings", &bookings).await.unwrap();
        store.save("guest-messages", &messages).await.unwrap();

        assert_eq!(store.load("activity-bookings").await, bookings);
        assert_eq!(store.load("guest-messages").await, messages);
    }

    #[tokio::test]
    async fn lookalike_namespaces_do_not_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let dotted = vec![action("dotted")];
        let underscored = vec![action("underscored")];
        store.save("a.b", &dotted).await.unwrap();
        store.save("a_b", &underscored).await.unwrap();

        assert_eq!(store.load("a.b").await, dotted);
        assert_eq!(store.load("a_b").await, underscored);
    }
}
