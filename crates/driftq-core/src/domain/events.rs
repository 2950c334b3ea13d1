//! Telemetry events: append-only lifecycle records for later inspection.

use serde::{Deserialize, Serialize};

/// Coarse category of a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Queue mutations: enqueued, discarded.
    Queue,

    /// Flush outcomes: submitted, retried, drained.
    Sync,

    /// Retryable submission failures.
    Error,

    /// Failures classified as true conflicts.
    Conflict,

    /// Local persisted-state anomalies (e.g. corrupt queue loaded as empty).
    Cache,
}

/// One recorded lifecycle event.
///
/// Fire-and-forget by contract: recording never blocks or fails the caller,
/// so the fields stay cheap to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Where the event came from (usually the queue namespace).
    pub source: String,

    pub kind: EventKind,

    /// Short machine-friendly status, e.g. "queued", "submitted", "failed".
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Free-form structured context (action id, attempt count, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl TelemetryEvent {
    pub fn new(source: impl Into<String>, kind: EventKind, status: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            status: status.into(),
            message: None,
            meta: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }
}
