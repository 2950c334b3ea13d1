//! TelemetrySink port: append-only recorder of lifecycle events.
//!
//! Fire-and-forget: `record` never blocks and never fails the caller.
//! Implementations that ship events elsewhere must buffer or drop
//! internally.

use std::sync::Mutex;

use crate::domain::{EventKind, TelemetryEvent};

pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Captures events in memory for inspection, mainly in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_of_kind(&self, kind: EventKind) -> Vec<TelemetryEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: TelemetryEvent) {
        match event.kind {
            EventKind::Error | EventKind::Conflict | EventKind::Cache => tracing::warn!(
                source = %event.source,
                kind = ?event.kind,
                status = %event.status,
                message = event.message.as_deref().unwrap_or(""),
                "queue event"
            ),
            EventKind::Queue | EventKind::Sync => tracing::debug!(
                source = %event.source,
                kind = ?event.kind,
                status = %event.status,
                "queue event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.record(TelemetryEvent::new("ns", EventKind::Queue, "queued"));
        sink.record(TelemetryEvent::new("ns", EventKind::Sync, "submitted"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, "queued");
        assert_eq!(events[1].status, "submitted");
    }

    #[test]
    fn memory_sink_filters_by_kind() {
        let sink = MemorySink::new();
        sink.record(TelemetryEvent::new("ns", EventKind::Queue, "queued"));
        sink.record(TelemetryEvent::new("ns", EventKind::Conflict, "conflict"));

        let conflicts = sink.events_of_kind(EventKind::Conflict);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].status, "conflict");
    }
}
