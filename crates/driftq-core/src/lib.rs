//! driftq-core
//!
//! A client-resident write-ahead queue for unreliable networks: actions
//! performed while offline are persisted per namespace and reconciled with
//! a remote service once connectivity returns, with exponential backoff for
//! transient failures and explicit surfacing of true conflicts.
//!
//! # Module layout
//! - **domain**: ids, the `QueuedAction` record, tagged submit errors,
//!   telemetry events
//! - **ports**: trait seams (`QueueStore`, `Submitter`, `Clock`,
//!   `IdGenerator`, `TelemetrySink`, `WakeRegistrar`)
//! - **store**: `QueueStore` implementations (in-memory, file-backed)
//! - **retry / classify**: backoff policy and conflict classification
//! - **flush**: the `ActionQueue` facade and flush engine
//! - **connectivity / triggers**: online state and the flush trigger loop

pub mod classify;
pub mod connectivity;
pub mod domain;
pub mod flush;
pub mod ports;
pub mod retry;
pub mod store;
pub mod triggers;

pub use classify::{classify, Disposition};
pub use connectivity::Connectivity;
pub use domain::{
    ActionId, EventKind, IdempotencyKey, QueuedAction, StoreError, SubmitError, SubmitErrorKind,
    TelemetryEvent,
};
pub use flush::{ActionQueue, ActionQueueBuilder, QueueCounts, SubmitOutcome};
pub use ports::{
    Clock, FixedClock, IdGenerator, MemorySink, NoopRegistrar, NoopSink, QueueStore, Submitter,
    SystemClock, TelemetrySink, TracingSink, UlidGenerator, WakeRegistrar, WakeSignal,
};
pub use retry::RetryPolicy;
pub use store::{FileStore, MemoryStore};
pub use triggers::{TriggerConfig, TriggerLoop};
