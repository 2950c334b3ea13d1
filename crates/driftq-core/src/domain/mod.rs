//! Domain model (ids, queued actions, submit errors, telemetry events).

pub mod action;
pub mod error;
pub mod events;
pub mod ids;

pub use action::QueuedAction;
pub use error::{StoreError, SubmitError, SubmitErrorKind};
pub use events::{EventKind, TelemetryEvent};
pub use ids::{ActionId, IdempotencyKey};
