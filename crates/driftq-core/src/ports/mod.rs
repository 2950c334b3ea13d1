//! Ports: the trait seams of the queue.
//!
//! Each trait hides an external concern (durable storage, the remote
//! service, the wall clock, the host's background-sync facility) behind an
//! interface so implementations can be swapped, most importantly in tests
//! (in-memory fakes vs. the durable backend).

pub mod clock;
pub mod id_generator;
pub mod store;
pub mod submitter;
pub mod telemetry;
pub mod wake;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::store::QueueStore;
pub use self::submitter::Submitter;
pub use self::telemetry::{MemorySink, NoopSink, TelemetrySink, TracingSink};
pub use self::wake::{NoopRegistrar, WakeRegistrar, WakeSignal};
