//! Clock port: time as a dependency, not an ambient global.
//!
//! Backoff arithmetic is all relative to "now", so tests swap in a
//! `FixedClock` and advance it by hand instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Interior mutability so a shared `Arc<FixedClock>` can be advanced from
/// the test while the engine holds its own handle.
#[derive(Debug)]
pub struct FixedClock {
    base: DateTime<Utc>,
    offset_ms: AtomicI64,
}

impl FixedClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            offset_ms: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }
}
