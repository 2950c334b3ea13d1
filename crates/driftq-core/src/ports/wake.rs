//! WakeRegistrar port: best-effort out-of-process wake signals.
//!
//! At enqueue time the queue registers interest with a host-provided
//! background-sync facility; when the host later sees connectivity it
//! delivers a `WakeSignal` on the channel the trigger loop consumes.
//! Delivery is not guaranteed on every platform, so this path is never the
//! sole route to eventual consistency; the online-transition and periodic
//! triggers remain in place regardless.

/// A wake message relayed from the host's background context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeSignal {
    pub namespace: String,
}

pub trait WakeRegistrar: Send + Sync {
    /// Ask the host to wake us for this namespace once connectivity
    /// returns. Best-effort: failures are swallowed, registration may be a
    /// no-op on hosts without a background-sync facility.
    fn register(&self, namespace: &str);
}

/// For hosts without a background-sync facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistrar;

impl WakeRegistrar for NoopRegistrar {
    fn register(&self, _namespace: &str) {}
}
