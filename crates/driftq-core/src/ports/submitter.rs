//! Submitter port: the remote-call contract.
//!
//! Supplied by the caller per namespace; encapsulates the actual REST
//! endpoint, auth, and timeouts. The flush engine imposes no timeout of its
//! own on an individual submission.

use async_trait::async_trait;

use crate::domain::{IdempotencyKey, SubmitError};

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Attempt one submission.
    ///
    /// The same `idempotency_key` is passed on every retry of the same
    /// logical action; implementations should forward it so the remote
    /// service can deduplicate. Errors should be tagged with the most
    /// specific `SubmitErrorKind` the transport can determine, and carry
    /// the HTTP status when one is available.
    async fn submit(
        &self,
        payload: &serde_json::Value,
        idempotency_key: &IdempotencyKey,
    ) -> Result<(), SubmitError>;
}
