//! Error types: submission failures (tagged at the network boundary) and
//! store failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operational classification of a submission failure.
///
/// The kind is assigned where the network call is made, so downstream
/// classification is a total function over a closed set of variants instead
/// of a string-matching guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitErrorKind {
    /// Connection refused, DNS failure, socket reset.
    Network,

    /// The remote call did not complete in time.
    Timeout,

    /// The remote service answered with a 5xx-style failure.
    Server,

    /// The remote service rejected the action as conflicting (409/412).
    Conflict,

    /// Anything the boundary could not classify.
    Unknown,
}

/// A failed submission, as reported by the `Submitter` contract.
#[derive(Debug, Clone, Error)]
#[error("submit failed ({kind:?}): {message}")]
pub struct SubmitError {
    pub kind: SubmitErrorKind,

    /// HTTP-status-like code, when the transport provided one.
    pub status: Option<u16>,

    pub message: String,
}

impl SubmitError {
    pub fn new(kind: SubmitErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SubmitErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(SubmitErrorKind::Timeout, message)
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::new(SubmitErrorKind::Server, message).with_status(status)
    }

    pub fn conflict(status: u16, message: impl Into<String>) -> Self {
        Self::new(SubmitErrorKind::Conflict, message).with_status(status)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(SubmitErrorKind::Unknown, message)
    }
}

/// Failure while persisting a queue.
///
/// Note the asymmetry with loading: a corrupt or missing persisted value
/// loads as an empty queue by contract and never surfaces as an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("queue storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
