//! Conflict classifier: retryable failure or true conflict?
//!
//! A pure, total function over the closed `SubmitErrorKind` set. A conflict
//! means automatic retry is pointless and a human has to decide; everything
//! else goes back on the backoff schedule. Best-effort heuristic, not a
//! guarantee.

use crate::domain::{SubmitError, SubmitErrorKind};

/// What the flush engine should do with a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient: schedule a backoff retry.
    Retry,

    /// True conflict: park the action for explicit user resolution.
    Conflict,
}

pub fn classify(error: &SubmitError) -> Disposition {
    // A conflict-family status wins regardless of how the transport tagged
    // the error.
    if matches!(error.status, Some(409) | Some(412)) {
        return Disposition::Conflict;
    }

    match error.kind {
        SubmitErrorKind::Conflict => Disposition::Conflict,
        SubmitErrorKind::Network | SubmitErrorKind::Timeout | SubmitErrorKind::Server => {
            Disposition::Retry
        }
        // Untagged errors fall back to the message heuristic.
        SubmitErrorKind::Unknown => {
            if error.message.to_ascii_lowercase().contains("conflict") {
                Disposition::Conflict
            } else {
                Disposition::Retry
            }
        }
    }
}
