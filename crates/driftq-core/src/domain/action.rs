//! Queued action: the unit of deferred work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActionId, IdempotencyKey};

/// A single deferred unit of work (one booking attempt, one message send).
///
/// Design:
/// - This is the persisted record; the store holds one ordered list per
///   namespace and the flush engine rewrites it wholesale.
/// - All state transitions happen through the methods below.
/// - Removal happens only on confirmed success or explicit user discard,
///   never speculatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: ActionId,

    /// Opaque domain data needed to perform the submission.
    pub payload: serde_json::Value,

    /// Generated once at enqueue time; travels with every retry so the
    /// remote service can deduplicate repeated submissions.
    pub idempotency_key: IdempotencyKey,

    /// Prior submission attempts. Starts at 0, increments only on failure.
    pub attempt: u32,

    /// The action must not be retried before this instant.
    pub next_attempt_at: DateTime<Utc>,

    /// Enqueue timestamp, immutable.
    pub created_at: DateTime<Utc>,

    /// Human-readable description of the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// The last failure was a true conflict; automatic retry is suspended
    /// until the user explicitly retries or discards.
    #[serde(default)]
    pub conflict: bool,
}

impl QueuedAction {
    /// Create a freshly enqueued action, immediately eligible for flush
    /// (`next_attempt_at == created_at`).
    pub fn new(
        id: ActionId,
        idempotency_key: IdempotencyKey,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            payload,
            idempotency_key,
            attempt: 0,
            next_attempt_at: created_at,
            created_at,
            last_error: None,
            conflict: false,
        }
    }

    /// Eligible for automatic submission: due, and not parked on a conflict.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.conflict && self.next_attempt_at <= now
    }

    /// Record a failed submission attempt.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        conflict: bool,
        next_attempt_at: DateTime<Utc>,
    ) {
        self.attempt += 1;
        self.last_error = Some(error.into());
        self.conflict = conflict;
        self.next_attempt_at = next_attempt_at;
    }

    /// User-initiated retry: clear the conflict flag and make the action
    /// immediately due again.
    pub fn reset_for_retry(&mut self, now: DateTime<Utc>) {
        self.conflict = false;
        self.next_attempt_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn sample(now: DateTime<Utc>) -> QueuedAction {
        QueuedAction::new(
            ActionId::from_ulid(Ulid::new()),
            IdempotencyKey::from_ulid(Ulid::new()),
            serde_json::json!({"note": "ice please"}),
            now,
        )
    }

    #[test]
    fn new_action_is_immediately_due() {
        let now = Utc::now();
        let action = sample(now);

        assert_eq!(action.attempt, 0);
        assert_eq!(action.next_attempt_at, action.created_at);
        assert!(action.is_due(now));
    }

    #[test]
    fn failure_increments_attempt_and_defers() {
        let now = Utc::now();
        let mut action = sample(now);

        let later = now + chrono::Duration::seconds(1);
        action.record_failure("http 500", false, later);

        assert_eq!(action.attempt, 1);
        assert_eq!(action.last_error.as_deref(), Some("http 500"));
        assert!(!action.conflict);
        assert!(!action.is_due(now));
        assert!(action.is_due(later));
    }

    #[test]
    fn conflicted_action_is_never_due() {
        let now = Utc::now();
        let mut action = sample(now);
        action.record_failure("http 409", true, now);

        assert!(!action.is_due(now + chrono::Duration::days(1)));
    }

    #[test]
    fn reset_for_retry_clears_conflict_and_makes_due() {
        let now = Utc::now();
        let mut action = sample(now);
        action.record_failure("http 409", true, now);

        let later = now + chrono::Duration::seconds(5);
        action.reset_for_retry(later);

        assert!(!action.conflict);
        assert_eq!(action.next_attempt_at, later);
        assert!(action.is_due(later));
        // The attempt count is history; retry does not rewrite it.
        assert_eq!(action.attempt, 1);
    }

    #[test]
    fn persisted_layout_roundtrips_exactly() {
        let now = Utc::now();
        let mut action = sample(now);
        action.record_failure("timed out", false, now + chrono::Duration::seconds(2));

        let json = serde_json::to_string(&action).unwrap();
        let back: QueuedAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
