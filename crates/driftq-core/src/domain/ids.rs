//! Domain identifiers (strongly-typed IDs).
//!
//! IDs are ULID-backed: sortable by creation time, collision-resistant
//! without any coordination with the server, and safe to use as map keys or
//! as part of an idempotency token.
//!
//! A single generic `Id<T>` provides the shared implementation; the marker
//! type `T` costs nothing at runtime (`PhantomData`) but keeps an
//! `ActionId` and an `IdempotencyKey` from ever being mixed up at a call
//! site.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each ID type.
///
/// Provides the prefix used by `Display` (e.g. "act-", "idem-").
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
///
/// Serializes transparently as the inner ULID string, so the persisted
/// queue layout stays flat.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker type for queued actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {}

impl IdMarker for Action {
    fn prefix() -> &'static str {
        "act-"
    }
}

/// Marker type for idempotency tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Idempotency {}

impl IdMarker for Idempotency {
    fn prefix() -> &'static str {
        "idem-"
    }
}

/// Identifier of a queued action; never reused, stable for the action's
/// lifetime in the queue.
pub type ActionId = Id<Action>;

/// Token letting the remote service deduplicate repeated submissions of the
/// same logical action. Generated once at enqueue time and carried on every
/// retry.
pub type IdempotencyKey = Id<Idempotency>;
