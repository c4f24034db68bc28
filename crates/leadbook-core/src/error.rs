//! Error types for `leadbook-core`.
//!
//! This is the full outcome taxonomy of the update engine. Storage backends
//! fold their infrastructure failures into [`Error::Storage`] so callers can
//! match on the domain outcomes (`LeadNotFound`, `NotOwner`,
//! `VersionConflict`) without knowing which backend produced them.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("lead not found: {0}")]
  LeadNotFound(Uuid),

  #[error("actor {actor:?} does not own lead {lead}")]
  NotOwner { lead: Uuid, actor: String },

  /// The caller's concurrency token is stale: another writer committed since
  /// the caller last read the record.
  #[error(
    "lead {lead} changed since last read (stored version {stored}, claimed {claimed})"
  )]
  VersionConflict {
    lead:    Uuid,
    stored:  i64,
    claimed: i64,
  },

  /// A diff payload referenced a field that does not exist on the lead
  /// schema, or carried a value of the wrong shape for that field.
  #[error("diff entry does not match field {field:?}")]
  DiffMismatch { field: String },

  /// A stored column could not be decoded back into its domain type.
  #[error("corrupt stored value: {0}")]
  Decode(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The underlying store could not complete the transaction. All-or-nothing
  /// semantics hold, so the attempt is safe to retry.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
