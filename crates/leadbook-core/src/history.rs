//! History entries — the immutable audit trail of a lead.
//!
//! One entry is appended per successful update (and one at creation, with a
//! distinguished `created` marker). Entries are never mutated; they are
//! removed only when their lead is deleted, via cascade.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lead::{Bhk, City, PropertyType, Purpose, Source, Status, Timeline};

// ─── Field values ────────────────────────────────────────────────────────────

/// A snapshot of one lead field, tagged by shape. Keeping this a closed union
/// (rather than raw JSON) keeps the diff computer and every consumer of a
/// diff exhaustive: a new lead field cannot be added without the compiler
/// pointing at every place that must handle it.
///
/// `None` inside the optional shapes means "not set", which is distinct from
/// `0` or the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
  Text(Option<String>),
  Number(Option<i64>),
  City(City),
  PropertyType(PropertyType),
  Bhk(Option<Bhk>),
  Purpose(Purpose),
  Timeline(Timeline),
  Source(Source),
  Status(Status),
  Tags(Vec<String>),
}

/// One changed field: the value before and after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDelta {
  pub old: FieldValue,
  pub new: FieldValue,
}

/// Changed-field-name → before/after. A `BTreeMap` so the serialised payload
/// has a stable field order.
pub type LeadDiff = BTreeMap<String, FieldDelta>;

// ─── History payload ─────────────────────────────────────────────────────────

/// What a history entry records: either the creation of the lead (no prior
/// values) or a field-level diff of an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryPayload {
  Created,
  Updated { diff: LeadDiff },
}

// ─── HistoryEntry ────────────────────────────────────────────────────────────

/// An immutable audit record. Once written, no field is ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id:         Uuid,
  pub lead_id:    Uuid,
  /// The acting user's opaque id.
  pub changed_by: String,
  pub changed_at: DateTime<Utc>,
  pub payload:    HistoryPayload,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn created_payload_serialises_with_marker() {
    let json = serde_json::to_value(HistoryPayload::Created).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "created" }));
  }

  #[test]
  fn updated_payload_round_trips() {
    let mut diff = LeadDiff::new();
    diff.insert("status".into(), FieldDelta {
      old: FieldValue::Status(Status::New),
      new: FieldValue::Status(Status::Qualified),
    });
    let payload = HistoryPayload::Updated { diff };

    let json = serde_json::to_string(&payload).unwrap();
    let back: HistoryPayload = serde_json::from_str(&json).unwrap();
    assert_eq!(back, payload);
  }

  #[test]
  fn not_set_is_distinct_from_zero_and_empty() {
    assert_ne!(FieldValue::Number(None), FieldValue::Number(Some(0)));
    assert_ne!(
      FieldValue::Text(None),
      FieldValue::Text(Some(String::new()))
    );
  }
}
