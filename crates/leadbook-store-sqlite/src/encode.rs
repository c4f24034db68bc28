//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Tags and history payloads
//! are stored as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings. Enumerations are stored by their wire string, so a corrupt or
//! hand-edited row surfaces as [`Error::Decode`] rather than a silent
//! misread.

use chrono::{DateTime, Utc};
use leadbook_core::{
  Error, Result,
  history::{HistoryEntry, HistoryPayload},
  lead::{
    Bhk, City, Lead, LeadFields, PropertyType, Purpose, Source, Status,
    Timeline,
  },
};
use uuid::Uuid;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Decode(format!("uuid {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

/// Decode an enumeration column via its `parse` constructor.
fn decode_enum<T>(
  column: &str,
  s: &str,
  parse: fn(&str) -> Option<T>,
) -> Result<T> {
  parse(s).ok_or_else(|| Error::Decode(format!("{column} {s:?}")))
}

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  serde_json::from_str(s).map_err(|e| Error::Decode(format!("tags {s:?}: {e}")))
}

pub fn encode_payload(p: &HistoryPayload) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_payload(s: &str) -> Result<HistoryPayload> {
  serde_json::from_str(s)
    .map_err(|e| Error::Decode(format!("history payload: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `leads` row.
pub struct RawLead {
  pub lead_id:       String,
  pub full_name:     String,
  pub email:         Option<String>,
  pub phone:         String,
  pub city:          String,
  pub property_type: String,
  pub bhk:           Option<String>,
  pub purpose:       String,
  pub budget_min:    Option<i64>,
  pub budget_max:    Option<i64>,
  pub timeline:      String,
  pub source:        String,
  pub status:        String,
  pub notes:         Option<String>,
  pub tags:          String,
  pub owner_id:      String,
  pub version:       i64,
  pub updated_at:    String,
}

impl RawLead {
  /// Column list matching [`Self::from_row`]; keep both in sync.
  pub const COLUMNS: &'static str = "lead_id, full_name, email, phone, city, \
    property_type, bhk, purpose, budget_min, budget_max, timeline, source, \
    status, notes, tags, owner_id, version, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lead_id:       row.get(0)?,
      full_name:     row.get(1)?,
      email:         row.get(2)?,
      phone:         row.get(3)?,
      city:          row.get(4)?,
      property_type: row.get(5)?,
      bhk:           row.get(6)?,
      purpose:       row.get(7)?,
      budget_min:    row.get(8)?,
      budget_max:    row.get(9)?,
      timeline:      row.get(10)?,
      source:        row.get(11)?,
      status:        row.get(12)?,
      notes:         row.get(13)?,
      tags:          row.get(14)?,
      owner_id:      row.get(15)?,
      version:       row.get(16)?,
      updated_at:    row.get(17)?,
    })
  }

  pub fn into_lead(self) -> Result<Lead> {
    let bhk = self
      .bhk
      .as_deref()
      .map(|s| decode_enum("bhk", s, Bhk::parse))
      .transpose()?;

    Ok(Lead {
      id: decode_uuid(&self.lead_id)?,
      fields: LeadFields {
        full_name: self.full_name,
        email: self.email,
        phone: self.phone,
        city: decode_enum("city", &self.city, City::parse)?,
        property_type: decode_enum(
          "property_type",
          &self.property_type,
          PropertyType::parse,
        )?,
        bhk,
        purpose: decode_enum("purpose", &self.purpose, Purpose::parse)?,
        budget_min: self.budget_min,
        budget_max: self.budget_max,
        timeline: decode_enum("timeline", &self.timeline, Timeline::parse)?,
        source: decode_enum("source", &self.source, Source::parse)?,
        status: decode_enum("status", &self.status, Status::parse)?,
        notes: self.notes,
        tags: decode_tags(&self.tags)?,
      },
      owner_id: self.owner_id,
      version: self.version,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `lead_history` row.
pub struct RawHistory {
  pub history_id: String,
  pub lead_id:    String,
  pub changed_by: String,
  pub changed_at: String,
  pub payload:    String,
}

impl RawHistory {
  pub const COLUMNS: &'static str =
    "history_id, lead_id, changed_by, changed_at, payload";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id: row.get(0)?,
      lead_id:    row.get(1)?,
      changed_by: row.get(2)?,
      changed_at: row.get(3)?,
      payload:    row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:         decode_uuid(&self.history_id)?,
      lead_id:    decode_uuid(&self.lead_id)?,
      changed_by: self.changed_by,
      changed_at: decode_dt(&self.changed_at)?,
      payload:    decode_payload(&self.payload)?,
    })
  }
}
