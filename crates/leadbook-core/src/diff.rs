//! Field-level diff between two lead field sets.
//!
//! [`diff`] feeds the audit trail: it covers every mutable field of the lead
//! schema (identity, ownership, and the concurrency token are not fields) and
//! includes an entry iff the old and new values differ. [`apply`] is the
//! inverse direction: writing a diff's `new` values onto a field set
//! reproduces the post-update state.

use crate::{
  Error, Result,
  history::{FieldDelta, FieldValue, LeadDiff},
  lead::LeadFields,
};

/// Wire names of the mutable lead fields, as they appear as diff keys and as
/// CSV template columns.
pub mod field {
  pub const FULL_NAME:     &str = "fullName";
  pub const EMAIL:         &str = "email";
  pub const PHONE:         &str = "phone";
  pub const CITY:          &str = "city";
  pub const PROPERTY_TYPE: &str = "propertyType";
  pub const BHK:           &str = "bhk";
  pub const PURPOSE:       &str = "purpose";
  pub const BUDGET_MIN:    &str = "budgetMin";
  pub const BUDGET_MAX:    &str = "budgetMax";
  pub const TIMELINE:      &str = "timeline";
  pub const SOURCE:        &str = "source";
  pub const STATUS:        &str = "status";
  pub const NOTES:         &str = "notes";
  pub const TAGS:          &str = "tags";
}

/// Compute the changed-field map between two complete field sets.
///
/// Equality is by value; optional fields treat "not set" as its own value,
/// distinct from `0` or `""`. Tags are compared element-wise and
/// order-sensitively, matching how they are presented and applied.
pub fn diff(old: &LeadFields, new: &LeadFields) -> LeadDiff {
  // Destructured so that adding a field to `LeadFields` breaks this function
  // until the field is diffed.
  let LeadFields {
    full_name,
    email,
    phone,
    city,
    property_type,
    bhk,
    purpose,
    budget_min,
    budget_max,
    timeline,
    source,
    status,
    notes,
    tags,
  } = new;

  let mut out = LeadDiff::new();
  let mut entry = |name: &str, old_v: FieldValue, new_v: FieldValue| {
    if old_v != new_v {
      out.insert(name.to_owned(), FieldDelta { old: old_v, new: new_v });
    }
  };

  entry(
    field::FULL_NAME,
    FieldValue::Text(Some(old.full_name.clone())),
    FieldValue::Text(Some(full_name.clone())),
  );
  entry(
    field::EMAIL,
    FieldValue::Text(old.email.clone()),
    FieldValue::Text(email.clone()),
  );
  entry(
    field::PHONE,
    FieldValue::Text(Some(old.phone.clone())),
    FieldValue::Text(Some(phone.clone())),
  );
  entry(field::CITY, FieldValue::City(old.city), FieldValue::City(*city));
  entry(
    field::PROPERTY_TYPE,
    FieldValue::PropertyType(old.property_type),
    FieldValue::PropertyType(*property_type),
  );
  entry(field::BHK, FieldValue::Bhk(old.bhk), FieldValue::Bhk(*bhk));
  entry(
    field::PURPOSE,
    FieldValue::Purpose(old.purpose),
    FieldValue::Purpose(*purpose),
  );
  entry(
    field::BUDGET_MIN,
    FieldValue::Number(old.budget_min),
    FieldValue::Number(*budget_min),
  );
  entry(
    field::BUDGET_MAX,
    FieldValue::Number(old.budget_max),
    FieldValue::Number(*budget_max),
  );
  entry(
    field::TIMELINE,
    FieldValue::Timeline(old.timeline),
    FieldValue::Timeline(*timeline),
  );
  entry(
    field::SOURCE,
    FieldValue::Source(old.source),
    FieldValue::Source(*source),
  );
  entry(
    field::STATUS,
    FieldValue::Status(old.status),
    FieldValue::Status(*status),
  );
  entry(
    field::NOTES,
    FieldValue::Text(old.notes.clone()),
    FieldValue::Text(notes.clone()),
  );
  entry(
    field::TAGS,
    FieldValue::Tags(old.tags.clone()),
    FieldValue::Tags(tags.clone()),
  );

  out
}

/// Write a diff's `new` values onto `base`.
///
/// For every diff produced by [`diff`], `apply(old, &diff(old, new))` yields
/// `new`. Fails with [`Error::DiffMismatch`] when an entry names an unknown
/// field or carries a value of the wrong shape for the field it names.
pub fn apply(base: &LeadFields, changes: &LeadDiff) -> Result<LeadFields> {
  let mut fields = base.clone();
  for (name, delta) in changes {
    let mismatch = || Error::DiffMismatch { field: name.clone() };
    match (name.as_str(), &delta.new) {
      (field::FULL_NAME, FieldValue::Text(Some(v))) => {
        fields.full_name = v.clone();
      }
      (field::EMAIL, FieldValue::Text(v)) => fields.email = v.clone(),
      (field::PHONE, FieldValue::Text(Some(v))) => fields.phone = v.clone(),
      (field::CITY, FieldValue::City(v)) => fields.city = *v,
      (field::PROPERTY_TYPE, FieldValue::PropertyType(v)) => {
        fields.property_type = *v;
      }
      (field::BHK, FieldValue::Bhk(v)) => fields.bhk = *v,
      (field::PURPOSE, FieldValue::Purpose(v)) => fields.purpose = *v,
      (field::BUDGET_MIN, FieldValue::Number(v)) => fields.budget_min = *v,
      (field::BUDGET_MAX, FieldValue::Number(v)) => fields.budget_max = *v,
      (field::TIMELINE, FieldValue::Timeline(v)) => fields.timeline = *v,
      (field::SOURCE, FieldValue::Source(v)) => fields.source = *v,
      (field::STATUS, FieldValue::Status(v)) => fields.status = *v,
      (field::NOTES, FieldValue::Text(v)) => fields.notes = v.clone(),
      (field::TAGS, FieldValue::Tags(v)) => fields.tags = v.clone(),
      _ => return Err(mismatch()),
    }
  }
  Ok(fields)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
