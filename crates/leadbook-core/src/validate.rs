//! Pure validation of candidate lead payloads.
//!
//! A [`LeadPayload`] is the raw, loosely-typed shape decoded from a request
//! body or a CSV row. [`validate`] turns it into a typed
//! [`LeadFields`](crate::lead::LeadFields) or a field-name → reason map.
//! Every rule is evaluated independently: a violation in one field never
//! hides a violation in another.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::lead::{
  Bhk, City, LeadFields, PropertyType, Purpose, Source, Status, Timeline,
  valid_values,
};

/// Field-name → human-readable reason. `BTreeMap` for stable ordering in
/// responses and test assertions.
pub type ValidationErrors = BTreeMap<String, String>;

/// Raw candidate fields as submitted by a client. Enumerations arrive as
/// plain strings so that unknown members surface as per-field validation
/// errors rather than body-decode failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadPayload {
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
  /// Defaults to `New` when absent — at creation only; updates echo the
  /// current status explicitly.
  pub status:        Option<String>,
  pub notes:         Option<String>,
  pub tags:          Option<Vec<String>>,
}

const MAX_FULL_NAME: usize = 80;

/// Validate a candidate payload into a typed field set.
///
/// # Errors
///
/// Returns the collected field → reason map when any rule is violated. No
/// rule short-circuits another; the map holds every violation at once.
pub fn validate(payload: &LeadPayload) -> Result<LeadFields, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  let full_name = payload.full_name.trim();
  if full_name.chars().count() < 2 {
    errors.insert(
      "fullName".into(),
      "Full name must be at least 2 characters".into(),
    );
  } else if full_name.chars().count() > MAX_FULL_NAME {
    errors.insert(
      "fullName".into(),
      format!("Full name must be at most {MAX_FULL_NAME} characters"),
    );
  }

  if payload.phone.len() < 10
    || payload.phone.len() > 15
    || !payload.phone.bytes().all(|b| b.is_ascii_digit())
  {
    errors.insert("phone".into(), "Phone must be 10-15 digits".into());
  }

  // Email is optional; the empty string counts as "not provided".
  let email = payload
    .email
    .as_deref()
    .map(str::trim)
    .filter(|e| !e.is_empty());
  if let Some(e) = email
    && !email_shape_ok(e)
  {
    errors.insert("email".into(), "Invalid email format".into());
  }

  let city = parse_enum(&mut errors, "city", &payload.city, City::parse, City::ALL);
  let property_type = parse_enum(
    &mut errors,
    "propertyType",
    &payload.property_type,
    PropertyType::parse,
    PropertyType::ALL,
  );
  let purpose = parse_enum(
    &mut errors,
    "purpose",
    &payload.purpose,
    Purpose::parse,
    Purpose::ALL,
  );
  let timeline = parse_enum(
    &mut errors,
    "timeline",
    &payload.timeline,
    Timeline::parse,
    Timeline::ALL,
  );
  let source = parse_enum(
    &mut errors,
    "source",
    &payload.source,
    Source::parse,
    Source::ALL,
  );

  // Bedroom tag: required for residential property types, ignored for the
  // rest. Membership is checked whenever a value is supplied, so a bad tag
  // is reported even if the property type is itself invalid.
  let bhk_supplied = payload
    .bhk
    .as_deref()
    .map(str::trim)
    .filter(|b| !b.is_empty());
  let bhk_parsed = match bhk_supplied {
    Some(raw) => match Bhk::parse(raw) {
      Some(b) => Some(b),
      None => {
        errors.insert(
          "bhk".into(),
          format!("Unknown BHK {raw:?}. Valid values: {}", valid_values(Bhk::ALL)),
        );
        None
      }
    },
    None => None,
  };
  let bhk = match property_type {
    Some(pt) if pt.requires_bhk() => {
      if bhk_supplied.is_none() {
        errors.insert(
          "bhk".into(),
          "BHK is required for Apartment and Villa properties".into(),
        );
      }
      bhk_parsed
    }
    Some(_) => None,
    // Property type unknown: keep whatever parsed so its membership error
    // (if any) stands, but don't guess at requiredness.
    None => bhk_parsed,
  };

  if let Some(min) = payload.budget_min
    && min < 0
  {
    errors.insert("budgetMin".into(), "Budget min must be non-negative".into());
  }
  if let Some(max) = payload.budget_max
    && max < 0
  {
    errors.insert("budgetMax".into(), "Budget max must be non-negative".into());
  }
  if let (Some(min), Some(max)) = (payload.budget_min, payload.budget_max)
    && min >= 0
    && max >= 0
    && max < min
  {
    errors.insert(
      "budgetMax".into(),
      "Budget max must be greater than or equal to budget min".into(),
    );
  }

  let status = match payload.status.as_deref().map(str::trim) {
    None | Some("") => Some(Status::default()),
    Some(raw) => match Status::parse(raw) {
      Some(s) => Some(s),
      None => {
        errors.insert(
          "status".into(),
          format!(
            "Unknown status {raw:?}. Valid values: {}",
            valid_values(Status::ALL)
          ),
        );
        None
      }
    },
  };

  let notes = payload
    .notes
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_owned);

  // A `None` from any parse helper implies an entry in `errors`.
  let (
    Some(city),
    Some(property_type),
    Some(purpose),
    Some(timeline),
    Some(source),
    Some(status),
  ) = (city, property_type, purpose, timeline, source, status)
  else {
    return Err(errors);
  };
  if !errors.is_empty() {
    return Err(errors);
  }

  Ok(LeadFields {
    full_name: full_name.to_owned(),
    email: email.map(str::to_owned),
    phone: payload.phone.clone(),
    city,
    property_type,
    bhk,
    purpose,
    budget_min: payload.budget_min,
    budget_max: payload.budget_max,
    timeline,
    source,
    status,
    notes,
    tags: payload.tags.clone().unwrap_or_default(),
  })
}

fn parse_enum<T: Copy + std::fmt::Display>(
  errors: &mut ValidationErrors,
  name: &str,
  raw: &str,
  parse: fn(&str) -> Option<T>,
  all: &[T],
) -> Option<T> {
  match parse(raw.trim()) {
    Some(v) => Some(v),
    None => {
      errors.insert(
        name.to_owned(),
        format!(
          "Unknown {name} {:?}. Valid values: {}",
          raw.trim(),
          valid_values(all)
        ),
      );
      None
    }
  }
}

/// `local@domain` with a dotted domain; no whitespace anywhere.
fn email_shape_ok(s: &str) -> bool {
  if s.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = s.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
