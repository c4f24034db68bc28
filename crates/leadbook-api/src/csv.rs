//! CSV import, export, and template endpoints.
//!
//! The column set is the intake template: every mutable lead field, in form
//! order. Import feeds each valid row through the normal creation path (so
//! each imported lead gets its `created` history entry and the actor as
//! owner); invalid rows are reported per row and skipped. Export honours the
//! same filter/search/sort parameters as the list endpoint, unpaginated.
//!
//! Fields are quoted RFC-4180 style on output (`"` doubled, commas and
//! newlines allowed inside quotes) and the parser accepts the same.

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::IntoResponse,
};
use leadbook_core::{
  lead::{Lead, NewLead},
  store::LeadStore,
  validate::{LeadPayload, validate},
};
use serde::Serialize;

use crate::{
  AppState,
  auth::Actor,
  error::ApiError,
  leads::ListParams,
};

/// Template columns, in order. Also the accepted import header.
pub const HEADERS: [&str; 14] = [
  "fullName",
  "email",
  "phone",
  "city",
  "propertyType",
  "bhk",
  "purpose",
  "budgetMin",
  "budgetMax",
  "timeline",
  "source",
  "notes",
  "tags",
  "status",
];

/// Hard cap on data rows per import request.
pub const MAX_IMPORT_ROWS: usize = 200;

// ─── CSV text ─────────────────────────────────────────────────────────────────

/// Split CSV text into records. Quote-aware: `"` opens a quoted field in
/// which commas and newlines are literal and `""` is an escaped quote.
/// Blank lines are skipped.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
  let mut records: Vec<Vec<String>> = vec![];
  let mut record: Vec<String> = vec![];
  let mut field = String::new();
  let mut in_quotes = false;

  let mut chars = text.chars().peekable();
  while let Some(c) = chars.next() {
    if in_quotes {
      if c == '"' {
        if chars.peek() == Some(&'"') {
          chars.next();
          field.push('"');
        } else {
          in_quotes = false;
        }
      } else {
        field.push(c);
      }
    } else {
      match c {
        '"' => in_quotes = true,
        ',' => record.push(std::mem::take(&mut field)),
        '\r' => {}
        '\n' => {
          record.push(std::mem::take(&mut field));
          records.push(std::mem::take(&mut record));
        }
        _ => field.push(c),
      }
    }
  }
  if !field.is_empty() || !record.is_empty() {
    record.push(field);
    records.push(record);
  }

  records.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));
  records
}

/// Join one record, quoting every field and doubling embedded quotes.
pub fn write_row(fields: &[String]) -> String {
  let quoted: Vec<String> = fields
    .iter()
    .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
    .collect();
  quoted.join(",")
}

fn lead_to_row(lead: &Lead) -> Vec<String> {
  let f = &lead.fields;
  vec![
    f.full_name.clone(),
    f.email.clone().unwrap_or_default(),
    f.phone.clone(),
    f.city.to_string(),
    f.property_type.to_string(),
    f.bhk.map(|b| b.to_string()).unwrap_or_default(),
    f.purpose.to_string(),
    f.budget_min.map(|n| n.to_string()).unwrap_or_default(),
    f.budget_max.map(|n| n.to_string()).unwrap_or_default(),
    f.timeline.to_string(),
    f.source.to_string(),
    f.notes.clone().unwrap_or_default(),
    f.tags.join(","),
    f.status.to_string(),
  ]
}

fn header_row() -> String {
  HEADERS.map(str::to_owned).join(",")
}

fn csv_response(filename: &str, body: String) -> impl IntoResponse {
  (
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    body,
  )
}

// ─── Template ─────────────────────────────────────────────────────────────────

/// `GET /leads/template` — the import header row.
pub async fn template<S>(
  State(_state): State<AppState<S>>,
  Actor(_): Actor,
) -> Result<impl IntoResponse, ApiError>
where
  S: LeadStore + 'static,
{
  Ok(csv_response("leads-template.csv", format!("{}\n", header_row())))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /leads/export` — all matching rows as CSV, same filters as the list
/// endpoint, no pagination.
pub async fn export<S>(
  State(state): State<AppState<S>>,
  Actor(_): Actor,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LeadStore + 'static,
{
  let query = params.into_query(false)?;
  let page = state.store.list_leads(&query).await?;

  let mut out = String::new();
  out.push_str(&header_row());
  out.push('\n');
  for lead in &page.items {
    out.push_str(&write_row(&lead_to_row(lead)));
    out.push('\n');
  }

  Ok(csv_response("leads-export.csv", out))
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq)]
pub struct RowError {
  /// 1-based data row number (the header is row 0).
  pub row:     usize,
  pub field:   String,
  pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
  pub inserted: usize,
  pub errors:   Vec<RowError>,
}

/// Build a raw payload from one CSV record, reporting non-numeric budgets as
/// row errors instead of bailing out.
fn row_to_payload(
  columns: &[Option<usize>; 14],
  record: &[String],
  row: usize,
  errors: &mut Vec<RowError>,
) -> Option<LeadPayload> {
  let get = |i: usize| -> String {
    columns[i]
      .and_then(|idx| record.get(idx))
      .map(|s| s.trim().to_owned())
      .unwrap_or_default()
  };
  let opt = |i: usize| -> Option<String> {
    Some(get(i)).filter(|s| !s.is_empty())
  };

  let mut budget = |i: usize, name: &str| -> Result<Option<i64>, ()> {
    match opt(i) {
      None => Ok(None),
      Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
        errors.push(RowError {
          row,
          field:   name.to_owned(),
          message: "Budget values must be numeric".to_owned(),
        });
      }),
    }
  };
  let budget_min = budget(7, "budgetMin");
  let budget_max = budget(8, "budgetMax");
  let (Ok(budget_min), Ok(budget_max)) = (budget_min, budget_max) else {
    return None;
  };

  let tags = opt(12).map(|raw| {
    raw
      .split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_owned)
      .collect::<Vec<_>>()
  });

  Some(LeadPayload {
    full_name: get(0),
    email: opt(1),
    phone: get(2),
    city: get(3),
    property_type: get(4),
    bhk: opt(5),
    purpose: get(6),
    budget_min,
    budget_max,
    timeline: get(9),
    source: get(10),
    status: opt(13),
    notes: opt(11),
    tags,
  })
}

/// `POST /leads/import` — body is CSV text using the template header.
/// Valid rows are created (owner = the importing actor); invalid rows are
/// reported with their row number and offending field.
pub async fn import<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  body: String,
) -> Result<Json<ImportReport>, ApiError>
where
  S: LeadStore + 'static,
{
  state.check_rate(&actor)?;

  let records = parse_csv(&body);
  let Some((header, rows)) = records.split_first() else {
    return Err(ApiError::BadRequest("the CSV file is empty".into()));
  };
  if rows.len() > MAX_IMPORT_ROWS {
    return Err(ApiError::BadRequest(format!(
      "too many rows: {} (max {MAX_IMPORT_ROWS})",
      rows.len()
    )));
  }

  // Columns are matched by header name, so order and extra columns don't
  // matter; a missing known column reads as empty and fails validation.
  let columns: [Option<usize>; 14] = std::array::from_fn(|i| {
    header.iter().position(|h| h.trim() == HEADERS[i])
  });
  if columns.iter().all(Option::is_none) {
    return Err(ApiError::BadRequest(
      "header row does not match the template".into(),
    ));
  }

  let mut errors: Vec<RowError> = vec![];
  let mut inserted = 0usize;

  for (i, record) in rows.iter().enumerate() {
    let row = i + 1;
    let Some(payload) = row_to_payload(&columns, record, row, &mut errors)
    else {
      continue;
    };

    match validate(&payload) {
      Ok(fields) => {
        state
          .store
          .create_lead(NewLead { fields, owner_id: actor.clone() })
          .await?;
        inserted += 1;
      }
      Err(field_errors) => {
        errors.extend(field_errors.into_iter().map(|(field, message)| {
          RowError { row, field, message }
        }));
      }
    }
  }

  tracing::info!(inserted, rejected = errors.len(), "csv import finished");
  Ok(Json(ImportReport { inserted, errors }))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
