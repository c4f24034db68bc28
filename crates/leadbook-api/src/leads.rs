//! Handlers for the `/leads` CRUD and history endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/leads` | Body: raw lead payload; 201 + stored lead |
//! | `GET`    | `/leads` | Filters, search, sort, pagination |
//! | `GET`    | `/leads/{id}` | Lead plus its recent history |
//! | `PUT`    | `/leads/{id}` | Body: payload + `version` token; 409 on stale token |
//! | `DELETE` | `/leads/{id}` | Owner only |
//! | `GET`    | `/leads/{id}/history` | `?limit=`, default 5 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use leadbook_core::{
  Error as CoreError,
  history::HistoryEntry,
  lead::{City, Lead, NewLead, PropertyType, Status, Timeline},
  store::{LeadPage, LeadQuery, LeadStore, SortKey, SortOrder},
  validate::{LeadPayload, validate},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

/// How many history entries ride along with a lead detail view.
pub const RECENT_HISTORY: usize = 5;

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /leads` — 201 + the stored lead.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Json(body): Json<LeadPayload>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LeadStore + 'static,
{
  state.check_rate(&actor)?;
  let fields = validate(&body).map_err(ApiError::Validation)?;
  let lead = state
    .store
    .create_lead(NewLead { fields, owner_id: actor })
    .await?;
  Ok((StatusCode::CREATED, Json(lead)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListParams {
  pub search:        Option<String>,
  pub city:          Option<String>,
  pub property_type: Option<String>,
  pub status:        Option<String>,
  pub timeline:      Option<String>,
  pub sort_by:       Option<String>,
  pub sort_order:    Option<String>,
  pub page:          Option<usize>,
  pub limit:         Option<usize>,
}

impl ListParams {
  /// Map query-string filters onto a typed [`LeadQuery`]. Unknown filter
  /// members are rejected, not silently dropped.
  pub fn into_query(self, paginated: bool) -> Result<LeadQuery, ApiError> {
    fn filt<T: Copy>(
      name: &str,
      raw: Option<String>,
      parse: fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ApiError> {
      match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| {
          ApiError::BadRequest(format!("unknown {name} filter: {s:?}"))
        }),
      }
    }

    let sort = match self.sort_by.as_deref() {
      None | Some("updatedAt") => SortKey::UpdatedAt,
      Some("fullName") => SortKey::FullName,
      Some("phone") => SortKey::Phone,
      Some("city") => SortKey::City,
      Some("propertyType") => SortKey::PropertyType,
      Some("purpose") => SortKey::Purpose,
      Some("budgetMin") => SortKey::BudgetMin,
      Some("budgetMax") => SortKey::BudgetMax,
      Some("timeline") => SortKey::Timeline,
      Some("source") => SortKey::Source,
      Some("status") => SortKey::Status,
      Some(other) => {
        return Err(ApiError::BadRequest(format!(
          "unknown sortBy column: {other:?}"
        )));
      }
    };
    let order = match self.sort_order.as_deref() {
      None | Some("desc") => SortOrder::Desc,
      Some("asc") => SortOrder::Asc,
      Some(other) => {
        return Err(ApiError::BadRequest(format!(
          "sortOrder must be \"asc\" or \"desc\", got {other:?}"
        )));
      }
    };

    Ok(LeadQuery {
      search: self.search,
      city: filt("city", self.city, City::parse)?,
      property_type: filt(
        "propertyType",
        self.property_type,
        PropertyType::parse,
      )?,
      status: filt("status", self.status, Status::parse)?,
      timeline: filt("timeline", self.timeline, Timeline::parse)?,
      sort,
      order,
      page: self.page.unwrap_or(1),
      per_page: paginated.then(|| self.limit.unwrap_or(10)),
    })
  }
}

/// `GET /leads` — one page of leads plus the total match count.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Actor(_): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<LeadPage>, ApiError>
where
  S: LeadStore + 'static,
{
  let query = params.into_query(true)?;
  Ok(Json(state.store.list_leads(&query).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LeadDetail {
  pub lead:    Lead,
  pub history: Vec<HistoryEntry>,
}

/// `GET /leads/{id}` — the lead plus its most recent history entries.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Actor(_): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<LeadDetail>, ApiError>
where
  S: LeadStore + 'static,
{
  let lead = state
    .store
    .get_lead(id)
    .await?
    .ok_or(CoreError::LeadNotFound(id))?;
  let history = state.store.history(id, RECENT_HISTORY).await?;
  Ok(Json(LeadDetail { lead, history }))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /leads/{id}` body: the full candidate field set plus the `version`
/// token the client last read.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub version: i64,
  #[serde(flatten)]
  pub payload: LeadPayload,
}

/// `PUT /leads/{id}` — 200 + the new lead state, or 409 when the token is
/// stale (the client should re-fetch and resubmit).
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Lead>, ApiError>
where
  S: LeadStore + 'static,
{
  state.check_rate(&actor)?;
  let fields = validate(&body.payload).map_err(ApiError::Validation)?;
  let lead = state
    .store
    .update_lead(id, body.version, fields, &actor)
    .await?;
  Ok(Json(lead))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /leads/{id}` — 204; history rows go with the lead.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: LeadStore + 'static,
{
  state.check_rate(&actor)?;
  state.store.delete_lead(id, &actor).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /leads/{id}/history?limit=` — most recent first, default page of 5.
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Actor(_): Actor,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: LeadStore + 'static,
{
  // 404 for unknown leads rather than an empty list.
  state
    .store
    .get_lead(id)
    .await?
    .ok_or(CoreError::LeadNotFound(id))?;

  let limit = params.limit.unwrap_or(RECENT_HISTORY).clamp(1, 50);
  Ok(Json(state.store.history(id, limit).await?))
}
