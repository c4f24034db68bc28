//! The `LeadStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `leadbook-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend. Every method resolves to the engine's outcome
//! taxonomy in [`crate::Error`]; backends fold infrastructure failures into
//! [`crate::Error::Storage`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  history::HistoryEntry,
  lead::{City, Lead, LeadFields, NewLead, PropertyType, Status, Timeline},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Whitelisted sort columns for [`LeadStore::list_leads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  FullName,
  Phone,
  City,
  PropertyType,
  Purpose,
  BudgetMin,
  BudgetMax,
  Timeline,
  Source,
  Status,
  #[default]
  UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Parameters for [`LeadStore::list_leads`].
#[derive(Debug, Clone)]
pub struct LeadQuery {
  /// Case-insensitive substring match over full name, phone, and email.
  pub search:        Option<String>,
  pub city:          Option<City>,
  pub property_type: Option<PropertyType>,
  pub status:        Option<Status>,
  pub timeline:      Option<Timeline>,
  pub sort:          SortKey,
  pub order:         SortOrder,
  /// 1-based page number; values below 1 are treated as 1.
  pub page:          usize,
  /// Page size; `None` returns every matching row (CSV export). Backends
  /// clamp `Some` sizes to 1..=100.
  pub per_page:      Option<usize>,
}

impl Default for LeadQuery {
  fn default() -> Self {
    Self {
      search:        None,
      city:          None,
      property_type: None,
      status:        None,
      timeline:      None,
      sort:          SortKey::default(),
      order:         SortOrder::default(),
      page:          1,
      per_page:      Some(10),
    }
  }
}

/// One page of leads plus the total match count (for pagination controls).
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
  pub items:    Vec<Lead>,
  pub total:    usize,
  pub page:     usize,
  pub per_page: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Leadbook storage backend.
///
/// Mutations are atomic: a lead write and its history entry commit together
/// or not at all. Backends must not cache lead state across calls — every
/// update re-reads current state inside its own transaction before comparing
/// the concurrency token.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LeadStore: Send + Sync {
  /// Persist a new lead (version 1, status defaulted by the validator) and
  /// its `created` history entry, atomically.
  fn create_lead(
    &self,
    new: NewLead,
  ) -> impl Future<Output = Result<Lead>> + Send + '_;

  /// Retrieve a lead by id. Returns `None` if not found.
  fn get_lead(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lead>>> + Send + '_;

  /// The optimistic update protocol, in one transaction:
  ///
  /// 1. read the current lead — [`crate::Error::LeadNotFound`] if missing;
  /// 2. [`crate::Error::NotOwner`] unless `actor` owns the lead;
  /// 3. [`crate::Error::VersionConflict`] unless `claimed_version` equals
  ///    the stored version exactly;
  /// 4. diff old against `fields`; an empty diff returns the stored lead
  ///    unchanged;
  /// 5. otherwise persist the new fields with `version + 1`, a fresh
  ///    `updated_at`, and one `updated` history entry — all or nothing.
  fn update_lead<'a>(
    &'a self,
    id: Uuid,
    claimed_version: i64,
    fields: LeadFields,
    actor: &'a str,
  ) -> impl Future<Output = Result<Lead>> + Send + 'a;

  /// Delete a lead and (by cascade) its history. Owner-only.
  fn delete_lead<'a>(
    &'a self,
    id: Uuid,
    actor: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Filter, search, sort, and paginate leads.
  fn list_leads<'a>(
    &'a self,
    query: &'a LeadQuery,
  ) -> impl Future<Output = Result<LeadPage>> + Send + 'a;

  /// History entries for a lead, most recent first.
  fn history(
    &self,
    lead_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>>> + Send + '_;
}
