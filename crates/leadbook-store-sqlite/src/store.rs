//! [`SqliteStore`] — the SQLite implementation of [`LeadStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use leadbook_core::{
  Error, Result, diff,
  history::{HistoryEntry, HistoryPayload},
  lead::{Lead, LeadFields, NewLead},
  store::{LeadPage, LeadQuery, LeadStore, SortKey, SortOrder},
};

use crate::{
  encode::{RawHistory, RawLead, encode_dt, encode_payload, encode_tags, encode_uuid},
  schema::SCHEMA,
};

// ─── Error plumbing ──────────────────────────────────────────────────────────

fn storage(e: tokio_rusqlite::Error) -> Error { Error::Storage(e.to_string()) }

/// Fold rusqlite failures into the engine's `Storage` outcome.
trait DbResultExt<T> {
  fn db(self) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, rusqlite::Error> {
  fn db(self) -> Result<T> {
    self.map_err(|e| Error::Storage(e.to_string()))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Leadbook store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self.with_conn(|conn| conn.execute_batch(SCHEMA).db()).await
  }

  /// Run `f` on the dedicated database thread, folding connection-level
  /// failures into [`Error::Storage`].
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await.map_err(storage)?
  }
}

// ─── Row writes (shared between create and update) ───────────────────────────

fn insert_lead(tx: &rusqlite::Transaction<'_>, lead: &Lead) -> Result<()> {
  let tags = encode_tags(&lead.fields.tags)?;
  tx.execute(
    "INSERT INTO leads (
       lead_id, full_name, email, phone, city, property_type, bhk, purpose,
       budget_min, budget_max, timeline, source, status, notes, tags,
       owner_id, version, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
               ?15, ?16, ?17, ?18)",
    rusqlite::params![
      encode_uuid(lead.id),
      lead.fields.full_name,
      lead.fields.email,
      lead.fields.phone,
      lead.fields.city.as_str(),
      lead.fields.property_type.as_str(),
      lead.fields.bhk.map(|b| b.as_str()),
      lead.fields.purpose.as_str(),
      lead.fields.budget_min,
      lead.fields.budget_max,
      lead.fields.timeline.as_str(),
      lead.fields.source.as_str(),
      lead.fields.status.as_str(),
      lead.fields.notes,
      tags,
      lead.owner_id,
      lead.version,
      encode_dt(lead.updated_at),
    ],
  )
  .db()?;
  Ok(())
}

fn overwrite_lead(tx: &rusqlite::Transaction<'_>, lead: &Lead) -> Result<()> {
  let tags = encode_tags(&lead.fields.tags)?;
  tx.execute(
    "UPDATE leads SET
       full_name = ?2, email = ?3, phone = ?4, city = ?5, property_type = ?6,
       bhk = ?7, purpose = ?8, budget_min = ?9, budget_max = ?10,
       timeline = ?11, source = ?12, status = ?13, notes = ?14, tags = ?15,
       version = ?16, updated_at = ?17
     WHERE lead_id = ?1",
    rusqlite::params![
      encode_uuid(lead.id),
      lead.fields.full_name,
      lead.fields.email,
      lead.fields.phone,
      lead.fields.city.as_str(),
      lead.fields.property_type.as_str(),
      lead.fields.bhk.map(|b| b.as_str()),
      lead.fields.purpose.as_str(),
      lead.fields.budget_min,
      lead.fields.budget_max,
      lead.fields.timeline.as_str(),
      lead.fields.source.as_str(),
      lead.fields.status.as_str(),
      lead.fields.notes,
      tags,
      lead.version,
      encode_dt(lead.updated_at),
    ],
  )
  .db()?;
  Ok(())
}

fn insert_history(
  tx: &rusqlite::Transaction<'_>,
  entry: &HistoryEntry,
) -> Result<()> {
  let payload = encode_payload(&entry.payload)?;
  tx.execute(
    "INSERT INTO lead_history (history_id, lead_id, changed_by, changed_at, payload)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(entry.id),
      encode_uuid(entry.lead_id),
      entry.changed_by,
      encode_dt(entry.changed_at),
      payload,
    ],
  )
  .db()?;
  Ok(())
}

fn read_lead(
  tx: &rusqlite::Transaction<'_>,
  id: Uuid,
) -> Result<Option<Lead>> {
  let sql = format!("SELECT {} FROM leads WHERE lead_id = ?1", RawLead::COLUMNS);
  let raw = tx
    .query_row(&sql, rusqlite::params![encode_uuid(id)], RawLead::from_row)
    .optional()
    .db()?;
  raw.map(RawLead::into_lead).transpose()
}

// ─── Transaction bodies ──────────────────────────────────────────────────────

fn create_in_tx(
  conn: &mut rusqlite::Connection,
  lead: &Lead,
  entry: &HistoryEntry,
) -> Result<()> {
  let tx = conn.transaction().db()?;
  insert_lead(&tx, lead)?;
  insert_history(&tx, entry)?;
  tx.commit().db()
}

/// The update protocol: read, owner check, version compare, diff, then the
/// row overwrite and the audit insert commit together or not at all.
fn update_in_tx(
  conn: &mut rusqlite::Connection,
  id: Uuid,
  claimed_version: i64,
  fields: LeadFields,
  actor: &str,
) -> Result<Lead> {
  let tx = conn.transaction().db()?;

  let old = read_lead(&tx, id)?.ok_or(Error::LeadNotFound(id))?;

  if old.owner_id != actor {
    return Err(Error::NotOwner { lead: id, actor: actor.to_owned() });
  }
  if old.version != claimed_version {
    return Err(Error::VersionConflict {
      lead:    id,
      stored:  old.version,
      claimed: claimed_version,
    });
  }

  let changes = diff::diff(&old.fields, &fields);
  if changes.is_empty() {
    // Nothing changed: no token bump, no audit noise. The open transaction
    // is dropped without writes.
    return Ok(old);
  }

  let updated = Lead {
    id,
    fields,
    owner_id: old.owner_id,
    version: old.version + 1,
    updated_at: Utc::now(),
  };
  let entry = HistoryEntry {
    id:         Uuid::new_v4(),
    lead_id:    id,
    changed_by: actor.to_owned(),
    changed_at: updated.updated_at,
    payload:    HistoryPayload::Updated { diff: changes },
  };

  overwrite_lead(&tx, &updated)?;
  insert_history(&tx, &entry)?;
  tx.commit().db()?;

  Ok(updated)
}

fn delete_in_tx(
  conn: &mut rusqlite::Connection,
  id: Uuid,
  actor: &str,
) -> Result<()> {
  let tx = conn.transaction().db()?;

  let owner: Option<String> = tx
    .query_row(
      "SELECT owner_id FROM leads WHERE lead_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |r| r.get(0),
    )
    .optional()
    .db()?;

  let owner = owner.ok_or(Error::LeadNotFound(id))?;
  if owner != actor {
    return Err(Error::NotOwner { lead: id, actor: actor.to_owned() });
  }

  // History rows go with the lead via ON DELETE CASCADE.
  tx.execute(
    "DELETE FROM leads WHERE lead_id = ?1",
    rusqlite::params![encode_uuid(id)],
  )
  .db()?;
  tx.commit().db()
}

fn sort_column(key: SortKey) -> &'static str {
  match key {
    SortKey::FullName => "full_name",
    SortKey::Phone => "phone",
    SortKey::City => "city",
    SortKey::PropertyType => "property_type",
    SortKey::Purpose => "purpose",
    SortKey::BudgetMin => "budget_min",
    SortKey::BudgetMax => "budget_max",
    SortKey::Timeline => "timeline",
    SortKey::Source => "source",
    SortKey::Status => "status",
    SortKey::UpdatedAt => "updated_at",
  }
}

// ─── LeadStore impl ──────────────────────────────────────────────────────────

impl LeadStore for SqliteStore {
  async fn create_lead(&self, new: NewLead) -> Result<Lead> {
    let lead = Lead {
      id:         Uuid::new_v4(),
      fields:     new.fields,
      owner_id:   new.owner_id,
      version:    1,
      updated_at: Utc::now(),
    };
    let entry = HistoryEntry {
      id:         Uuid::new_v4(),
      lead_id:    lead.id,
      changed_by: lead.owner_id.clone(),
      changed_at: lead.updated_at,
      payload:    HistoryPayload::Created,
    };

    let moved = lead.clone();
    self
      .with_conn(move |conn| create_in_tx(conn, &moved, &entry))
      .await?;
    Ok(lead)
  }

  async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawLead> = self
      .with_conn(move |conn| {
        let sql =
          format!("SELECT {} FROM leads WHERE lead_id = ?1", RawLead::COLUMNS);
        conn
          .query_row(&sql, rusqlite::params![id_str], RawLead::from_row)
          .optional()
          .db()
      })
      .await?;
    raw.map(RawLead::into_lead).transpose()
  }

  async fn update_lead(
    &self,
    id: Uuid,
    claimed_version: i64,
    fields: LeadFields,
    actor: &str,
  ) -> Result<Lead> {
    let actor = actor.to_owned();
    self
      .with_conn(move |conn| {
        update_in_tx(conn, id, claimed_version, fields, &actor)
      })
      .await
  }

  async fn delete_lead(&self, id: Uuid, actor: &str) -> Result<()> {
    let actor = actor.to_owned();
    self
      .with_conn(move |conn| delete_in_tx(conn, id, &actor))
      .await
  }

  async fn list_leads(&self, query: &LeadQuery) -> Result<LeadPage> {
    let page = query.page.max(1);
    let per_page = query.per_page.map(|n| n.clamp(1, 100));

    // Dynamic WHERE clause; every value is bound, never interpolated.
    let mut conds: Vec<String> = vec![];
    let mut args: Vec<String> = vec![];

    if let Some(text) = query
      .search
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
    {
      args.push(format!("%{}%", text.to_lowercase()));
      let n = args.len();
      conds.push(format!(
        "(LOWER(full_name) LIKE ?{n} OR phone LIKE ?{n} \
         OR LOWER(COALESCE(email, '')) LIKE ?{n})"
      ));
    }

    let filters = [
      ("city", query.city.map(|v| v.as_str())),
      ("property_type", query.property_type.map(|v| v.as_str())),
      ("status", query.status.map(|v| v.as_str())),
      ("timeline", query.timeline.map(|v| v.as_str())),
    ];
    for (col, val) in filters {
      if let Some(v) = val {
        args.push(v.to_owned());
        conds.push(format!("{col} = ?{}", args.len()));
      }
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let dir = match query.order {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    };
    // Tie-break on the primary key so pagination is deterministic.
    let order_clause =
      format!("ORDER BY {} {dir}, lead_id ASC", sort_column(query.sort));
    let limit_clause = match per_page {
      Some(n) => format!("LIMIT {n} OFFSET {}", (page - 1) * n),
      None => String::new(),
    };

    let count_sql = format!("SELECT COUNT(*) FROM leads {where_clause}");
    let select_sql = format!(
      "SELECT {} FROM leads {where_clause} {order_clause} {limit_clause}",
      RawLead::COLUMNS
    );

    let (total, raws) = self
      .with_conn(move |conn| {
        let total: i64 = conn
          .query_row(&count_sql, rusqlite::params_from_iter(args.iter()), |r| {
            r.get(0)
          })
          .db()?;

        let mut stmt = conn.prepare(&select_sql).db()?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(args.iter()), RawLead::from_row)
          .db()?
          .collect::<rusqlite::Result<Vec<_>>>()
          .db()?;

        Ok((total as usize, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawLead::into_lead)
      .collect::<Result<Vec<_>>>()?;

    Ok(LeadPage {
      items,
      total,
      page,
      per_page: per_page.unwrap_or_else(|| total.max(1)),
    })
  }

  async fn history(
    &self,
    lead_id: Uuid,
    limit: usize,
  ) -> Result<Vec<HistoryEntry>> {
    let id_str = encode_uuid(lead_id);
    let limit = limit as i64;

    let raws: Vec<RawHistory> = self
      .with_conn(move |conn| {
        let sql = format!(
          "SELECT {} FROM lead_history WHERE lead_id = ?1 \
           ORDER BY changed_at DESC, rowid DESC LIMIT ?2",
          RawHistory::COLUMNS
        );
        let mut stmt = conn.prepare(&sql).db()?;
        stmt
          .query_map(rusqlite::params![id_str, limit], RawHistory::from_row)
          .db()?
          .collect::<rusqlite::Result<Vec<_>>>()
          .db()
      })
      .await?;

    raws.into_iter().map(RawHistory::into_entry).collect()
  }
}
