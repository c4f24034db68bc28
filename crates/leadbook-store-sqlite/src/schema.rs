//! SQL schema for the Leadbook SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS leads (
    lead_id       TEXT PRIMARY KEY,
    full_name     TEXT NOT NULL,
    email         TEXT,
    phone         TEXT NOT NULL,
    city          TEXT NOT NULL,
    property_type TEXT NOT NULL,
    bhk           TEXT,              -- NULL unless residential
    purpose       TEXT NOT NULL,
    budget_min    INTEGER,
    budget_max    INTEGER,
    timeline      TEXT NOT NULL,
    source        TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'New',
    notes         TEXT,
    tags          TEXT NOT NULL DEFAULT '[]',   -- JSON array, order preserved
    owner_id      TEXT NOT NULL,
    version       INTEGER NOT NULL DEFAULT 1,   -- optimistic-concurrency token
    updated_at    TEXT NOT NULL                 -- ISO 8601 UTC
);

-- History rows are strictly append-only. No UPDATE is ever issued against
-- this table; rows leave only via the lead-delete cascade.
CREATE TABLE IF NOT EXISTS lead_history (
    history_id TEXT PRIMARY KEY,
    lead_id    TEXT NOT NULL REFERENCES leads(lead_id) ON DELETE CASCADE,
    changed_by TEXT NOT NULL,
    changed_at TEXT NOT NULL,
    payload    TEXT NOT NULL        -- JSON: {\"kind\":\"created\"} or {\"kind\":\"updated\",\"diff\":{...}}
);

CREATE INDEX IF NOT EXISTS leads_owner_idx        ON leads(owner_id);
CREATE INDEX IF NOT EXISTS leads_status_idx       ON leads(status);
CREATE INDEX IF NOT EXISTS leads_updated_idx      ON leads(updated_at);
CREATE INDEX IF NOT EXISTS lead_history_lead_idx  ON lead_history(lead_id, changed_at);

PRAGMA user_version = 1;
";
