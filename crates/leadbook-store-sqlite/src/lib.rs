//! SQLite backend for the Leadbook buyer-lead store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The optimistic update protocol
//! (read, owner check, version compare, diff, audit insert, row update) runs
//! inside a single SQLite transaction.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
