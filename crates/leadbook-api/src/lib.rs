//! JSON REST API for Leadbook.
//!
//! Exposes an axum [`Router`] backed by any
//! [`leadbook_core::store::LeadStore`]. TLS and transport concerns are the
//! caller's responsibility; authentication is HTTP Basic against the
//! configured agent roster.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = leadbook_api::router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod csv;
pub mod error;
pub mod leads;
pub mod rate_limit;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use leadbook_core::store::LeadStore;
use tower_http::trace::TraceLayer;

pub use auth::{Agent, AuthConfig};
pub use error::ApiError;
pub use rate_limit::RateLimiter;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub auth:    Arc<AuthConfig>,
  pub limiter: Arc<RateLimiter>,
}

// Manual impl: `Arc` fields are clonable regardless of `S`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      auth:    self.auth.clone(),
      limiter: self.limiter.clone(),
    }
  }
}

impl<S> AppState<S> {
  /// Count one mutating request for `key` against the injected limiter.
  pub(crate) fn check_rate(&self, key: &str) -> Result<(), ApiError> {
    self.limiter.check(key).map_err(|retry| ApiError::RateLimited {
      retry_after: retry.as_secs().max(1),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LeadStore + 'static,
{
  Router::new()
    .route("/leads", get(leads::list::<S>).post(leads::create::<S>))
    .route("/leads/export", get(csv::export::<S>))
    .route("/leads/import", post(csv::import::<S>))
    .route("/leads/template", get(csv::template::<S>))
    .route(
      "/leads/{id}",
      get(leads::get_one::<S>)
        .put(leads::update::<S>)
        .delete(leads::delete_one::<S>),
    )
    .route("/leads/{id}/history", get(leads::history::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
