//! HTTP Basic-auth extractor over a configured agent roster.
//!
//! The username is the agent's opaque id; the password is verified against
//! that agent's argon2 PHC hash. Handlers receive the id as [`Actor`] and
//! thread it through to the store — credentials never travel further than
//! this module.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use leadbook_core::store::LeadStore;

use crate::{AppState, error::ApiError};

/// One agent allowed to use the API.
#[derive(Clone)]
pub struct Agent {
  /// Opaque user id; becomes `owner_id` / `changed_by` on records.
  pub id:            String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The roster of accepted credentials for this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub agents: Vec<Agent>,
}

/// The authenticated agent's id, extracted from the request.
pub struct Actor(pub String);

/// Verify credentials directly from headers and return the agent id.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds =
    std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let agent = config
    .agents
    .iter()
    .find(|a| a.id == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&agent.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(agent.id.clone())
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: LeadStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Actor)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::http::{Request, header};
  use rand_core::OsRng;

  use super::*;
  use crate::rate_limit::RateLimiter;

  // A minimal no-op store for testing auth only.
  #[derive(Clone)]
  struct NoopStore;

  impl LeadStore for NoopStore {
    async fn create_lead(
      &self,
      _: leadbook_core::lead::NewLead,
    ) -> leadbook_core::Result<leadbook_core::lead::Lead> {
      unimplemented!()
    }
    async fn get_lead(
      &self,
      _: uuid::Uuid,
    ) -> leadbook_core::Result<Option<leadbook_core::lead::Lead>> {
      unimplemented!()
    }
    async fn update_lead(
      &self,
      _: uuid::Uuid,
      _: i64,
      _: leadbook_core::lead::LeadFields,
      _: &str,
    ) -> leadbook_core::Result<leadbook_core::lead::Lead> {
      unimplemented!()
    }
    async fn delete_lead(
      &self,
      _: uuid::Uuid,
      _: &str,
    ) -> leadbook_core::Result<()> {
      unimplemented!()
    }
    async fn list_leads(
      &self,
      _: &leadbook_core::store::LeadQuery,
    ) -> leadbook_core::Result<leadbook_core::store::LeadPage> {
      unimplemented!()
    }
    async fn history(
      &self,
      _: uuid::Uuid,
      _: usize,
    ) -> leadbook_core::Result<Vec<leadbook_core::history::HistoryEntry>> {
      unimplemented!()
    }
  }

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn make_state(agent: &str, password: &str) -> AppState<NoopStore> {
    AppState {
      store:   Arc::new(NoopStore),
      auth:    Arc::new(AuthConfig {
        agents: vec![Agent {
          id:            agent.to_string(),
          password_hash: hash(password),
        }],
      }),
      limiter: Arc::new(RateLimiter::unlimited()),
    }
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<NoopStore>,
  ) -> Result<Actor, ApiError> {
    let (mut parts, _) = req.into_parts();
    Actor::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[tokio::test]
  async fn correct_credentials_yield_agent_id() {
    let state = make_state("agent-1", "secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("agent-1", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    let actor = extract(req, &state).await.unwrap();
    assert_eq!(actor.0, "agent-1");
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state("agent-1", "secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("agent-1", "wrong"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn unknown_agent() {
    let state = make_state("agent-1", "secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("agent-9", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state("agent-1", "secret");
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state("agent-1", "secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }
}
