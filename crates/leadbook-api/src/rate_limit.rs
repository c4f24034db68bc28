//! Fixed-window rate limiting for mutating endpoints.
//!
//! The limiter is an explicit value injected through [`crate::AppState`] —
//! never a module-level singleton — holding a mapping from client key to
//! `{count, window-reset-time}`. Expired windows are swept on access, so the
//! map never outgrows the set of clients active in the current window.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

struct Window {
  count:    u32,
  resets_at: Instant,
}

pub struct RateLimiter {
  window:  Duration,
  budget:  u32,
  buckets: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
  /// `budget` requests per `window`, per client key.
  pub fn new(window: Duration, budget: u32) -> Self {
    Self { window, budget, buckets: Mutex::new(HashMap::new()) }
  }

  /// A limiter that never denies — for tests and single-user setups.
  pub fn unlimited() -> Self {
    Self::new(Duration::from_secs(60), u32::MAX)
  }

  /// Count one request for `key`.
  ///
  /// # Errors
  ///
  /// Denied requests get the time remaining until the window resets.
  pub fn check(&self, key: &str) -> Result<(), Duration> {
    let now = Instant::now();
    let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

    // Sweep: drop every expired window, not just the caller's.
    buckets.retain(|_, w| w.resets_at > now);

    let window = buckets.entry(key.to_owned()).or_insert(Window {
      count:    0,
      resets_at: now + self.window,
    });

    if window.count >= self.budget {
      return Err(window.resets_at.saturating_duration_since(now));
    }
    window.count += 1;
    Ok(())
  }
}
