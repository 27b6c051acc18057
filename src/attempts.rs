//! In-memory storage for in-flight quiz attempts.
//!
//! Attempts are keyed by a random id handed to the client. Entries expire
//! after a configurable period without access.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config;

/// Attempt entry with last access time for expiration
struct AttemptEntry<T> {
  attempt: T,
  last_access: DateTime<Utc>,
}

/// Shared map of attempt id to attempt state
pub struct AttemptStore<T> {
  inner: Arc<Mutex<HashMap<String, AttemptEntry<T>>>>,
}

impl<T> Clone for AttemptStore<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T> Default for AttemptStore<T> {
  fn default() -> Self {
    Self {
      inner: Arc::new(Mutex::new(HashMap::new())),
    }
  }
}

impl<T> AttemptStore<T> {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, AttemptEntry<T>>> {
    // Entries are plain data; a panic mid-update cannot leave them half-written
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Store a new attempt and return its id
  pub fn insert(&self, attempt: T) -> String {
    let id = generate_attempt_id();
    let mut attempts = self.lock();
    attempts.insert(
      id.clone(),
      AttemptEntry {
        attempt,
        last_access: Utc::now(),
      },
    );
    id
  }

  /// Run `f` against an attempt, refreshing its last access time.
  /// Returns `None` for unknown or expired ids.
  pub fn with_attempt<R>(&self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
    let mut attempts = self.lock();

    // Clean up expired attempts occasionally (~10% chance)
    if rand::random::<u8>() < config::ATTEMPT_CLEANUP_THRESHOLD {
      cleanup_expired(&mut attempts, Utc::now());
    }

    let entry = attempts.get_mut(id)?;
    if is_expired(entry.last_access, Utc::now()) {
      attempts.remove(id);
      return None;
    }
    entry.last_access = Utc::now();
    Some(f(&mut entry.attempt))
  }

  pub fn remove(&self, id: &str) -> Option<T> {
    self.lock().remove(id).map(|entry| entry.attempt)
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }
}

fn is_expired(last_access: DateTime<Utc>, now: DateTime<Utc>) -> bool {
  last_access <= now - Duration::hours(config::ATTEMPT_EXPIRY_HOURS)
}

/// Drop attempts not accessed within the expiry window
fn cleanup_expired<T>(attempts: &mut HashMap<String, AttemptEntry<T>>, now: DateTime<Utc>) {
  let before = attempts.len();
  attempts.retain(|_, entry| !is_expired(entry.last_access, now));
  let removed = before - attempts.len();
  if removed > 0 {
    tracing::debug!("Expired {} quiz attempts", removed);
  }
}

/// Generate a new attempt id
pub fn generate_attempt_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
