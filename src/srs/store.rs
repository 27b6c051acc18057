use chrono::{DateTime, Utc};

use crate::domain::{Flashcard, ReviewTier};
use crate::error::StoreError;

/// Persistence for flashcard review state.
///
/// The scheduler only ever needs two things from storage: which cards are due,
/// and a way to push a card's next show time forward.
pub trait ReviewStore {
  fn fetch_due_cards(
    &self,
    course_id: &str,
    now: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<Flashcard>, StoreError>;

  fn update_next_show(
    &self,
    card_id: i64,
    next_show: DateTime<Utc>,
    tier: ReviewTier,
  ) -> Result<(), StoreError>;
}
