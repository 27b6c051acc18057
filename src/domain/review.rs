use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SchedulerError;

/// Self-rated recall confidence for a flashcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTier {
  Again,
  Hard,
  Good,
  Easy,
}

impl ReviewTier {
  pub const ALL: [ReviewTier; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "again",
      Self::Hard => "hard",
      Self::Good => "good",
      Self::Easy => "easy",
    }
  }

  pub fn is_recalled(&self) -> bool {
    !matches!(self, Self::Again)
  }
}

impl FromStr for ReviewTier {
  type Err = SchedulerError;

  /// Case-sensitive; anything else is rejected rather than defaulted
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "again" => Ok(Self::Again),
      "hard" => Ok(Self::Hard),
      "good" => Ok(Self::Good),
      "easy" => Ok(Self::Easy),
      other => Err(SchedulerError::InvalidTier(other.to_string())),
    }
  }
}

/// Course with an optional target completion date that drives review spacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub id: String,
  pub title: String,
  pub target_completion: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
  pub id: i64,
  pub course_id: String,
  pub front: String,
  pub back: String,
  pub next_show_timestamp: DateTime<Utc>,
  pub review_count: i64,
  pub last_tier: Option<ReviewTier>,
}

impl Flashcard {
  /// New card, due immediately
  pub fn new(course_id: &str, front: &str, back: &str) -> Self {
    Self {
      id: 0,
      course_id: course_id.to_string(),
      front: front.to_string(),
      back: back.to_string(),
      next_show_timestamp: Utc::now(),
      review_count: 0,
      last_tier: None,
    }
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_show_timestamp <= now
  }
}
