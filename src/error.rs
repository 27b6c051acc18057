//! Error types for the quiz, scheduling and storage layers.

use std::fmt;

/// Errors from the spaced-repetition scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
  /// Tier name outside {again, hard, good, easy}
  InvalidTier(String),
  /// Next show time falls outside the representable date range
  IntervalOutOfRange(i64),
}

impl fmt::Display for SchedulerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidTier(tier) => write!(
        f,
        "invalid review tier '{}': expected one of again, hard, good, easy",
        tier
      ),
      Self::IntervalOutOfRange(minutes) => {
        write!(f, "review interval of {} minutes is out of range", minutes)
      }
    }
  }
}

impl std::error::Error for SchedulerError {}

/// Misuse of a quiz state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
  QuestionOutOfRange { index: usize, len: usize },
  OptionOutOfRange { index: usize, len: usize },
  /// Attempt was already submitted; selections are frozen
  AlreadySubmitted,
  /// Question was already answered correctly (terminal)
  AlreadyCorrect,
  /// Option was rejected on an earlier attempt and cannot be selected again
  OptionRejected(usize),
  NothingSelected,
  /// No option could be resolved as correct, so the question cannot be checked
  Ungraded,
  InvalidTransition(&'static str),
}

impl QuizError {
  /// True for errors caused by the current state rather than bad arguments
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::AlreadySubmitted
        | Self::AlreadyCorrect
        | Self::OptionRejected(_)
        | Self::NothingSelected
        | Self::Ungraded
        | Self::InvalidTransition(_)
    )
  }
}

impl fmt::Display for QuizError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::QuestionOutOfRange { index, len } => {
        write!(f, "question {} out of range ({} questions)", index, len)
      }
      Self::OptionOutOfRange { index, len } => {
        write!(f, "option {} out of range ({} options)", index, len)
      }
      Self::AlreadySubmitted => write!(f, "quiz already submitted"),
      Self::AlreadyCorrect => write!(f, "question already answered correctly"),
      Self::OptionRejected(index) => write!(f, "option {} was already rejected", index),
      Self::NothingSelected => write!(f, "no option selected"),
      Self::Ungraded => write!(f, "question has no resolvable correct option"),
      Self::InvalidTransition(reason) => write!(f, "invalid transition: {}", reason),
    }
  }
}

impl std::error::Error for QuizError {}

/// Errors from the review-state store
#[derive(Debug)]
pub enum StoreError {
  Database(rusqlite::Error),
  /// Database mutex poisoned by a panicking holder
  Unavailable,
  NotFound(String),
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Database(e) => write!(f, "database error: {}", e),
      Self::Unavailable => write!(f, "database unavailable"),
      Self::NotFound(what) => write!(f, "{} not found", what),
    }
  }
}

impl std::error::Error for StoreError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Database(e) => Some(e),
      _ => None,
    }
  }
}

impl From<rusqlite::Error> for StoreError {
  fn from(err: rusqlite::Error) -> Self {
    StoreError::Database(err)
  }
}
