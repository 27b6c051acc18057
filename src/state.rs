//! Application state shared by all handlers.

use crate::attempts::AttemptStore;
use crate::db::DbPool;
use crate::quiz::{QuizAttempt, ReviewQuiz};

#[derive(Clone)]
pub struct AppState {
  /// Review-state database
  pub db: DbPool,
  /// In-flight all-or-nothing quiz attempts
  pub quizzes: AttemptStore<QuizAttempt>,
  /// In-flight review quizzes
  pub review_quizzes: AttemptStore<ReviewQuiz>,
}

impl AppState {
  pub fn new(db: DbPool) -> Self {
    Self {
      db,
      quizzes: AttemptStore::new(),
      review_quizzes: AttemptStore::new(),
    }
  }
}
