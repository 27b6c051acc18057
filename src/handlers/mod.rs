pub mod questions;
pub mod quiz;
pub mod review;
pub mod review_quiz;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::{QuizError, StoreError};
use crate::quiz::ShuffledOption;
use crate::state::AppState;

pub use questions::{compute_interval, resolve_question_handler, shuffle_question};
pub use quiz::{clear_quiz_selection, get_quiz, select_quiz_option, start_quiz, submit_quiz};
pub use review::{due_flashcards, rate_flashcard};
pub use review_quiz::{
  check_review_answer, get_review_quiz, select_review_option, start_review_quiz, toggle_review_flag,
  try_review_again,
};

/// Build the API router
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/api/questions/resolve", post(resolve_question_handler))
    .route("/api/questions/shuffle", post(shuffle_question))
    .route("/api/review/interval", post(compute_interval))
    .route("/api/review/due", get(due_flashcards))
    .route("/api/review/rate", post(rate_flashcard))
    .route("/api/quiz", post(start_quiz))
    .route("/api/quiz/{id}", get(get_quiz))
    .route("/api/quiz/{id}/select", post(select_quiz_option))
    .route("/api/quiz/{id}/clear", post(clear_quiz_selection))
    .route("/api/quiz/{id}/submit", post(submit_quiz))
    .route("/api/review-quiz", post(start_review_quiz))
    .route("/api/review-quiz/{id}", get(get_review_quiz))
    .route("/api/review-quiz/{id}/select", post(select_review_option))
    .route("/api/review-quiz/{id}/check", post(check_review_answer))
    .route("/api/review-quiz/{id}/try-again", post(try_review_again))
    .route("/api/review-quiz/{id}/flag", post(toggle_review_flag))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `{"error": message}` with the given status
pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
  (
    status,
    Json(serde_json::json!({
      "error": message.into()
    })),
  )
    .into_response()
}

pub(crate) fn quiz_error_response(err: QuizError) -> Response {
  let status = if err.is_conflict() {
    StatusCode::CONFLICT
  } else {
    StatusCode::BAD_REQUEST
  };
  json_error(status, err.to_string())
}

pub(crate) fn store_error_response(err: StoreError) -> Response {
  match err {
    StoreError::NotFound(what) => json_error(StatusCode::NOT_FOUND, format!("{} not found", what)),
    other => {
      tracing::error!("Store failure: {}", other);
      json_error(StatusCode::INTERNAL_SERVER_ERROR, "Review store unavailable")
    }
  }
}

pub(crate) fn attempt_not_found() -> Response {
  json_error(StatusCode::NOT_FOUND, "Quiz attempt not found or expired")
}

/// Selection of a displayed option within a question
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
  pub question_index: usize,
  /// Position in the order the options are displayed
  pub option_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
  pub question_index: usize,
}

/// Option as sent to the client. Correctness and explanations stay hidden until revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
  pub position: usize,
  pub letter: String,
  pub id: String,
  pub text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub correct: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

pub(crate) fn option_views(options: Vec<ShuffledOption>, reveal: bool) -> Vec<OptionView> {
  options
    .into_iter()
    .enumerate()
    .map(|(position, shuffled)| OptionView {
      position,
      letter: shuffled.letter,
      id: shuffled.option.id,
      text: shuffled.option.text,
      correct: reveal.then_some(shuffled.option.correct),
      explanation: if reveal { shuffled.option.explanation } else { None },
    })
    .collect()
}
