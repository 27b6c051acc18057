//! All-or-nothing quiz attempts.
//!
//! Options are shown shuffled and selected by displayed position. Nothing
//! about correctness leaves the server until the attempt is submitted.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::RawQuestion;
use crate::error::QuizError;
use crate::quiz::{resolve_question, AttemptStatus, QuestionPhase, QuizAttempt, QuizOutcome};
use crate::state::AppState;

use super::{
  attempt_not_found, json_error, option_views, quiz_error_response, OptionView, QuestionRequest,
  SelectRequest,
};

#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
  pub course_id: Option<String>,
  pub lesson_id: Option<String>,
  pub questions: Vec<RawQuestion>,
}

#[derive(Debug, Serialize)]
pub struct QuizQuestionView {
  pub index: usize,
  pub id: String,
  pub prompt: String,
  pub state: QuestionPhase,
  /// Displayed position of the selection
  pub selected: Option<usize>,
  pub options: Vec<OptionView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizView {
  pub attempt_id: String,
  pub status: AttemptStatus,
  pub course_id: Option<String>,
  pub lesson_id: Option<String>,
  pub answered: usize,
  pub total: usize,
  pub questions: Vec<QuizQuestionView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub outcome: Option<QuizOutcome>,
}

fn quiz_view(attempt_id: &str, attempt: &QuizAttempt) -> Result<QuizView, QuizError> {
  let reveal = attempt.is_submitted();
  let questions = attempt
    .questions()
    .iter()
    .enumerate()
    .map(|(index, question)| {
      Ok(QuizQuestionView {
        index,
        id: question.id.clone(),
        prompt: question.prompt.clone(),
        state: attempt.phase(index)?,
        selected: attempt.displayed_selection(index),
        options: option_views(attempt.displayed_options(index)?, reveal),
        explanation: if reveal { question.explanation.clone() } else { None },
      })
    })
    .collect::<Result<Vec<_>, QuizError>>()?;

  Ok(QuizView {
    attempt_id: attempt_id.to_string(),
    status: attempt.status(),
    course_id: attempt.course_id().map(str::to_string),
    lesson_id: attempt.lesson_id().map(str::to_string),
    answered: attempt.answered_count(),
    total: questions.len(),
    questions,
    outcome: attempt.outcome(),
  })
}

fn view_response(result: Option<Result<QuizView, QuizError>>) -> Response {
  match result {
    Some(Ok(view)) => Json(view).into_response(),
    Some(Err(e)) => quiz_error_response(e),
    None => attempt_not_found(),
  }
}

/// Start a quiz over the given questions.
///
/// POST /api/quiz
pub async fn start_quiz(
  State(state): State<AppState>,
  Json(request): Json<StartQuizRequest>,
) -> impl IntoResponse {
  if request.questions.is_empty() {
    return json_error(StatusCode::BAD_REQUEST, "A quiz needs at least one question");
  }

  let questions = request.questions.iter().map(resolve_question).collect();
  let attempt = QuizAttempt::new(
    questions,
    request.course_id.as_deref(),
    request.lesson_id.as_deref(),
  );
  let id = state.quizzes.insert(attempt);
  tracing::debug!("Started quiz attempt {}", id);

  match state.quizzes.with_attempt(&id, |attempt| quiz_view(&id, attempt)) {
    Some(Ok(view)) => (StatusCode::CREATED, Json(view)).into_response(),
    other => view_response(other),
  }
}

/// GET /api/quiz/{id}
pub async fn get_quiz(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
  view_response(state.quizzes.with_attempt(&id, |attempt| quiz_view(&id, attempt)))
}

/// Select the option at a displayed position.
///
/// POST /api/quiz/{id}/select
pub async fn select_quiz_option(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<SelectRequest>,
) -> impl IntoResponse {
  view_response(state.quizzes.with_attempt(&id, |attempt| {
    attempt.select(request.question_index, request.option_index)?;
    quiz_view(&id, attempt)
  }))
}

/// Withdraw the answer to a question.
///
/// POST /api/quiz/{id}/clear
pub async fn clear_quiz_selection(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
  view_response(state.quizzes.with_attempt(&id, |attempt| {
    attempt.clear_selection(request.question_index)?;
    quiz_view(&id, attempt)
  }))
}

/// Submit the attempt; every question is revealed in original order.
///
/// POST /api/quiz/{id}/submit
pub async fn submit_quiz(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
  view_response(state.quizzes.with_attempt(&id, |attempt| {
    let outcome = attempt.submit()?;
    tracing::info!(
      "Quiz {} submitted: {}/{} correct",
      id,
      outcome.score,
      outcome.graded
    );
    quiz_view(&id, attempt)
  }))
}
