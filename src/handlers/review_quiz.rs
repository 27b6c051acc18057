//! Per-question review quizzes.
//!
//! Each question is checked on its own. A wrong answer eliminates that option
//! and the learner may try again among the rest. Correct answers are stored
//! as question progress; a storage failure never blocks the learner.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;

use crate::db::{self, LogOnError};
use crate::error::QuizError;
use crate::quiz::{resolve_question, ReviewPhase, ReviewQuiz, ShuffleMapping};
use crate::state::AppState;

use super::quiz::StartQuizRequest;
use super::{
  attempt_not_found, json_error, option_views, quiz_error_response, OptionView, QuestionRequest,
  SelectRequest,
};

#[derive(Debug, Serialize)]
pub struct ReviewQuestionView {
  pub index: usize,
  pub id: String,
  pub prompt: String,
  pub phase: &'static str,
  /// Displayed position of the selected or checked option
  pub selected: Option<usize>,
  /// Displayed positions eliminated by wrong answers
  pub rejected: Vec<usize>,
  /// Displayed positions still selectable
  pub remaining: Vec<usize>,
  pub flagged: bool,
  pub attempts: u32,
  pub options: Vec<OptionView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewQuizView {
  pub attempt_id: String,
  pub course_id: Option<String>,
  pub lesson_id: Option<String>,
  pub completed: bool,
  pub correct_count: usize,
  pub total: usize,
  pub flagged: Vec<String>,
  pub questions: Vec<ReviewQuestionView>,
}

fn phase_parts(phase: ReviewPhase) -> (&'static str, Option<usize>) {
  match phase {
    ReviewPhase::Unanswered => ("unanswered", None),
    ReviewPhase::Selected(option) => ("selected", Some(option)),
    ReviewPhase::Correct(option) => ("correct", Some(option)),
    ReviewPhase::Incorrect(option) => ("incorrect", Some(option)),
  }
}

/// Map original positions to sorted displayed positions
fn displayed_positions(
  originals: impl IntoIterator<Item = usize>,
  mapping: &ShuffleMapping,
) -> Vec<usize> {
  let mut positions: Vec<usize> = originals
    .into_iter()
    .filter_map(|original| mapping.shuffled_index(original))
    .collect();
  positions.sort_unstable();
  positions
}

fn review_view(attempt_id: &str, quiz: &ReviewQuiz) -> Result<ReviewQuizView, QuizError> {
  let questions = quiz
    .questions()
    .iter()
    .enumerate()
    .map(|(index, question)| {
      let state = quiz.state(index)?;
      let mapping = quiz.mapping(index)?;
      let (phase, selected) = phase_parts(state.phase);
      let reveal = matches!(state.phase, ReviewPhase::Correct(_));

      Ok(ReviewQuestionView {
        index,
        id: question.id.clone(),
        prompt: question.prompt.clone(),
        phase,
        selected: selected.and_then(|original| mapping.shuffled_index(original)),
        rejected: displayed_positions(state.rejected.iter().copied(), &mapping),
        remaining: displayed_positions(quiz.remaining_options(index)?, &mapping),
        flagged: state.flagged,
        attempts: state.attempts,
        options: option_views(quiz.displayed_options(index)?, reveal),
        explanation: if reveal { question.explanation.clone() } else { None },
      })
    })
    .collect::<Result<Vec<_>, QuizError>>()?;

  Ok(ReviewQuizView {
    attempt_id: attempt_id.to_string(),
    course_id: quiz.course_id().map(str::to_string),
    lesson_id: quiz.lesson_id().map(str::to_string),
    completed: quiz.is_completed(),
    correct_count: quiz.correct_count(),
    total: questions.len(),
    flagged: quiz.flagged_questions(),
    questions,
  })
}

fn view_response(result: Option<Result<ReviewQuizView, QuizError>>) -> Response {
  match result {
    Some(Ok(view)) => Json(view).into_response(),
    Some(Err(e)) => quiz_error_response(e),
    None => attempt_not_found(),
  }
}

/// Store a question's progress; failures are logged and reported as `false`
fn persist_progress(state: &AppState, view: &ReviewQuizView, question_index: usize) -> bool {
  let Some(question) = view.questions.get(question_index) else {
    return false;
  };
  let Some(conn) = db::try_lock(&state.db).log_warn("Failed to lock review store") else {
    return false;
  };
  db::record_question_progress(
    &conn,
    view.course_id.as_deref().unwrap_or_default(),
    view.lesson_id.as_deref().unwrap_or_default(),
    &question.id,
    question.phase == "correct",
    question.flagged,
  )
  .log_warn("Failed to record question progress")
  .is_some()
}

/// Start a review quiz over the given questions.
///
/// POST /api/review-quiz
pub async fn start_review_quiz(
  State(state): State<AppState>,
  Json(request): Json<StartQuizRequest>,
) -> impl IntoResponse {
  if request.questions.is_empty() {
    return json_error(StatusCode::BAD_REQUEST, "A quiz needs at least one question");
  }

  let questions = request.questions.iter().map(resolve_question).collect();
  let quiz = ReviewQuiz::new(
    questions,
    request.course_id.as_deref(),
    request.lesson_id.as_deref(),
  );
  let id = state.review_quizzes.insert(quiz);
  tracing::debug!("Started review quiz {}", id);

  match state.review_quizzes.with_attempt(&id, |quiz| review_view(&id, quiz)) {
    Some(Ok(view)) => (StatusCode::CREATED, Json(view)).into_response(),
    other => view_response(other),
  }
}

/// GET /api/review-quiz/{id}
pub async fn get_review_quiz(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  view_response(state.review_quizzes.with_attempt(&id, |quiz| review_view(&id, quiz)))
}

/// POST /api/review-quiz/{id}/select
pub async fn select_review_option(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<SelectRequest>,
) -> impl IntoResponse {
  view_response(state.review_quizzes.with_attempt(&id, |quiz| {
    quiz.select(request.question_index, request.option_index)?;
    review_view(&id, quiz)
  }))
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
  pub correct: bool,
  pub newly_correct: bool,
  /// Progress stored for a newly correct answer
  pub persisted: bool,
  pub quiz: ReviewQuizView,
}

/// Check the selected option of one question.
///
/// POST /api/review-quiz/{id}/check
pub async fn check_review_answer(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
  let result = state.review_quizzes.with_attempt(&id, |quiz| {
    let outcome = quiz.check(request.question_index)?;
    Ok::<_, QuizError>((outcome, review_view(&id, quiz)?))
  });

  let (outcome, view) = match result {
    Some(Ok(checked)) => checked,
    Some(Err(e)) => return quiz_error_response(e),
    None => return attempt_not_found(),
  };

  let persisted = outcome.newly_correct && persist_progress(&state, &view, request.question_index);
  if outcome.newly_correct {
    tracing::debug!(
      "Question {} answered correctly after {} attempts",
      outcome.question_id,
      view.questions[request.question_index].attempts
    );
  }

  Json(CheckResponse {
    correct: outcome.correct,
    newly_correct: outcome.newly_correct,
    persisted,
    quiz: view,
  })
  .into_response()
}

/// Reopen selection after a wrong answer.
///
/// POST /api/review-quiz/{id}/try-again
pub async fn try_review_again(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
  view_response(state.review_quizzes.with_attempt(&id, |quiz| {
    quiz.try_again(request.question_index)?;
    review_view(&id, quiz)
  }))
}

/// Toggle "review later" on a correctly answered question.
///
/// POST /api/review-quiz/{id}/flag
pub async fn toggle_review_flag(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(request): Json<QuestionRequest>,
) -> impl IntoResponse {
  let result = state.review_quizzes.with_attempt(&id, |quiz| {
    quiz.toggle_flag(request.question_index)?;
    review_view(&id, quiz)
  });

  match result {
    Some(Ok(view)) => {
      persist_progress(&state, &view, request.question_index);
      Json(view).into_response()
    }
    other => view_response(other),
  }
}

#[cfg(test)]
mod tests {
  use crate::db;
  use crate::testing::test_server_with_pool;
  use axum::http::StatusCode;
  use serde_json::{json, Value};

  fn review_request() -> Value {
    json!({
      "course_id": "c1",
      "lesson_id": "l1",
      "questions": [
        {
          "id": "q1",
          "prompt": "Capital of France?",
          "options": ["Paris", "London", "Berlin", "Madrid"],
          "correct_answer": "Paris",
          "explanation": "Since 987."
        }
      ]
    })
  }

  async fn start(server: &axum_test::TestServer) -> String {
    let response = server.post("/api/review-quiz").json(&review_request()).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["attempt_id"].as_str().unwrap().to_string()
  }

  #[tokio::test]
  async fn test_wrong_then_right() {
    let (_temp, pool, server) = test_server_with_pool();
    let id = start(&server).await;

    // Displayed order is Berlin, Madrid, London, Paris
    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 0}))
      .await
      .assert_status_ok();
    let response = server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["correct"], false);
    assert_eq!(body["persisted"], false);
    let q1 = &body["quiz"]["questions"][0];
    assert_eq!(q1["phase"], "incorrect");
    assert_eq!(q1["rejected"], json!([0]));
    assert_eq!(q1["remaining"], json!([1, 2, 3]));
    assert!(q1["options"][3].get("correct").is_none());

    // An incorrect answer has to be reopened before choosing again
    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 3}))
      .await
      .assert_status(StatusCode::CONFLICT);

    // Eliminated options cannot be picked again
    server
      .post(&format!("/api/review-quiz/{}/try-again", id))
      .json(&json!({"question_index": 0}))
      .await
      .assert_status_ok();
    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 0}))
      .await
      .assert_status(StatusCode::CONFLICT);

    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 3}))
      .await
      .assert_status_ok();
    let body: Value = server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await
      .json();
    assert_eq!(body["correct"], true);
    assert_eq!(body["newly_correct"], true);
    assert_eq!(body["persisted"], true);
    assert_eq!(body["quiz"]["completed"], true);

    // Completed quizzes render in original order
    let q1 = &body["quiz"]["questions"][0];
    assert_eq!(q1["options"][0]["text"], "Paris");
    assert_eq!(q1["options"][0]["correct"], true);
    assert_eq!(q1["selected"], 0);
    assert_eq!(q1["rejected"], json!([2]));
    assert_eq!(q1["attempts"], 2);
    assert_eq!(q1["explanation"], "Since 987.");

    let conn = pool.lock().unwrap();
    let progress = db::get_question_progress(&conn, "c1", "l1", "q1").unwrap().unwrap();
    assert!(progress.answered_correctly);
    assert!(!progress.flagged);
  }

  #[tokio::test]
  async fn test_flag_after_correct() {
    let (_temp, pool, server) = test_server_with_pool();
    let id = start(&server).await;

    // Flagging is only possible once answered correctly
    server
      .post(&format!("/api/review-quiz/{}/flag", id))
      .json(&json!({"question_index": 0}))
      .await
      .assert_status(StatusCode::CONFLICT);

    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 3}))
      .await
      .assert_status_ok();
    server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await
      .assert_status_ok();

    let body: Value = server
      .post(&format!("/api/review-quiz/{}/flag", id))
      .json(&json!({"question_index": 0}))
      .await
      .json();
    assert_eq!(body["flagged"], json!(["q1"]));
    assert_eq!(body["questions"][0]["flagged"], true);

    {
      let conn = pool.lock().unwrap();
      let progress = db::get_question_progress(&conn, "c1", "l1", "q1").unwrap().unwrap();
      assert!(progress.flagged);
    }

    // Re-checking a correct answer does not store it again
    let body: Value = server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await
      .json();
    assert_eq!(body["correct"], true);
    assert_eq!(body["newly_correct"], false);
    assert_eq!(body["persisted"], false);
  }

  #[tokio::test]
  async fn test_check_without_selection() {
    let (_temp, _pool, server) = test_server_with_pool();
    let id = start(&server).await;
    server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await
      .assert_status(StatusCode::CONFLICT);
    server
      .post("/api/review-quiz/unknown/check")
      .json(&json!({"question_index": 0}))
      .await
      .assert_status(StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn test_store_failure_does_not_block_answer() {
    let (_temp, pool, server) = test_server_with_pool();
    pool
      .lock()
      .unwrap()
      .execute("DROP TABLE question_progress", [])
      .unwrap();
    let id = start(&server).await;

    server
      .post(&format!("/api/review-quiz/{}/select", id))
      .json(&json!({"question_index": 0, "option_index": 3}))
      .await
      .assert_status_ok();
    let response = server
      .post(&format!("/api/review-quiz/{}/check", id))
      .json(&json!({"question_index": 0}))
      .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["correct"], true);
    assert_eq!(body["persisted"], false);
  }
}
