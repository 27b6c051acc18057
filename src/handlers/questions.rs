//! Stateless question utilities: answer resolution, option shuffling and
//! review interval computation.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::domain::RawQuestion;
use crate::quiz::{
  resolve_correct_index, resolve_correct_option, resolve_question, shuffle_options, shuffle_seed,
};
use crate::srs::compute_review_interval_named;

use super::{json_error, option_views, OptionView};

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
  pub question_id: String,
  pub correct_option_id: Option<String>,
  pub correct_index: Option<usize>,
}

/// Resolve which option of a raw question is correct.
///
/// POST /api/questions/resolve
pub async fn resolve_question_handler(Json(raw): Json<RawQuestion>) -> impl IntoResponse {
  let response = ResolveResponse {
    question_id: raw.id(),
    correct_option_id: resolve_correct_option(&raw),
    correct_index: resolve_correct_index(&raw),
  };
  if response.correct_index.is_none() {
    tracing::debug!("No correct option resolved for question {}", response.question_id);
  }
  Json(response)
}

#[derive(Debug, Deserialize)]
pub struct ShuffleRequest {
  pub question: RawQuestion,
  pub course_id: Option<String>,
  pub lesson_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShuffleResponse {
  pub question_id: String,
  pub seed: String,
  pub options: Vec<OptionView>,
  pub to_original: Vec<usize>,
  pub to_shuffled: Vec<usize>,
}

/// Display order of a question's options for a course and lesson.
///
/// POST /api/questions/shuffle
pub async fn shuffle_question(Json(request): Json<ShuffleRequest>) -> impl IntoResponse {
  let question = resolve_question(&request.question);
  let seed = shuffle_seed(
    &question.id,
    request.course_id.as_deref(),
    request.lesson_id.as_deref(),
  );
  let shuffled = shuffle_options(&question.options, &seed);

  Json(ShuffleResponse {
    question_id: question.id,
    seed,
    options: option_views(shuffled.options, false),
    to_original: shuffled.mapping.to_original,
    to_shuffled: shuffled.mapping.to_shuffled,
  })
}

#[derive(Debug, Deserialize)]
pub struct IntervalRequest {
  pub seconds_remaining: f64,
  pub tier: String,
}

/// Minutes until a card rated `tier` is shown again.
///
/// POST /api/review/interval
pub async fn compute_interval(Json(request): Json<IntervalRequest>) -> impl IntoResponse {
  match compute_review_interval_named(request.seconds_remaining, &request.tier) {
    Ok(minutes) => Json(serde_json::json!({
      "tier": request.tier,
      "interval_minutes": minutes,
    }))
    .into_response(),
    Err(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
  }
}
