//! Flashcard review scheduling.

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::db::{self, LogOnError};
use crate::domain::{Flashcard, ReviewTier};
use crate::error::StoreError;
use crate::srs::{schedule_review, ReviewStore};
use crate::state::AppState;

use super::{json_error, store_error_response};

#[derive(Debug, Deserialize)]
pub struct DueQuery {
  pub course_id: String,
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DueResponse {
  pub course_id: String,
  pub now: DateTime<Utc>,
  pub cards: Vec<Flashcard>,
}

/// Flashcards of a course whose next show time has passed.
///
/// GET /api/review/due?course_id=...&limit=...
pub async fn due_flashcards(
  State(state): State<AppState>,
  Query(query): Query<DueQuery>,
) -> impl IntoResponse {
  let limit = query
    .limit
    .unwrap_or(config::DEFAULT_DUE_LIMIT)
    .min(config::MAX_DUE_LIMIT);
  let now = Utc::now();

  let cards = match db::try_lock(&state.db)
    .and_then(|conn| conn.fetch_due_cards(&query.course_id, now, limit))
  {
    Ok(cards) => cards,
    Err(e) => return store_error_response(e),
  };

  Json(DueResponse {
    course_id: query.course_id,
    now,
    cards,
  })
  .into_response()
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
  pub card_id: i64,
  pub tier: String,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
  pub card_id: i64,
  pub tier: ReviewTier,
  pub interval_minutes: i64,
  pub next_show: DateTime<Utc>,
  /// False when the new schedule could not be stored
  pub persisted: bool,
}

/// Rate recall of a flashcard and push its next show time forward.
///
/// The interval is returned even if storing it fails.
///
/// POST /api/review/rate
pub async fn rate_flashcard(
  State(state): State<AppState>,
  Json(request): Json<RateRequest>,
) -> impl IntoResponse {
  let tier: ReviewTier = match request.tier.parse() {
    Ok(tier) => tier,
    Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("{}", e)),
  };

  let conn = match db::try_lock(&state.db) {
    Ok(conn) => conn,
    Err(e) => return store_error_response(e),
  };

  let card = match db::get_flashcard(&conn, request.card_id) {
    Ok(Some(card)) => card,
    Ok(None) => {
      return store_error_response(StoreError::NotFound(format!("flashcard {}", request.card_id)))
    }
    Err(e) => return store_error_response(e.into()),
  };

  // A missing course or target leaves no time before the deadline
  let target = db::get_course(&conn, &card.course_id)
    .log_warn("Failed to load course")
    .flatten()
    .and_then(|course| course.target_completion);

  let scheduled = match schedule_review(target, Utc::now(), tier) {
    Ok(scheduled) => scheduled,
    Err(e) => {
      tracing::error!("Failed to schedule card {}: {}", card.id, e);
      return json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }
  };
  let persisted = conn
    .update_next_show(card.id, scheduled.next_show, tier)
    .log_warn("Failed to store review schedule")
    .is_some();

  tracing::debug!(
    "Card {} rated {}: next show in {} minutes",
    card.id,
    tier.as_str(),
    scheduled.interval_minutes
  );

  Json(RateResponse {
    card_id: card.id,
    tier,
    interval_minutes: scheduled.interval_minutes,
    next_show: scheduled.next_show,
    persisted,
  })
  .into_response()
}
