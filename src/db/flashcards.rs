//! Courses and flashcard review state

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Course, Flashcard, ReviewTier};
use crate::error::StoreError;
use crate::srs::ReviewStore;

use super::{format_timestamp, parse_timestamp};

pub fn insert_course(conn: &Connection, course: &Course) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO courses (id, title, target_completion) VALUES (?1, ?2, ?3)
    ON CONFLICT(id) DO UPDATE SET title = excluded.title, target_completion = excluded.target_completion
    "#,
    params![
      course.id,
      course.title,
      course.target_completion.map(format_timestamp),
    ],
  )?;
  Ok(())
}

pub fn get_course(conn: &Connection, id: &str) -> Result<Option<Course>> {
  conn
    .query_row(
      "SELECT id, title, target_completion FROM courses WHERE id = ?1",
      params![id],
      |row| {
        let target: Option<String> = row.get(2)?;
        Ok(Course {
          id: row.get(0)?,
          title: row.get(1)?,
          target_completion: target.as_deref().and_then(parse_timestamp),
        })
      },
    )
    .optional()
}

pub fn insert_flashcard(conn: &Connection, card: &Flashcard) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO flashcards (course_id, front, back, next_show_timestamp, review_count, last_tier)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
    params![
      card.course_id,
      card.front,
      card.back,
      format_timestamp(card.next_show_timestamp),
      card.review_count,
      card.last_tier.map(|t| t.as_str()),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

fn row_to_flashcard(row: &Row) -> Result<Flashcard> {
  let next_show: String = row.get(4)?;
  let last_tier: Option<String> = row.get(6)?;
  Ok(Flashcard {
    id: row.get(0)?,
    course_id: row.get(1)?,
    front: row.get(2)?,
    back: row.get(3)?,
    // Unparseable timestamps surface as due now rather than failing the query
    next_show_timestamp: parse_timestamp(&next_show).unwrap_or_else(Utc::now),
    review_count: row.get(5)?,
    last_tier: last_tier.and_then(|t| t.parse().ok()),
  })
}

pub fn get_flashcard(conn: &Connection, id: i64) -> Result<Option<Flashcard>> {
  conn
    .query_row(
      r#"
      SELECT id, course_id, front, back, next_show_timestamp, review_count, last_tier
      FROM flashcards WHERE id = ?1
      "#,
      params![id],
      row_to_flashcard,
    )
    .optional()
}

/// Cards of a course whose next show time has passed, oldest first
pub fn get_due_flashcards(
  conn: &Connection,
  course_id: &str,
  now: DateTime<Utc>,
  limit: usize,
) -> Result<Vec<Flashcard>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, course_id, front, back, next_show_timestamp, review_count, last_tier
    FROM flashcards
    WHERE course_id = ?1 AND next_show_timestamp <= ?2
    ORDER BY next_show_timestamp ASC, id ASC
    LIMIT ?3
    "#,
  )?;

  let cards = stmt
    .query_map(
      params![course_id, format_timestamp(now), limit as i64],
      row_to_flashcard,
    )?
    .collect::<Result<Vec<_>>>()?;
  Ok(cards)
}

/// Move a card's next show time and count the review; returns rows touched
pub fn update_flashcard_schedule(
  conn: &Connection,
  card_id: i64,
  next_show: DateTime<Utc>,
  tier: ReviewTier,
) -> Result<usize> {
  conn.execute(
    r#"
    UPDATE flashcards
    SET next_show_timestamp = ?1, review_count = review_count + 1, last_tier = ?2
    WHERE id = ?3
    "#,
    params![format_timestamp(next_show), tier.as_str(), card_id],
  )
}

impl ReviewStore for Connection {
  fn fetch_due_cards(
    &self,
    course_id: &str,
    now: DateTime<Utc>,
    limit: usize,
  ) -> std::result::Result<Vec<Flashcard>, StoreError> {
    Ok(get_due_flashcards(self, course_id, now, limit)?)
  }

  fn update_next_show(
    &self,
    card_id: i64,
    next_show: DateTime<Utc>,
    tier: ReviewTier,
  ) -> std::result::Result<(), StoreError> {
    match update_flashcard_schedule(self, card_id, next_show, tier)? {
      0 => Err(StoreError::NotFound(format!("flashcard {}", card_id))),
      _ => Ok(()),
    }
  }
}
