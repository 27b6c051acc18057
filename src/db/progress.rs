//! Per-question review quiz progress

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::Serialize;

use super::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionProgress {
  pub course_id: String,
  pub lesson_id: String,
  pub question_id: String,
  pub answered_correctly: bool,
  pub flagged: bool,
  pub updated_at: Option<DateTime<Utc>>,
}

/// Upsert the stored state of a question
pub fn record_question_progress(
  conn: &Connection,
  course_id: &str,
  lesson_id: &str,
  question_id: &str,
  answered_correctly: bool,
  flagged: bool,
) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO question_progress (course_id, lesson_id, question_id, answered_correctly, flagged, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(course_id, lesson_id, question_id) DO UPDATE SET
      answered_correctly = excluded.answered_correctly,
      flagged = excluded.flagged,
      updated_at = excluded.updated_at
    "#,
    params![
      course_id,
      lesson_id,
      question_id,
      answered_correctly as i32,
      flagged as i32,
      format_timestamp(Utc::now()),
    ],
  )?;
  Ok(())
}

pub fn get_question_progress(
  conn: &Connection,
  course_id: &str,
  lesson_id: &str,
  question_id: &str,
) -> Result<Option<QuestionProgress>> {
  conn
    .query_row(
      r#"
      SELECT course_id, lesson_id, question_id, answered_correctly, flagged, updated_at
      FROM question_progress
      WHERE course_id = ?1 AND lesson_id = ?2 AND question_id = ?3
      "#,
      params![course_id, lesson_id, question_id],
      |row| {
        let updated_at: String = row.get(5)?;
        Ok(QuestionProgress {
          course_id: row.get(0)?,
          lesson_id: row.get(1)?,
          question_id: row.get(2)?,
          answered_correctly: row.get::<_, i32>(3)? == 1,
          flagged: row.get::<_, i32>(4)? == 1,
          updated_at: parse_timestamp(&updated_at),
        })
      },
    )
    .optional()
}
