use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS courses (
      id TEXT PRIMARY KEY,
      title TEXT NOT NULL,
      -- RFC 3339; NULL when the course has no target date
      target_completion TEXT
    );

    CREATE TABLE IF NOT EXISTS flashcards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      course_id TEXT NOT NULL,
      front TEXT NOT NULL,
      back TEXT NOT NULL,
      next_show_timestamp TEXT NOT NULL,
      review_count INTEGER NOT NULL DEFAULT 0,
      last_tier TEXT,
      FOREIGN KEY (course_id) REFERENCES courses(id)
    );

    CREATE INDEX IF NOT EXISTS idx_flashcards_due
      ON flashcards(course_id, next_show_timestamp);

    CREATE TABLE IF NOT EXISTS question_progress (
      course_id TEXT NOT NULL,
      lesson_id TEXT NOT NULL,
      question_id TEXT NOT NULL,
      answered_correctly INTEGER NOT NULL DEFAULT 0,
      flagged INTEGER NOT NULL DEFAULT 0,
      updated_at TEXT NOT NULL,
      PRIMARY KEY (course_id, lesson_id, question_id)
    );
    "#,
  )?;

  Ok(())
}
