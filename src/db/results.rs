//! Quiz result history and flashcard progress persistence.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

use crate::domain::{FlashcardProgress, QuizResult};

/// Append a finished quiz attempt to the user's history. Results are
/// immutable once written; there is no update path.
pub fn insert_quiz_result(conn: &Connection, user_id: i64, result: &QuizResult) -> Result<i64> {
  let answers = serde_json::to_string(&result.answers)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

  conn.execute(
    r#"
    INSERT INTO quiz_results (user_id, exam_id, subject_id, major_id, score, total_questions,
                              correct_answers, time_spent_seconds, completed_at, answers)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
    params![
      user_id,
      result.exam_id,
      result.subject_id,
      result.major_id,
      result.score,
      result.total_questions,
      result.correct_answers,
      result.time_spent_seconds,
      result.completed_at.to_rfc3339(),
      answers,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn list_results_for_user(conn: &Connection, user_id: i64) -> Result<Vec<QuizResult>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, exam_id, subject_id, major_id, score, total_questions, correct_answers,
           time_spent_seconds, completed_at, answers
    FROM quiz_results
    WHERE user_id = ?1
    ORDER BY completed_at DESC, id DESC
    "#,
  )?;
  let results = stmt
    .query_map(params![user_id], row_to_result)?
    .collect::<Result<Vec<_>>>()?;
  Ok(results)
}

/// Write a flashcard progress record: insert on first review of a question,
/// overwrite in place afterwards.
pub fn upsert_flashcard_progress(
  conn: &Connection,
  user_id: i64,
  progress: &FlashcardProgress,
) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO flashcard_progress (user_id, question_id, known, review_count, last_reviewed, bookmarked)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(user_id, question_id) DO UPDATE SET
      known = excluded.known,
      review_count = excluded.review_count,
      last_reviewed = excluded.last_reviewed,
      bookmarked = excluded.bookmarked
    "#,
    params![
      user_id,
      progress.question_id,
      progress.known as i64,
      progress.review_count,
      progress.last_reviewed.map(|t| t.to_rfc3339()),
      progress.bookmarked as i64,
    ],
  )?;
  Ok(())
}

/// Load a user's progress for every question of one exam.
pub fn list_flashcard_progress_for_exam(
  conn: &Connection,
  user_id: i64,
  exam_id: i64,
) -> Result<Vec<FlashcardProgress>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT fp.question_id, fp.known, fp.review_count, fp.last_reviewed, fp.bookmarked
    FROM flashcard_progress fp
    JOIN questions q ON q.id = fp.question_id
    WHERE fp.user_id = ?1 AND q.exam_id = ?2
    "#,
  )?;
  let progress = stmt
    .query_map(params![user_id, exam_id], row_to_progress)?
    .collect::<Result<Vec<_>>>()?;
  Ok(progress)
}

/// Everything a user has reviewed, for the data export.
pub fn list_all_flashcard_progress(conn: &Connection, user_id: i64) -> Result<Vec<FlashcardProgress>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT question_id, known, review_count, last_reviewed, bookmarked
    FROM flashcard_progress
    WHERE user_id = ?1
    ORDER BY question_id
    "#,
  )?;
  let progress = stmt
    .query_map(params![user_id], row_to_progress)?
    .collect::<Result<Vec<_>>>()?;
  Ok(progress)
}

fn row_to_result(row: &rusqlite::Row) -> Result<QuizResult> {
  let completed_at: String = row.get(8)?;
  let answers_json: String = row.get(9)?;

  Ok(QuizResult {
    id: row.get(0)?,
    exam_id: row.get(1)?,
    subject_id: row.get(2)?,
    major_id: row.get(3)?,
    score: row.get(4)?,
    total_questions: row.get(5)?,
    correct_answers: row.get(6)?,
    time_spent_seconds: row.get(7)?,
    completed_at: DateTime::parse_from_rfc3339(&completed_at)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
    answers: serde_json::from_str(&answers_json).unwrap_or_default(),
  })
}

fn row_to_progress(row: &rusqlite::Row) -> Result<FlashcardProgress> {
  let last_reviewed: Option<String> = row.get(3)?;
  let known: i64 = row.get(1)?;
  let bookmarked: i64 = row.get(4)?;

  Ok(FlashcardProgress {
    question_id: row.get(0)?,
    known: known != 0,
    review_count: row.get(2)?,
    last_reviewed: last_reviewed
      .and_then(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)).ok()),
    bookmarked: bookmarked != 0,
  })
}
