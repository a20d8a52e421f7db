//! Content hierarchy storage: majors, subjects, exams, questions.
//!
//! This is the single ingestion boundary for content: rows come back as
//! ordered lists (position order for questions, name order for the rest), so
//! nothing downstream ever re-checks shapes.

use rusqlite::{Connection, OptionalExtension, Result, params};

use crate::domain::{Difficulty, Exam, ExamType, Major, Question, Subject};

// ==================== Majors ====================

pub fn insert_major(conn: &Connection, name: &str, description: Option<&str>, code: &str) -> Result<i64> {
  conn.execute(
    "INSERT INTO majors (name, description, code) VALUES (?1, ?2, ?3)",
    params![name, description, code],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn list_majors(conn: &Connection) -> Result<Vec<Major>> {
  let mut stmt =
    conn.prepare("SELECT id, name, description, code FROM majors ORDER BY name")?;
  let majors = stmt
    .query_map([], row_to_major)?
    .collect::<Result<Vec<_>>>()?;
  Ok(majors)
}

pub fn get_major(conn: &Connection, id: i64) -> Result<Option<Major>> {
  conn
    .query_row(
      "SELECT id, name, description, code FROM majors WHERE id = ?1",
      params![id],
      row_to_major,
    )
    .optional()
}

pub fn update_major(
  conn: &Connection,
  id: i64,
  name: &str,
  description: Option<&str>,
  code: &str,
) -> Result<()> {
  conn.execute(
    "UPDATE majors SET name = ?1, description = ?2, code = ?3 WHERE id = ?4",
    params![name, description, code, id],
  )?;
  Ok(())
}

/// Delete a major and everything under it.
pub fn delete_major(conn: &Connection, id: i64) -> Result<()> {
  for subject in list_subjects_for_major(conn, id)? {
    delete_subject(conn, subject.id)?;
  }
  conn.execute("DELETE FROM majors WHERE id = ?1", params![id])?;
  Ok(())
}

// ==================== Subjects ====================

pub fn insert_subject(
  conn: &Connection,
  major_id: i64,
  name: &str,
  description: Option<&str>,
  code: &str,
) -> Result<i64> {
  conn.execute(
    "INSERT INTO subjects (major_id, name, description, code) VALUES (?1, ?2, ?3, ?4)",
    params![major_id, name, description, code],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn list_subjects_for_major(conn: &Connection, major_id: i64) -> Result<Vec<Subject>> {
  let mut stmt = conn.prepare(
    "SELECT id, major_id, name, description, code FROM subjects WHERE major_id = ?1 ORDER BY name",
  )?;
  let subjects = stmt
    .query_map(params![major_id], row_to_subject)?
    .collect::<Result<Vec<_>>>()?;
  Ok(subjects)
}

pub fn get_subject(conn: &Connection, id: i64) -> Result<Option<Subject>> {
  conn
    .query_row(
      "SELECT id, major_id, name, description, code FROM subjects WHERE id = ?1",
      params![id],
      row_to_subject,
    )
    .optional()
}

pub fn update_subject(
  conn: &Connection,
  id: i64,
  name: &str,
  description: Option<&str>,
  code: &str,
) -> Result<()> {
  conn.execute(
    "UPDATE subjects SET name = ?1, description = ?2, code = ?3 WHERE id = ?4",
    params![name, description, code, id],
  )?;
  Ok(())
}

pub fn delete_subject(conn: &Connection, id: i64) -> Result<()> {
  for exam in list_exams_for_subject(conn, id)? {
    delete_exam(conn, exam.id)?;
  }
  conn.execute("DELETE FROM subjects WHERE id = ?1", params![id])?;
  Ok(())
}

// ==================== Exams ====================

/// Listing row: exam metadata plus a question count, without loading the
/// question bodies.
#[derive(Debug, Clone)]
pub struct ExamSummary {
  pub id: i64,
  pub subject_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub time_limit_minutes: i64,
  pub exam_type: ExamType,
  pub question_count: i64,
}

pub fn insert_exam(
  conn: &Connection,
  subject_id: i64,
  name: &str,
  description: Option<&str>,
  time_limit_minutes: i64,
  exam_type: ExamType,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO exams (subject_id, name, description, time_limit_minutes, exam_type)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
    params![subject_id, name, description, time_limit_minutes, exam_type.as_str()],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn list_exams_for_subject(conn: &Connection, subject_id: i64) -> Result<Vec<ExamSummary>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT e.id, e.subject_id, e.name, e.description, e.time_limit_minutes, e.exam_type,
           (SELECT COUNT(*) FROM questions q WHERE q.exam_id = e.id) AS question_count
    FROM exams e
    WHERE e.subject_id = ?1
    ORDER BY e.name
    "#,
  )?;
  let exams = stmt
    .query_map(params![subject_id], row_to_exam_summary)?
    .collect::<Result<Vec<_>>>()?;
  Ok(exams)
}

/// Load an exam with its full ordered question list.
pub fn get_exam(conn: &Connection, id: i64) -> Result<Option<Exam>> {
  let header = conn
    .query_row(
      "SELECT id, subject_id, name, description, time_limit_minutes, exam_type FROM exams WHERE id = ?1",
      params![id],
      |row| {
        let exam_type: String = row.get(5)?;
        Ok(Exam {
          id: row.get(0)?,
          subject_id: row.get(1)?,
          name: row.get(2)?,
          description: row.get(3)?,
          time_limit_minutes: row.get(4)?,
          exam_type: ExamType::from_str(&exam_type).unwrap_or(ExamType::Quizlet),
          questions: Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut exam) = header else {
    return Ok(None);
  };
  exam.questions = list_questions_for_exam(conn, id)?;
  Ok(Some(exam))
}

/// Name lookup without loading questions, for history rows.
pub fn get_exam_name(conn: &Connection, id: i64) -> Result<Option<String>> {
  conn
    .query_row("SELECT name FROM exams WHERE id = ?1", params![id], |row| row.get(0))
    .optional()
}

pub fn update_exam(
  conn: &Connection,
  id: i64,
  name: &str,
  description: Option<&str>,
  time_limit_minutes: i64,
  exam_type: ExamType,
) -> Result<()> {
  conn.execute(
    r#"
    UPDATE exams SET name = ?1, description = ?2, time_limit_minutes = ?3, exam_type = ?4
    WHERE id = ?5
    "#,
    params![name, description, time_limit_minutes, exam_type.as_str(), id],
  )?;
  Ok(())
}

pub fn delete_exam(conn: &Connection, id: i64) -> Result<()> {
  conn.execute("DELETE FROM questions WHERE exam_id = ?1", params![id])?;
  conn.execute("DELETE FROM exams WHERE id = ?1", params![id])?;
  Ok(())
}

// ==================== Questions ====================

pub fn insert_question(conn: &Connection, question: &Question) -> Result<i64> {
  let position: i64 = conn.query_row(
    "SELECT COALESCE(MAX(position), -1) + 1 FROM questions WHERE exam_id = ?1",
    params![question.exam_id],
    |row| row.get(0),
  )?;

  let options = serde_json::to_string(&question.options)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

  conn.execute(
    r#"
    INSERT INTO questions (exam_id, position, question, options, correct_answer, difficulty, category)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
    params![
      question.exam_id,
      position,
      question.text,
      options,
      question.correct_answer as i64,
      question.difficulty.as_str(),
      question.category,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn list_questions_for_exam(conn: &Connection, exam_id: i64) -> Result<Vec<Question>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, exam_id, question, options, correct_answer, difficulty, category
    FROM questions
    WHERE exam_id = ?1
    ORDER BY position ASC, id ASC
    "#,
  )?;
  let questions = stmt
    .query_map(params![exam_id], row_to_question)?
    .collect::<Result<Vec<_>>>()?;
  Ok(questions)
}

pub fn get_question(conn: &Connection, id: i64) -> Result<Option<Question>> {
  conn
    .query_row(
      r#"
      SELECT id, exam_id, question, options, correct_answer, difficulty, category
      FROM questions WHERE id = ?1
      "#,
      params![id],
      row_to_question,
    )
    .optional()
}

pub fn delete_question(conn: &Connection, id: i64) -> Result<()> {
  conn.execute("DELETE FROM questions WHERE id = ?1", params![id])?;
  Ok(())
}

// ==================== Row mappers ====================

fn row_to_major(row: &rusqlite::Row) -> Result<Major> {
  Ok(Major {
    id: row.get(0)?,
    name: row.get(1)?,
    description: row.get(2)?,
    code: row.get(3)?,
  })
}

fn row_to_subject(row: &rusqlite::Row) -> Result<Subject> {
  Ok(Subject {
    id: row.get(0)?,
    major_id: row.get(1)?,
    name: row.get(2)?,
    description: row.get(3)?,
    code: row.get(4)?,
  })
}

fn row_to_exam_summary(row: &rusqlite::Row) -> Result<ExamSummary> {
  let exam_type: String = row.get(5)?;
  Ok(ExamSummary {
    id: row.get(0)?,
    subject_id: row.get(1)?,
    name: row.get(2)?,
    description: row.get(3)?,
    time_limit_minutes: row.get(4)?,
    exam_type: ExamType::from_str(&exam_type).unwrap_or(ExamType::Quizlet),
    question_count: row.get(6)?,
  })
}

fn row_to_question(row: &rusqlite::Row) -> Result<Question> {
  let options_json: String = row.get(3)?;
  let correct: i64 = row.get(4)?;
  let difficulty: String = row.get(5)?;

  Ok(Question {
    id: row.get(0)?,
    exam_id: row.get(1)?,
    text: row.get(2)?,
    options: serde_json::from_str(&options_json).unwrap_or_default(),
    correct_answer: correct.max(0) as usize,
    difficulty: Difficulty::from_str(&difficulty).unwrap_or_default(),
    category: row.get(6)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::run_migrations;

  fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
  }

  fn sample_hierarchy(conn: &Connection) -> (i64, i64, i64) {
    let major = insert_major(conn, "Software Engineering", None, "SE").unwrap();
    let subject = insert_subject(conn, major, "Programming Fundamentals", None, "PRF192").unwrap();
    let exam = insert_exam(conn, subject, "Midterm", None, 30, ExamType::Practice).unwrap();
    (major, subject, exam)
  }

  #[test]
  fn test_major_crud() {
    let conn = setup();
    let id = insert_major(&conn, "Business", Some("Business admin"), "BA").unwrap();

    let major = get_major(&conn, id).unwrap().unwrap();
    assert_eq!(major.name, "Business");
    assert_eq!(major.code, "BA");

    update_major(&conn, id, "Business Administration", None, "BA").unwrap();
    let major = get_major(&conn, id).unwrap().unwrap();
    assert_eq!(major.name, "Business Administration");
    assert!(major.description.is_none());

    delete_major(&conn, id).unwrap();
    assert!(get_major(&conn, id).unwrap().is_none());
  }

  #[test]
  fn test_majors_sorted_by_name() {
    let conn = setup();
    insert_major(&conn, "Software Engineering", None, "SE").unwrap();
    insert_major(&conn, "Business", None, "BA").unwrap();

    let names: Vec<String> = list_majors(&conn).unwrap().into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["Business", "Software Engineering"]);
  }

  #[test]
  fn test_subject_belongs_to_major() {
    let conn = setup();
    let (major, subject, _) = sample_hierarchy(&conn);

    let subjects = list_subjects_for_major(&conn, major).unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].id, subject);
    assert_eq!(subjects[0].major_id, major);

    assert!(list_subjects_for_major(&conn, major + 1).unwrap().is_empty());
  }

  #[test]
  fn test_exam_summary_counts_questions() {
    let conn = setup();
    let (_, subject, exam) = sample_hierarchy(&conn);

    for i in 0..3 {
      let q = Question::new(exam, format!("Q{}?", i), vec!["a".into(), "b".into()], 0);
      insert_question(&conn, &q).unwrap();
    }

    let summaries = list_exams_for_subject(&conn, subject).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].question_count, 3);
    assert_eq!(summaries[0].exam_type, ExamType::Practice);
  }

  #[test]
  fn test_questions_keep_insertion_order() {
    let conn = setup();
    let (_, _, exam) = sample_hierarchy(&conn);

    for text in ["first", "second", "third"] {
      let q = Question::new(exam, text.to_string(), vec!["a".into(), "b".into()], 1);
      insert_question(&conn, &q).unwrap();
    }

    let loaded = get_exam(&conn, exam).unwrap().unwrap();
    let texts: Vec<&str> = loaded.questions.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
  }

  #[test]
  fn test_question_options_roundtrip() {
    let conn = setup();
    let (_, _, exam) = sample_hierarchy(&conn);

    let mut q = Question::new(
      exam,
      "Pick one".to_string(),
      vec!["alpha".into(), "beta".into(), "gamma".into()],
      2,
    );
    q.difficulty = Difficulty::Hard;
    q.category = Some("syntax".to_string());
    let id = insert_question(&conn, &q).unwrap();

    let loaded = get_question(&conn, id).unwrap().unwrap();
    assert_eq!(loaded.options, q.options);
    assert_eq!(loaded.correct_answer, 2);
    assert_eq!(loaded.difficulty, Difficulty::Hard);
    assert_eq!(loaded.category.as_deref(), Some("syntax"));
    assert!(loaded.is_valid());
  }

  #[test]
  fn test_delete_major_cascades() {
    let conn = setup();
    let (major, subject, exam) = sample_hierarchy(&conn);
    let q = Question::new(exam, "Q?".to_string(), vec!["a".into(), "b".into()], 0);
    let qid = insert_question(&conn, &q).unwrap();

    delete_major(&conn, major).unwrap();

    assert!(get_subject(&conn, subject).unwrap().is_none());
    assert!(get_exam(&conn, exam).unwrap().is_none());
    assert!(get_question(&conn, qid).unwrap().is_none());
  }

  #[test]
  fn test_get_exam_missing() {
    let conn = setup();
    assert!(get_exam(&conn, 999).unwrap().is_none());
  }

  #[test]
  fn test_update_exam() {
    let conn = setup();
    let (_, _, exam) = sample_hierarchy(&conn);

    update_exam(&conn, exam, "Final", Some("Covers everything"), 60, ExamType::Final).unwrap();
    let loaded = get_exam(&conn, exam).unwrap().unwrap();
    assert_eq!(loaded.name, "Final");
    assert_eq!(loaded.time_limit_minutes, 60);
    assert_eq!(loaded.exam_type, ExamType::Final);
  }
}
