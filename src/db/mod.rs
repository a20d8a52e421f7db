pub mod content;
pub mod results;
pub mod schema;
pub mod users;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export all public items from submodules
pub use content::*;
pub use results::*;
pub use schema::run_migrations;
pub use users::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
  /// Log the error at warn level and return the default
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }

  fn log_warn_default(self, context: &str) -> T
  where
    T: Default,
  {
    match self {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        T::default()
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      tracing::warn!("Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Seed a small demo catalog on first run so a fresh install is browsable.
pub fn seed_demo_catalog(conn: &Connection) -> Result<()> {
  let count: i64 = conn.query_row("SELECT COUNT(*) FROM majors", [], |row| row.get(0))?;
  if count > 0 {
    return Ok(());
  }

  let se = content::insert_major(
    conn,
    "Software Engineering",
    Some("Programming, databases and software design"),
    "SE",
  )?;

  let prf = content::insert_subject(
    conn,
    se,
    "Programming Fundamentals",
    Some("Introduction to programming with C"),
    "PRF192",
  )?;
  let dbi = content::insert_subject(
    conn,
    se,
    "Database Systems",
    Some("Relational modeling and SQL"),
    "DBI202",
  )?;

  let prf_deck = content::insert_exam(conn, prf, "Chapter 1 Review", None, 15, crate::domain::ExamType::Quizlet)?;
  let prf_pe = content::insert_exam(conn, prf, "Practice Exam 1", None, 30, crate::domain::ExamType::Practice)?;
  let dbi_deck = content::insert_exam(conn, dbi, "SQL Basics", None, 15, crate::domain::ExamType::Quizlet)?;

  let seed: [(i64, &str, [&str; 4], usize); 6] = [
    (
      prf_deck,
      "Which symbol ends a statement in C?",
      [".", ";", ":", ","],
      1,
    ),
    (
      prf_deck,
      "Which function is the entry point of a C program?",
      ["start()", "init()", "main()", "run()"],
      2,
    ),
    (
      prf_deck,
      "Which type stores a single character?",
      ["char", "int", "float", "double"],
      0,
    ),
    (
      prf_pe,
      "What does sizeof(int) commonly return on a 64-bit platform?",
      ["1", "2", "4", "8"],
      2,
    ),
    (
      dbi_deck,
      "Which SQL clause filters rows?",
      ["ORDER BY", "WHERE", "GROUP BY", "SELECT"],
      1,
    ),
    (
      dbi_deck,
      "Which constraint guarantees uniqueness?",
      ["CHECK", "DEFAULT", "PRIMARY KEY", "NOT NULL"],
      2,
    ),
  ];

  for (exam_id, text, options, correct) in seed {
    let question = crate::domain::Question::new(
      exam_id,
      text.to_string(),
      options.iter().map(|s| s.to_string()).collect(),
      correct,
    );
    content::insert_question(conn, &question)?;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_seed_demo_catalog_once() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    seed_demo_catalog(&conn).unwrap();
    let majors = content::list_majors(&conn).unwrap();
    assert_eq!(majors.len(), 1);

    // Second call is a no-op
    seed_demo_catalog(&conn).unwrap();
    assert_eq!(content::list_majors(&conn).unwrap().len(), 1);
  }

  #[test]
  fn test_seeded_questions_are_valid() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    seed_demo_catalog(&conn).unwrap();

    for major in content::list_majors(&conn).unwrap() {
      for subject in content::list_subjects_for_major(&conn, major.id).unwrap() {
        for summary in content::list_exams_for_subject(&conn, subject.id).unwrap() {
          let exam = content::get_exam(&conn, summary.id).unwrap().unwrap();
          for q in &exam.questions {
            assert!(q.is_valid());
          }
        }
      }
    }
  }
}
