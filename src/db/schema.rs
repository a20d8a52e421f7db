use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS majors (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      description TEXT,
      code TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS subjects (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      major_id INTEGER NOT NULL,
      name TEXT NOT NULL,
      description TEXT,
      code TEXT NOT NULL,
      FOREIGN KEY (major_id) REFERENCES majors(id)
    );

    CREATE TABLE IF NOT EXISTS exams (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      subject_id INTEGER NOT NULL,
      name TEXT NOT NULL,
      description TEXT,
      time_limit_minutes INTEGER NOT NULL DEFAULT 30,
      exam_type TEXT NOT NULL DEFAULT 'QUIZLET',
      FOREIGN KEY (subject_id) REFERENCES subjects(id)
    );

    CREATE TABLE IF NOT EXISTS questions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      exam_id INTEGER NOT NULL,
      position INTEGER NOT NULL DEFAULT 0,
      question TEXT NOT NULL,
      options TEXT NOT NULL,
      correct_answer INTEGER NOT NULL,
      difficulty TEXT NOT NULL DEFAULT 'medium',
      category TEXT,
      FOREIGN KEY (exam_id) REFERENCES exams(id)
    );

    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      email TEXT NOT NULL UNIQUE COLLATE NOCASE,
      display_name TEXT NOT NULL,
      password_hash TEXT,
      role TEXT NOT NULL DEFAULT 'user',
      plan TEXT NOT NULL DEFAULT 'basic',
      is_anonymous INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      last_login_at TEXT,
      total_questions INTEGER NOT NULL DEFAULT 0,
      correct_answers INTEGER NOT NULL DEFAULT 0,
      study_time_seconds INTEGER NOT NULL DEFAULT 0,
      last_study_date TEXT
    );

    CREATE TABLE IF NOT EXISTS auth_sessions (
      token_hash TEXT PRIMARY KEY,
      user_id INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS admins (
      email_key TEXT PRIMARY KEY,
      granted_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flashcard_progress (
      user_id INTEGER NOT NULL,
      question_id INTEGER NOT NULL,
      known INTEGER NOT NULL DEFAULT 0,
      review_count INTEGER NOT NULL DEFAULT 0,
      last_reviewed TEXT,
      bookmarked INTEGER NOT NULL DEFAULT 0,
      PRIMARY KEY (user_id, question_id)
    );

    CREATE TABLE IF NOT EXISTS quiz_results (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id INTEGER NOT NULL,
      exam_id INTEGER NOT NULL,
      subject_id INTEGER NOT NULL,
      major_id INTEGER NOT NULL,
      score INTEGER NOT NULL,
      total_questions INTEGER NOT NULL,
      correct_answers INTEGER NOT NULL,
      time_spent_seconds INTEGER NOT NULL,
      completed_at TEXT NOT NULL,
      answers TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS settings (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    -- Default settings
    INSERT OR IGNORE INTO settings (key, value) VALUES ('registration_open', 'true');

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_subjects_major ON subjects(major_id);
    CREATE INDEX IF NOT EXISTS idx_exams_subject ON exams(subject_id);
    CREATE INDEX IF NOT EXISTS idx_questions_exam ON questions(exam_id, position);
    CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
    CREATE INDEX IF NOT EXISTS idx_auth_sessions_expires ON auth_sessions(expires_at);
    CREATE INDEX IF NOT EXISTS idx_quiz_results_user ON quiz_results(user_id, completed_at);
    CREATE INDEX IF NOT EXISTS idx_flashcard_progress_question ON flashcard_progress(question_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: Add plan column (tiers shipped after the first release)
  add_column_if_missing(conn, "users", "plan", "TEXT NOT NULL DEFAULT 'basic'")?;

  // Migration: Add optional question category
  add_column_if_missing(conn, "questions", "category", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
