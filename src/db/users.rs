//! User profiles, role membership and study progress aggregates.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};

use crate::domain::{PlanTier, StudyProgress, UserProfile, UserRole};

/// Key under which an email is stored in the admins table: dots are not
/// allowed in keys, so they are replaced with commas. Kept for compatibility
/// with existing admin records.
pub fn email_key(email: &str) -> String {
  email.to_lowercase().replace('.', ",")
}

pub fn grant_admin(conn: &Connection, email: &str) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO admins (email_key, granted_at) VALUES (?1, ?2)",
    params![email_key(email), Utc::now().to_rfc3339()],
  )?;
  Ok(())
}

pub fn revoke_admin(conn: &Connection, email: &str) -> Result<()> {
  conn.execute("DELETE FROM admins WHERE email_key = ?1", params![email_key(email)])?;
  Ok(())
}

pub fn is_admin_email(conn: &Connection, email: &str) -> Result<bool> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM admins WHERE email_key = ?1",
    params![email_key(email)],
    |row| row.get(0),
  )?;
  Ok(count > 0)
}

/// Create a profile on first sign-in. The role comes from the admins table at
/// creation time and is refreshed on every login.
pub fn create_user(
  conn: &Connection,
  email: &str,
  display_name: &str,
  password_hash: Option<&str>,
  is_anonymous: bool,
) -> Result<i64> {
  let role = if is_admin_email(conn, email)? {
    UserRole::Admin
  } else {
    UserRole::User
  };

  conn.execute(
    r#"
    INSERT INTO users (email, display_name, password_hash, role, plan, is_anonymous, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
    params![
      email,
      display_name,
      password_hash,
      role.as_str(),
      PlanTier::Basic.as_str(),
      is_anonymous as i64,
      Utc::now().to_rfc3339(),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<(i64, Option<String>)>> {
  conn
    .query_row(
      "SELECT id, password_hash FROM users WHERE email = ?1",
      params![email],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn get_profile(conn: &Connection, user_id: i64) -> Result<Option<UserProfile>> {
  conn
    .query_row(
      r#"
      SELECT id, email, display_name, role, plan, is_anonymous, created_at, last_login_at,
             total_questions, correct_answers, study_time_seconds, last_study_date
      FROM users WHERE id = ?1
      "#,
      params![user_id],
      row_to_profile,
    )
    .optional()
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<UserProfile>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, email, display_name, role, plan, is_anonymous, created_at, last_login_at,
           total_questions, correct_answers, study_time_seconds, last_study_date
    FROM users
    ORDER BY created_at ASC
    "#,
  )?;
  let profiles = stmt
    .query_map([], row_to_profile)?
    .collect::<Result<Vec<_>>>()?;
  Ok(profiles)
}

/// Stamp last login and refresh the role from the admins table, so granting
/// admin takes effect at the next sign-in.
pub fn touch_login(conn: &Connection, user_id: i64, email: &str) -> Result<()> {
  let role = if is_admin_email(conn, email)? {
    UserRole::Admin.as_str()
  } else {
    // Do not downgrade viewers; only admin membership is derived.
    let current: String =
      conn.query_row("SELECT role FROM users WHERE id = ?1", params![user_id], |row| row.get(0))?;
    if current == "viewer" { "viewer" } else { "user" }
  };

  conn.execute(
    "UPDATE users SET last_login_at = ?1, role = ?2 WHERE id = ?3",
    params![Utc::now().to_rfc3339(), role, user_id],
  )?;
  Ok(())
}

pub fn set_plan(conn: &Connection, user_id: i64, plan: PlanTier) -> Result<()> {
  conn.execute(
    "UPDATE users SET plan = ?1 WHERE id = ?2",
    params![plan.as_str(), user_id],
  )?;
  Ok(())
}

/// Merge a finished study activity into the profile aggregates. Read current
/// values, add, write back; last write wins across concurrent tabs, which is
/// an accepted property of this data.
pub fn record_study_progress(
  conn: &Connection,
  user_id: i64,
  questions: i64,
  correct: i64,
  seconds: i64,
) -> Result<()> {
  let current: Option<StudyProgress> = conn
    .query_row(
      "SELECT total_questions, correct_answers, study_time_seconds, last_study_date FROM users WHERE id = ?1",
      params![user_id],
      |row| {
        let last: Option<String> = row.get(3)?;
        Ok(StudyProgress {
          total_questions: row.get(0)?,
          correct_answers: row.get(1)?,
          study_time_seconds: row.get(2)?,
          last_study_date: last.and_then(|s| parse_timestamp(&s)),
        })
      },
    )
    .optional()?;

  let Some(current) = current else {
    return Ok(());
  };

  conn.execute(
    r#"
    UPDATE users
    SET total_questions = ?1, correct_answers = ?2, study_time_seconds = ?3, last_study_date = ?4
    WHERE id = ?5
    "#,
    params![
      current.total_questions + questions,
      current.correct_answers + correct,
      current.study_time_seconds + seconds,
      Utc::now().to_rfc3339(),
      user_id,
    ],
  )?;
  Ok(())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).ok()
}

fn row_to_profile(row: &rusqlite::Row) -> Result<UserProfile> {
  let role: String = row.get(3)?;
  let plan: String = row.get(4)?;
  let is_anonymous: i64 = row.get(5)?;
  let created_at: String = row.get(6)?;
  let last_login: Option<String> = row.get(7)?;
  let last_study: Option<String> = row.get(11)?;

  Ok(UserProfile {
    id: row.get(0)?,
    email: row.get(1)?,
    display_name: row.get(2)?,
    role: UserRole::from_str(&role).unwrap_or(UserRole::User),
    plan: PlanTier::from_str(&plan).unwrap_or(PlanTier::Basic),
    is_anonymous: is_anonymous != 0,
    created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
    last_login: last_login.as_deref().and_then(parse_timestamp),
    progress: StudyProgress {
      total_questions: row.get(8)?,
      correct_answers: row.get(9)?,
      study_time_seconds: row.get(10)?,
      last_study_date: last_study.as_deref().and_then(parse_timestamp),
    },
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

  #[test]
  fn test_email_key_escapes_dots() {
    assert_eq!(email_key("student@fpt.edu.vn"), "student@fpt,edu,vn");
    assert_eq!(email_key("NO.Dots@Example.COM"), "no,dots@example,com");
    assert_eq!(email_key("plain@host"), "plain@host");
  }

  #[test]
  fn test_admin_membership() {
    let conn = setup();
    assert!(!is_admin_email(&conn, "boss@fpt.edu.vn").unwrap());

    grant_admin(&conn, "boss@fpt.edu.vn").unwrap();
    assert!(is_admin_email(&conn, "boss@fpt.edu.vn").unwrap());
    // Case-insensitive via the lowercased key
    assert!(is_admin_email(&conn, "BOSS@FPT.EDU.VN").unwrap());

    revoke_admin(&conn, "boss@fpt.edu.vn").unwrap();
    assert!(!is_admin_email(&conn, "boss@fpt.edu.vn").unwrap());
  }

  #[test]
  fn test_create_user_defaults() {
    let conn = setup();
    let id = create_user(&conn, "a@b.c", "Student", Some("hash"), false).unwrap();

    let profile = get_profile(&conn, id).unwrap().unwrap();
    assert_eq!(profile.email, "a@b.c");
    assert_eq!(profile.role, UserRole::User);
    assert_eq!(profile.plan, PlanTier::Basic);
    assert!(!profile.is_anonymous);
    assert!(profile.last_login.is_none());
    assert_eq!(profile.progress.total_questions, 0);
  }

  #[test]
  fn test_create_user_with_admin_membership() {
    let conn = setup();
    grant_admin(&conn, "boss@fpt.edu.vn").unwrap();
    let id = create_user(&conn, "boss@fpt.edu.vn", "Boss", Some("hash"), false).unwrap();

    let profile = get_profile(&conn, id).unwrap().unwrap();
    assert!(profile.role.is_admin());
  }

  #[test]
  fn test_touch_login_refreshes_role() {
    let conn = setup();
    let id = create_user(&conn, "late@admin.vn", "Late", Some("hash"), false).unwrap();
    assert!(!get_profile(&conn, id).unwrap().unwrap().role.is_admin());

    grant_admin(&conn, "late@admin.vn").unwrap();
    touch_login(&conn, id, "late@admin.vn").unwrap();

    let profile = get_profile(&conn, id).unwrap().unwrap();
    assert!(profile.role.is_admin());
    assert!(profile.last_login.is_some());
  }

  #[test]
  fn test_anonymous_user_tier_is_guest() {
    let conn = setup();
    let id = create_user(&conn, "guest-1234@guests.local", "guest-1234", None, true).unwrap();
    let profile = get_profile(&conn, id).unwrap().unwrap();
    assert!(profile.is_anonymous);
    assert_eq!(profile.tier(), PlanTier::Guest);
  }

  #[test]
  fn test_set_plan() {
    let conn = setup();
    let id = create_user(&conn, "a@b.c", "Student", None, false).unwrap();
    set_plan(&conn, id, PlanTier::Pro).unwrap();
    assert_eq!(get_profile(&conn, id).unwrap().unwrap().plan, PlanTier::Pro);
  }

  #[test]
  fn test_record_study_progress_accumulates() {
    let conn = setup();
    let id = create_user(&conn, "a@b.c", "Student", None, false).unwrap();

    record_study_progress(&conn, id, 10, 7, 300).unwrap();
    record_study_progress(&conn, id, 5, 5, 120).unwrap();

    let progress = get_profile(&conn, id).unwrap().unwrap().progress;
    assert_eq!(progress.total_questions, 15);
    assert_eq!(progress.correct_answers, 12);
    assert_eq!(progress.study_time_seconds, 420);
    assert!(progress.last_study_date.is_some());
  }

  #[test]
  fn test_record_study_progress_unknown_user_is_noop() {
    let conn = setup();
    record_study_progress(&conn, 999, 1, 1, 1).unwrap();
  }

  #[test]
  fn test_duplicate_email_rejected() {
    let conn = setup();
    create_user(&conn, "a@b.c", "First", None, false).unwrap();
    assert!(create_user(&conn, "A@B.C", "Second", None, false).is_err());
  }
}
