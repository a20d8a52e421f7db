//! Login session storage.
//!
//! The cookie holds a random token; only its SHA-256 digest is stored, so a
//! leaked database cannot be replayed into live sessions.

use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};
use sha2::{Digest, Sha256};

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn create_session(conn: &Connection, user_id: i64, token: &str, hours: i64) -> Result<()> {
    let now = Utc::now();
    conn.execute(
        r#"
        INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            hash_token(token),
            user_id,
            now.to_rfc3339(),
            (now + Duration::hours(hours)).to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Resolve a cookie token to a user ID. Expired sessions resolve to None and
/// are removed on sight.
pub fn get_session_user(conn: &Connection, token: &str) -> Result<Option<i64>> {
    let token_hash = hash_token(token);
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT user_id, expires_at FROM auth_sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, expires_at)) = row else {
        return Ok(None);
    };

    let expired = chrono::DateTime::parse_from_rfc3339(&expires_at)
        .map(|t| t.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);

    if expired {
        conn.execute(
            "DELETE FROM auth_sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        return Ok(None);
    }

    Ok(Some(user_id))
}

pub fn delete_session(conn: &Connection, token: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM auth_sessions WHERE token_hash = ?1",
        params![hash_token(token)],
    )?;
    Ok(())
}

pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM auth_sessions WHERE expires_at <= ?1",
        params![Utc::now().to_rfc3339()],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{run_migrations, users};

    fn setup() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let user = users::create_user(&conn, "a@b.c", "Student", None, false).unwrap();
        (conn, user)
    }

    #[test]
    fn test_session_roundtrip() {
        let (conn, user) = setup();
        create_session(&conn, user, "token-1", 24).unwrap();

        assert_eq!(get_session_user(&conn, "token-1").unwrap(), Some(user));
        assert_eq!(get_session_user(&conn, "token-2").unwrap(), None);
    }

    #[test]
    fn test_token_is_stored_hashed() {
        let (conn, user) = setup();
        create_session(&conn, user, "raw-token", 24).unwrap();

        let stored: String = conn
            .query_row("SELECT token_hash FROM auth_sessions", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "raw-token");
        assert_eq!(stored.len(), 64);
    }

    #[test]
    fn test_expired_session_removed_on_lookup() {
        let (conn, user) = setup();
        create_session(&conn, user, "token", -1).unwrap();

        assert_eq!(get_session_user(&conn, "token").unwrap(), None);
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM auth_sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_delete_session() {
        let (conn, user) = setup();
        create_session(&conn, user, "token", 24).unwrap();
        delete_session(&conn, "token").unwrap();
        assert_eq!(get_session_user(&conn, "token").unwrap(), None);
    }

    #[test]
    fn test_cleanup_expired() {
        let (conn, user) = setup();
        create_session(&conn, user, "live", 24).unwrap();
        create_session(&conn, user, "dead", -1).unwrap();

        assert_eq!(cleanup_expired_sessions(&conn).unwrap(), 1);
        assert_eq!(get_session_user(&conn, "live").unwrap(), Some(user));
    }
}
