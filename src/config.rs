//! Application configuration constants.
//!
//! Centralizes the tunable values so they are not scattered through handlers
//! and session logic.

use serde::Deserialize;
use std::path::PathBuf;

use crate::paths;

// ==================== Database Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Ok(contents) = std::fs::read_to_string("config.toml") {
        if let Ok(config) = toml::from_str::<AppConfig>(&contents) {
            if let Some(db) = config.database {
                if let Some(path) = db.path {
                    tracing::info!("Using database from config.toml: {}", path);
                    return PathBuf::from(path);
                }
            }
        }
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default under DATA_DIR
    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Get the full server bind address
pub fn server_bind_addr() -> String {
    format!("{}:{}", SERVER_ADDR, SERVER_PORT)
}

// ==================== Study Session Configuration ====================

/// In-memory study session expiration in hours
pub const STUDY_SESSION_EXPIRY_HOURS: i64 = 6;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Login session duration in hours (1 week)
pub const AUTH_SESSION_DURATION_HOURS: i64 = 24 * 7;

// ==================== Plan Limits ====================

/// Questions visible without an account
pub const GUEST_QUESTION_LIMIT: usize = 5;

/// Questions visible on the basic plan
pub const BASIC_QUESTION_LIMIT: usize = 10;

// ==================== Quiz Configuration ====================

/// Time limit applied when an exam does not specify one, in minutes
pub const DEFAULT_TIME_LIMIT_MINUTES: i64 = 30;

/// Default size of the random-sample quiz mode
pub const DEFAULT_RANDOM_SAMPLE: usize = 10;
