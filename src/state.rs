//! Application state passed to all handlers.

use crate::db::DbPool;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    /// Shared database (content, users, results)
    pub db: DbPool,

    /// In-memory quiz/flashcard sessions keyed by the study cookie
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            sessions: SessionStore::new(),
        }
    }
}
