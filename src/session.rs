//! In-memory storage for active study sessions.
//!
//! Quiz and flashcard state is keyed by a browser session ID cookie and held
//! in a `SessionStore` owned by `AppState` (constructed at startup, dropped
//! with the server) rather than in module-level statics, so nothing leaks
//! across instances. Entries auto-expire after a period of inactivity.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config;
use crate::study::{FlashcardSession, QuizSession};

/// Name of the anonymous study session cookie.
pub const STUDY_COOKIE_NAME: &str = "fu_sid";

#[derive(Default)]
struct StudyEntry {
  quiz: Option<QuizSession>,
  cards: Option<FlashcardSession>,
  last_access: Option<DateTime<Utc>>,
}

/// Shared store of per-browser study state.
#[derive(Clone, Default)]
pub struct SessionStore {
  inner: Arc<Mutex<HashMap<String, StudyEntry>>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn with_entry<T>(&self, sid: &str, f: impl FnOnce(&mut StudyEntry) -> T) -> T {
    let mut sessions = self.inner.lock().expect("Session store lock poisoned");

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions);
    }

    let entry = sessions.entry(sid.to_string()).or_default();
    entry.last_access = Some(Utc::now());
    f(entry)
  }

  pub fn quiz(&self, sid: &str) -> Option<QuizSession> {
    self.with_entry(sid, |e| e.quiz.clone())
  }

  pub fn put_quiz(&self, sid: &str, quiz: QuizSession) {
    self.with_entry(sid, |e| e.quiz = Some(quiz));
  }

  pub fn clear_quiz(&self, sid: &str) {
    self.with_entry(sid, |e| e.quiz = None);
  }

  pub fn cards(&self, sid: &str) -> Option<FlashcardSession> {
    self.with_entry(sid, |e| e.cards.clone())
  }

  pub fn put_cards(&self, sid: &str, cards: FlashcardSession) {
    self.with_entry(sid, |e| e.cards = Some(cards));
  }

  pub fn clear_cards(&self, sid: &str) {
    self.with_entry(sid, |e| e.cards = None);
  }
}

fn cleanup_expired(sessions: &mut HashMap<String, StudyEntry>) {
  let expiry = Utc::now() - Duration::hours(config::STUDY_SESSION_EXPIRY_HOURS);
  sessions.retain(|_, entry| entry.last_access.is_some_and(|t| t > expiry));
}

/// Generate a new random session/token ID (32 chars, [0-9a-z]).
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Question;
  use crate::study::QuizMode;

  fn quiz() -> QuizSession {
    let mut q = QuizSession::new(
      1,
      1,
      1,
      "Exam".to_string(),
      vec![Question::new(1, "Q?".to_string(), vec!["a".into(), "b".into()], 0)],
      600,
    );
    q.start(QuizMode::Full).unwrap();
    q
  }

  #[test]
  fn test_store_roundtrip() {
    let store = SessionStore::new();
    assert!(store.quiz("sid1").is_none());

    store.put_quiz("sid1", quiz());
    assert!(store.quiz("sid1").is_some());
    assert!(store.quiz("sid2").is_none());

    store.clear_quiz("sid1");
    assert!(store.quiz("sid1").is_none());
  }

  #[test]
  fn test_quiz_and_cards_are_independent() {
    let store = SessionStore::new();
    store.put_quiz("sid", quiz());
    assert!(store.cards("sid").is_none());
    store.clear_cards("sid");
    assert!(store.quiz("sid").is_some());
  }

  #[test]
  fn test_generate_session_id_shape() {
    let id = generate_session_id();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
  }

  #[test]
  fn test_generate_session_id_unique() {
    assert_ne!(generate_session_id(), generate_session_id());
  }
}
