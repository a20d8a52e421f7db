//! Flashcard review flow.

use askama::Template;
use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ensure_sid;
use crate::auth::OptionalAuth;
use crate::db::{self, LogOnError};
use crate::domain::FlashcardProgress;
use crate::state::AppState;
use crate::study::FlashcardSession;

#[derive(Template)]
#[template(path = "flashcards.html")]
pub struct FlashcardsTemplate {
  pub exam_name: String,
  pub exam_id: i64,
  pub number: usize,
  pub total: usize,
  pub front: String,
  pub back: String,
  pub flipped: bool,
  pub known: bool,
  pub bookmarked: bool,
  pub known_count: usize,
  pub bookmarked_count: usize,
  pub locked: bool,
  pub signed_in: bool,
}

#[derive(Deserialize)]
pub struct MarkForm {
  pub known: u8,
}

fn persist_progress(state: &AppState, auth: &OptionalAuth, progress: &FlashcardProgress) {
  let Some(user_id) = auth.user_id() else {
    return;
  };
  let Ok(conn) = db::try_lock(&state.db) else {
    return;
  };
  db::upsert_flashcard_progress(&conn, user_id, progress)
    .log_warn("Failed to store flashcard progress");
}

/// GET /flashcards/{exam_id} - open a deck
pub async fn flashcards_start(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
  Path(exam_id): Path<i64>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);

  let (exam, progress) = {
    let Ok(conn) = db::try_lock(&state.db) else {
      return (jar, Redirect::to("/")).into_response();
    };
    let Ok(Some(exam)) = db::get_exam(&conn, exam_id) else {
      return (jar, Redirect::to("/")).into_response();
    };
    let progress = match auth.user_id() {
      Some(user_id) => {
        db::list_flashcard_progress_for_exam(&conn, user_id, exam_id).unwrap_or_default()
      }
      None => Vec::new(),
    };
    (exam, progress)
  };

  if exam.questions.is_empty() {
    return (
      jar,
      Html(format!(
        "<p>No flashcards available for {} yet.</p><p><a href=\"/subjects/{}\">Back</a></p>",
        html_escape::encode_text(&exam.name),
        exam.subject_id
      )),
    )
      .into_response();
  }

  let session = FlashcardSession::new(exam.id, exam.name.clone(), exam.questions, progress);
  state.sessions.put_cards(&sid, session);
  (jar, Redirect::to("/flashcards")).into_response()
}

/// GET /flashcards - current card
pub async fn flashcards_show(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  let Some(session) = state.sessions.cards(&sid) else {
    return (jar, Redirect::to("/")).into_response();
  };
  let Some(question) = session.current_question() else {
    return (jar, Redirect::to("/")).into_response();
  };

  let locked = !session.is_accessible(auth.tier());
  let progress = session.progress_for(question.id);
  let back = question
    .options
    .get(question.correct_answer)
    .cloned()
    .unwrap_or_default();

  let template = FlashcardsTemplate {
    exam_name: session.exam_name.clone(),
    exam_id: session.exam_id,
    number: session.current_index() + 1,
    total: session.questions.len(),
    front: if locked { String::new() } else { question.text.clone() },
    back: if locked { String::new() } else { back },
    flipped: session.flipped,
    known: progress.map(|p| p.known).unwrap_or(false),
    bookmarked: progress.map(|p| p.bookmarked).unwrap_or(false),
    known_count: session.known_count(),
    bookmarked_count: session.bookmarked_count(),
    locked,
    signed_in: auth.0.is_some(),
  };

  (jar, Html(template.render().unwrap_or_default())).into_response()
}

fn with_session(
  state: &AppState,
  sid: &str,
  f: impl FnOnce(&mut FlashcardSession),
) {
  if let Some(mut session) = state.sessions.cards(sid) {
    f(&mut session);
    state.sessions.put_cards(sid, session);
  }
}

/// POST /flashcards/flip
pub async fn flashcards_flip(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  with_session(&state, &sid, |s| s.flip());
  (jar, Redirect::to("/flashcards"))
}

/// POST /flashcards/next
pub async fn flashcards_next(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  with_session(&state, &sid, |s| s.next());
  (jar, Redirect::to("/flashcards"))
}

/// POST /flashcards/prev
pub async fn flashcards_prev(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  with_session(&state, &sid, |s| s.prev());
  (jar, Redirect::to("/flashcards"))
}

/// POST /flashcards/shuffle - reshuffle and restart from the first card
pub async fn flashcards_shuffle(
  State(state): State<AppState>,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  with_session(&state, &sid, |s| s.shuffle());
  (jar, Redirect::to("/flashcards"))
}

/// POST /flashcards/mark - known / still learning
pub async fn mark(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
  Form(form): Form<MarkForm>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  if let Some(mut session) = state.sessions.cards(&sid) {
    if let Some(progress) = session.mark(form.known != 0) {
      persist_progress(&state, &auth, &progress);
    }
    state.sessions.put_cards(&sid, session);
  }
  (jar, Redirect::to("/flashcards"))
}

/// POST /flashcards/close - drop the in-memory deck session
pub async fn flashcards_close(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  state.sessions.clear_cards(&sid);
  (jar, Redirect::to("/"))
}

/// POST /flashcards/bookmark
pub async fn bookmark(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  if let Some(mut session) = state.sessions.cards(&sid) {
    if let Some(progress) = session.toggle_bookmark() {
      persist_progress(&state, &auth, &progress);
    }
    state.sessions.put_cards(&sid, session);
  }
  (jar, Redirect::to("/flashcards"))
}
