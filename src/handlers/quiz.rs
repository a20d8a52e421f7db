//! Timed quiz flow: configure, answer, jump, finish, review.
//!
//! The session machine lives in memory keyed by the study cookie; these
//! handlers translate form posts into machine transitions and persist the
//! result for signed-in users when a session finishes.

use askama::Template;
use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::{ensure_sid, format_clock};
use crate::auth::OptionalAuth;
use crate::config;
use crate::db::{self, LogOnError};
use crate::domain::QuizResult;
use crate::domain::results::UNANSWERED;
use crate::plan;
use crate::state::AppState;
use crate::study::{QuizMode, QuizPhase, QuizSession};

#[derive(Template)]
#[template(path = "quiz.html")]
pub struct QuizTemplate {
  pub exam_name: String,
  pub number: usize,
  pub total: usize,
  pub question_text: String,
  pub options: Vec<OptionRow>,
  pub nav: Vec<NavCell>,
  pub remaining: String,
  pub remaining_seconds: i64,
  pub answered_count: usize,
  pub needs_login: bool,
  pub locked: bool,
  pub signed_in: bool,
}

pub struct OptionRow {
  pub index: usize,
  pub letter: String,
  pub text: String,
  pub selected: bool,
}

pub struct NavCell {
  pub index: usize,
  pub number: usize,
  pub answered: bool,
  pub current: bool,
}

#[derive(Template)]
#[template(path = "quiz_result.html")]
pub struct QuizResultTemplate {
  pub exam_name: String,
  pub score: i64,
  pub total: i64,
  pub percentage: i64,
  pub time_spent: String,
  pub rows: Vec<ResultRow>,
  pub signed_in: bool,
}

pub struct ResultRow {
  pub number: usize,
  pub question: String,
  pub your_answer: String,
  pub correct_answer: String,
  pub answered: bool,
  pub correct: bool,
}

#[derive(Deserialize)]
pub struct StartForm {
  pub exam_id: i64,
  pub mode: String,
  pub count: Option<usize>,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub choice: usize,
}

#[derive(Deserialize)]
pub struct GotoForm {
  pub index: usize,
}

fn back_to_exam(exam_id: i64, message: &str) -> Redirect {
  Redirect::to(&format!(
    "/exams/{}?error={}",
    exam_id,
    urlencoding::encode(message)
  ))
}

/// Store the finished result for signed-in users and fold it into their
/// profile aggregates. Guests keep nothing; that is what the login prompt is
/// about.
fn persist_result(state: &AppState, auth: &OptionalAuth, result: &QuizResult) {
  let Some(user_id) = auth.user_id() else {
    return;
  };
  let Ok(conn) = db::try_lock(&state.db) else {
    return;
  };
  db::insert_quiz_result(&conn, user_id, result).log_warn("Failed to store quiz result");
  db::record_study_progress(
    &conn,
    user_id,
    result.total_questions,
    result.correct_answers,
    result.time_spent_seconds,
  )
  .log_warn("Failed to update study progress");
}

/// POST /quiz/start - pick mode and begin
pub async fn quiz_start(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
  Form(form): Form<StartForm>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);

  let (exam, major_id) = {
    let Ok(conn) = db::try_lock(&state.db) else {
      return (jar, Redirect::to("/")).into_response();
    };
    let Ok(Some(exam)) = db::get_exam(&conn, form.exam_id) else {
      return (jar, Redirect::to("/")).into_response();
    };
    let major_id = db::get_subject(&conn, exam.subject_id)
      .ok()
      .flatten()
      .map(|s| s.major_id)
      .unwrap_or(0);
    (exam, major_id)
  };

  if !plan::can_access_exam_type(exam.exam_type, auth.tier()) {
    let message = format!("{}s are available on the Pro plan", exam.exam_type.label());
    return (jar, back_to_exam(exam.id, &message)).into_response();
  }

  let mode = match form.mode.as_str() {
    "random" => QuizMode::Random(form.count.unwrap_or(config::DEFAULT_RANDOM_SAMPLE)),
    _ => QuizMode::Full,
  };

  let time_budget = if exam.time_limit_minutes > 0 {
    exam.time_limit_minutes * 60
  } else {
    config::DEFAULT_TIME_LIMIT_MINUTES * 60
  };

  let mut session = QuizSession::new(
    exam.id,
    exam.subject_id,
    major_id,
    exam.name.clone(),
    exam.questions,
    time_budget,
  );

  if let Err(e) = session.start(mode) {
    return (jar, back_to_exam(exam.id, &e.to_string())).into_response();
  }

  state.sessions.put_quiz(&sid, session);
  (jar, Redirect::to("/quiz")).into_response()
}

/// GET /quiz - current question view
pub async fn quiz_show(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  let Some(mut session) = state.sessions.quiz(&sid) else {
    return (jar, Redirect::to("/")).into_response();
  };

  match session.phase {
    QuizPhase::Finished => return (jar, Redirect::to("/quiz/result")).into_response(),
    QuizPhase::InProgress => {}
    _ => return (jar, Redirect::to("/")).into_response(),
  }

  // Countdown hit zero: auto-submit before rendering anything.
  if session.is_expired() {
    if let Some(result) = session.finish() {
      persist_result(&state, &auth, &result);
    }
    state.sessions.put_quiz(&sid, session);
    return (jar, Redirect::to("/quiz/result")).into_response();
  }

  let tier = auth.tier();
  let locked = !session.is_accessible(session.current, tier);
  let question = match session.current_question() {
    Some(q) => q.clone(),
    None => return (jar, Redirect::to("/")).into_response(),
  };

  let selected = session.answers[session.current];
  let options = if locked {
    Vec::new()
  } else {
    question
      .options
      .iter()
      .enumerate()
      .map(|(i, text)| OptionRow {
        index: i,
        letter: ((b'A' + i as u8) as char).to_string(),
        text: text.clone(),
        selected: selected == i as i32,
      })
      .collect()
  };

  let nav = session
    .answers
    .iter()
    .enumerate()
    .map(|(i, &a)| NavCell {
      index: i,
      number: i + 1,
      answered: a != UNANSWERED,
      current: i == session.current,
    })
    .collect();

  let remaining_seconds = session.remaining_seconds();
  let template = QuizTemplate {
    exam_name: session.exam_name.clone(),
    number: session.current + 1,
    total: session.questions.len(),
    question_text: if locked { String::new() } else { question.text },
    options,
    nav,
    remaining: format_clock(remaining_seconds),
    remaining_seconds,
    answered_count: session.answered_count(),
    needs_login: session.needs_login,
    locked,
    signed_in: auth.0.is_some(),
  };

  (jar, Html(template.render().unwrap_or_default())).into_response()
}

/// POST /quiz/answer - record a choice for the current question
pub async fn quiz_answer(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
  Form(form): Form<AnswerForm>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  let Some(mut session) = state.sessions.quiz(&sid) else {
    return (jar, Redirect::to("/")).into_response();
  };

  if session.is_expired() {
    if let Some(result) = session.finish() {
      persist_result(&state, &auth, &result);
    }
    state.sessions.put_quiz(&sid, session);
    return (jar, Redirect::to("/quiz/result")).into_response();
  }

  session.select_answer(form.choice, auth.tier());
  session.advance();
  state.sessions.put_quiz(&sid, session);
  (jar, Redirect::to("/quiz")).into_response()
}

/// POST /quiz/goto - arbitrary jump between questions
pub async fn quiz_goto(
  State(state): State<AppState>,
  jar: CookieJar,
  Form(form): Form<GotoForm>,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  if let Some(mut session) = state.sessions.quiz(&sid) {
    session.goto(form.index);
    state.sessions.put_quiz(&sid, session);
  }
  (jar, Redirect::to("/quiz"))
}

/// POST /quiz/finish - explicit submission
pub async fn quiz_finish(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  if let Some(mut session) = state.sessions.quiz(&sid) {
    if let Some(result) = session.finish() {
      persist_result(&state, &auth, &result);
    }
    state.sessions.put_quiz(&sid, session);
  }
  (jar, Redirect::to("/quiz/result"))
}

/// POST /quiz/restart - same questions, fresh answers and timer
pub async fn quiz_restart(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  if let Some(mut session) = state.sessions.quiz(&sid) {
    session.restart();
    state.sessions.put_quiz(&sid, session);
  }
  (jar, Redirect::to("/quiz"))
}

/// GET /quiz/result - review the finished attempt
pub async fn quiz_result(
  State(state): State<AppState>,
  auth: OptionalAuth,
  jar: CookieJar,
) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  let Some(session) = state.sessions.quiz(&sid) else {
    return (jar, Redirect::to("/")).into_response();
  };
  let Some(result) = session.result.clone() else {
    return (jar, Redirect::to("/quiz")).into_response();
  };

  let rows = session
    .questions
    .iter()
    .zip(&result.answers)
    .enumerate()
    .map(|(i, (q, &a))| {
      let answered = a != UNANSWERED;
      ResultRow {
        number: i + 1,
        question: q.text.clone(),
        your_answer: if answered {
          q.options.get(a as usize).cloned().unwrap_or_default()
        } else {
          String::new()
        },
        correct_answer: q.options.get(q.correct_answer).cloned().unwrap_or_default(),
        answered,
        correct: a == q.correct_answer as i32,
      }
    })
    .collect();

  let template = QuizResultTemplate {
    exam_name: session.exam_name.clone(),
    score: result.score,
    total: result.total_questions,
    percentage: result.percentage(),
    time_spent: format_clock(result.time_spent_seconds),
    rows,
    signed_in: auth.0.is_some(),
  };

  (jar, Html(template.render().unwrap_or_default())).into_response()
}

/// POST /quiz/abort - discard the in-memory session without recording a
/// partial result.
pub async fn quiz_abort(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  let (jar, sid) = ensure_sid(jar);
  state.sessions.clear_quiz(&sid);
  (jar, Redirect::to("/"))
}

/// GET /exams/{id}/locked-note - inline fragment shown when a tier cannot
/// continue; kept as a fragment so the quiz page can lazy-load it.
pub async fn locked_note(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  let name = match db::try_lock(&state.db) {
    Ok(conn) => db::get_exam_name(&conn, id)
      .ok()
      .flatten()
      .unwrap_or_else(|| "this exam".to_string()),
    Err(_) => "this exam".to_string(),
  };
  Html(format!(
    "<p class=\"locked-note\">Sign in or upgrade to keep studying {}.</p>",
    html_escape::encode_text(&name)
  ))
}
