pub mod admin;
pub mod browse;
pub mod flashcards;
pub mod quiz;
pub mod results;
pub mod upload;

use askama::Template;
use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::auth::OptionalAuth;
use crate::db;
use crate::domain::Major;
use crate::session::{self, STUDY_COOKIE_NAME};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub majors: Vec<Major>,
  pub signed_in: bool,
  pub display_name: String,
  pub is_admin: bool,
  pub plan_label: &'static str,
  pub total_questions: i64,
  pub correct_answers: i64,
  pub study_time: String,
}

pub async fn index(State(state): State<AppState>, auth: OptionalAuth) -> Html<String> {
  let majors = match db::try_lock(&state.db) {
    Ok(conn) => db::list_majors(&conn).unwrap_or_default(),
    Err(_) => Vec::new(),
  };

  let template = match &auth.0 {
    Some(ctx) => IndexTemplate {
      majors,
      signed_in: true,
      display_name: ctx.profile.display_name.clone(),
      is_admin: ctx.is_admin(),
      plan_label: ctx.tier().label(),
      total_questions: ctx.profile.progress.total_questions,
      correct_answers: ctx.profile.progress.correct_answers,
      study_time: format_study_time(ctx.profile.progress.study_time_seconds),
    },
    None => IndexTemplate {
      majors,
      signed_in: false,
      display_name: String::new(),
      is_admin: false,
      plan_label: "Guest",
      total_questions: 0,
      correct_answers: 0,
      study_time: format_study_time(0),
    },
  };

  Html(template.render().unwrap_or_default())
}

/// Get the anonymous study-session ID from the cookie jar, minting a cookie
/// when absent. Returns the (possibly updated) jar so callers can include it
/// in their response.
pub fn ensure_sid(jar: CookieJar) -> (CookieJar, String) {
  if let Some(cookie) = jar.get(STUDY_COOKIE_NAME) {
    let sid = cookie.value().to_string();
    (jar, sid)
  } else {
    let sid = session::generate_session_id();
    let cookie = Cookie::build((STUDY_COOKIE_NAME, sid.clone()))
      .path("/")
      .http_only(true)
      .build();
    (jar.add(cookie), sid)
  }
}

/// "2h 15m" style rendering for profile study time.
pub fn format_study_time(seconds: i64) -> String {
  let minutes = seconds / 60;
  if minutes < 60 {
    format!("{}m", minutes)
  } else {
    format!("{}h {}m", minutes / 60, minutes % 60)
  }
}

/// "07:32" countdown rendering.
pub fn format_clock(seconds: i64) -> String {
  format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub use admin::{
  create_exam, create_major, create_subject, dashboard, delete_exam, delete_major, delete_question,
  delete_subject, exam_detail, set_user_plan, update_exam, update_major, update_subject, users_page,
};
pub use browse::{exam_page, major_page, subject_page};
pub use flashcards::{
  bookmark, flashcards_close, flashcards_flip, flashcards_next, flashcards_prev, flashcards_show,
  flashcards_shuffle, flashcards_start, mark,
};
pub use quiz::{
  quiz_abort, quiz_answer, quiz_finish, quiz_goto, quiz_restart, quiz_result, quiz_show, quiz_start,
};
pub use results::{export_data, history};
pub use upload::{upload_page, upload_preview, upload_save};
