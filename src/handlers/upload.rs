//! Paste-text question importer (admin only).
//!
//! Flow: paste a question bank, preview the parsed drafts with a count of
//! rejected blocks, then save. Pasted text is NFC-normalized before parsing
//! since Vietnamese input frequently arrives decomposed.

use askama::Template;
use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::auth::AuthContext;
use crate::db::{self, LogOnError};
use crate::domain::Question;
use crate::qbank;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
  pub exam_id: i64,
  pub exam_name: String,
  pub text: String,
  pub preview: Vec<PreviewRow>,
  pub has_preview: bool,
  pub rejected: usize,
  pub message: Option<String>,
}

pub struct PreviewRow {
  pub number: usize,
  pub question: String,
  pub options: Vec<PreviewOption>,
}

pub struct PreviewOption {
  pub letter: String,
  pub text: String,
  pub correct: bool,
}

#[derive(Deserialize)]
pub struct UploadForm {
  pub text: String,
}

fn preview_rows(questions: &[qbank::ParsedQuestion]) -> Vec<PreviewRow> {
  questions
    .iter()
    .enumerate()
    .map(|(i, q)| PreviewRow {
      number: i + 1,
      question: q.question.clone(),
      options: q
        .options
        .iter()
        .enumerate()
        .map(|(j, text)| PreviewOption {
          letter: ((b'A' + j as u8) as char).to_string(),
          text: text.clone(),
          correct: j == q.correct_answer,
        })
        .collect(),
    })
    .collect()
}

fn load_exam_name(state: &AppState, exam_id: i64) -> Option<String> {
  let conn = db::try_lock(&state.db).ok()?;
  db::get_exam_name(&conn, exam_id).ok().flatten()
}

/// GET /admin/upload/{exam_id}
pub async fn upload_page(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(exam_id): Path<i64>,
) -> impl IntoResponse {
  if !auth.is_admin() {
    return Redirect::to("/").into_response();
  }
  let Some(exam_name) = load_exam_name(&state, exam_id) else {
    return Redirect::to("/admin").into_response();
  };

  let template = UploadTemplate {
    exam_id,
    exam_name,
    text: String::new(),
    preview: Vec::new(),
    has_preview: false,
    rejected: 0,
    message: None,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /admin/upload/{exam_id}/preview - parse without saving
pub async fn upload_preview(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(exam_id): Path<i64>,
  Form(form): Form<UploadForm>,
) -> impl IntoResponse {
  if !auth.is_admin() {
    return Redirect::to("/").into_response();
  }
  let Some(exam_name) = load_exam_name(&state, exam_id) else {
    return Redirect::to("/admin").into_response();
  };

  let normalized: String = form.text.nfc().collect();
  let outcome = qbank::parse(&normalized);

  let message = if outcome.questions.is_empty() {
    Some("No valid questions found. Check the numbering and answer lines.".to_string())
  } else if outcome.rejected > 0 {
    Some(format!(
      "{} valid question(s); {} block(s) could not be parsed and will be skipped.",
      outcome.questions.len(),
      outcome.rejected
    ))
  } else {
    None
  };

  let template = UploadTemplate {
    exam_id,
    exam_name,
    text: form.text,
    preview: preview_rows(&outcome.questions),
    has_preview: !outcome.questions.is_empty(),
    rejected: outcome.rejected,
    message,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /admin/upload/{exam_id}/save - parse and append to the exam
pub async fn upload_save(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(exam_id): Path<i64>,
  Form(form): Form<UploadForm>,
) -> impl IntoResponse {
  if !auth.is_admin() {
    return Redirect::to("/").into_response();
  }
  let Some(exam_name) = load_exam_name(&state, exam_id) else {
    return Redirect::to("/admin").into_response();
  };

  let normalized: String = form.text.nfc().collect();
  let outcome = qbank::parse(&normalized);

  let mut saved = 0usize;
  if !outcome.questions.is_empty() {
    if let Ok(conn) = db::try_lock(&state.db) {
      for draft in &outcome.questions {
        let question = Question::new(
          exam_id,
          draft.question.clone(),
          draft.options.clone(),
          draft.correct_answer,
        );
        if db::insert_question(&conn, &question)
          .log_warn("Failed to insert imported question")
          .is_some()
        {
          saved += 1;
        }
      }
    }
  }

  let message = if saved == 0 {
    Some("Nothing was imported. Check the numbering and answer lines.".to_string())
  } else if outcome.rejected > 0 {
    Some(format!(
      "Imported {} question(s); {} block(s) were rejected.",
      saved, outcome.rejected
    ))
  } else {
    Some(format!("Imported {} question(s).", saved))
  };

  let template = UploadTemplate {
    exam_id,
    exam_name,
    text: String::new(),
    preview: Vec::new(),
    has_preview: false,
    rejected: outcome.rejected,
    message,
  };
  Html(template.render().unwrap_or_default()).into_response()
}
