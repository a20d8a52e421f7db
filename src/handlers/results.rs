//! Result history and personal data export.

use askama::Template;
use axum::{
  extract::State,
  http::header,
  response::{Html, IntoResponse},
};

use super::{format_clock, format_study_time};
use crate::auth::AuthContext;
use crate::db;
use crate::services::export;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
  pub display_name: String,
  pub total_questions: i64,
  pub correct_answers: i64,
  pub study_time: String,
  pub rows: Vec<ResultRow>,
}

pub struct ResultRow {
  pub exam_name: String,
  pub score: i64,
  pub total: i64,
  pub percentage: i64,
  pub time_spent: String,
  pub completed_at: String,
}

/// GET /results - the signed-in user's attempt history, newest first
pub async fn history(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
  let rows = match db::try_lock(&state.db) {
    Ok(conn) => db::list_results_for_user(&conn, auth.user_id())
      .unwrap_or_default()
      .into_iter()
      .map(|r| ResultRow {
        exam_name: db::get_exam_name(&conn, r.exam_id)
          .unwrap_or_default()
          .unwrap_or_else(|| "(deleted exam)".to_string()),
        score: r.score,
        total: r.total_questions,
        percentage: r.percentage(),
        time_spent: format_clock(r.time_spent_seconds),
        completed_at: r.completed_at.format("%Y-%m-%d %H:%M").to_string(),
      })
      .collect(),
    Err(_) => Vec::new(),
  };

  let template = ResultsTemplate {
    display_name: auth.profile.display_name.clone(),
    total_questions: auth.profile.progress.total_questions,
    correct_answers: auth.profile.progress.correct_answers,
    study_time: format_study_time(auth.profile.progress.study_time_seconds),
    rows,
  };
  Html(template.render().unwrap_or_default())
}

/// GET /export - download profile, results and flashcard progress as a zip
pub async fn export_data(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
  let bytes = match db::try_lock(&state.db) {
    Ok(conn) => export::build_export(&conn, &auth.profile),
    Err(e) => Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
  };

  match bytes {
    Ok(bytes) => (
      [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
          header::CONTENT_DISPOSITION,
          "attachment; filename=\"fuplatform-export.zip\"".to_string(),
        ),
      ],
      bytes,
    )
      .into_response(),
    Err(e) => {
      tracing::warn!("Export failed for user {}: {}", auth.user_id(), e);
      Html("<p>Export failed. Please try again later.</p>".to_string()).into_response()
    }
  }
}
