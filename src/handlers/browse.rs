//! Content hierarchy browsing: major → subject → exam.

use askama::Template;
use axum::{
  extract::{Path, Query, State},
  response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::auth::OptionalAuth;
use crate::db;
use crate::domain::Subject;
use crate::plan;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "major.html")]
pub struct MajorTemplate {
  pub name: String,
  pub code: String,
  pub description: Option<String>,
  pub subjects: Vec<Subject>,
}

#[derive(Template)]
#[template(path = "subject.html")]
pub struct SubjectTemplate {
  pub name: String,
  pub code: String,
  pub major_id: i64,
  pub major_name: String,
  pub exams: Vec<ExamRow>,
}

pub struct ExamRow {
  pub id: i64,
  pub name: String,
  pub type_label: &'static str,
  pub question_count: i64,
  pub time_limit_minutes: i64,
  pub accessible: bool,
}

#[derive(Template)]
#[template(path = "exam.html")]
pub struct ExamTemplate {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub type_label: &'static str,
  pub question_count: usize,
  pub time_limit_minutes: i64,
  pub accessible: bool,
  pub visible_questions: usize,
  pub tier_label: &'static str,
  pub default_sample: usize,
  pub error: Option<String>,
}

pub async fn major_page(
  State(state): State<AppState>,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/").into_response();
  };

  let Ok(Some(major)) = db::get_major(&conn, id) else {
    return Redirect::to("/").into_response();
  };

  let template = MajorTemplate {
    name: major.name,
    code: major.code,
    description: major.description,
    subjects: db::list_subjects_for_major(&conn, id).unwrap_or_default(),
  };
  Html(template.render().unwrap_or_default()).into_response()
}

pub async fn subject_page(
  State(state): State<AppState>,
  auth: OptionalAuth,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/").into_response();
  };

  let Ok(Some(subject)) = db::get_subject(&conn, id) else {
    return Redirect::to("/").into_response();
  };
  let major_name = db::get_major(&conn, subject.major_id)
    .ok()
    .flatten()
    .map(|m| m.name)
    .unwrap_or_default();

  let tier = auth.tier();
  let exams = db::list_exams_for_subject(&conn, id)
    .unwrap_or_default()
    .into_iter()
    .map(|summary| ExamRow {
      id: summary.id,
      name: summary.name,
      type_label: summary.exam_type.label(),
      question_count: summary.question_count,
      time_limit_minutes: summary.time_limit_minutes,
      accessible: plan::can_access_exam_type(summary.exam_type, tier),
    })
    .collect();

  let template = SubjectTemplate {
    name: subject.name,
    code: subject.code,
    major_id: subject.major_id,
    major_name,
    exams,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

#[derive(Deserialize)]
pub struct ExamPageQuery {
  pub error: Option<String>,
}

pub async fn exam_page(
  State(state): State<AppState>,
  auth: OptionalAuth,
  Path(id): Path<i64>,
  Query(query): Query<ExamPageQuery>,
) -> impl IntoResponse {
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/").into_response();
  };

  let Ok(Some(exam)) = db::get_exam(&conn, id) else {
    return Redirect::to("/").into_response();
  };

  let tier = auth.tier();
  let total = exam.total_questions();
  let template = ExamTemplate {
    id: exam.id,
    name: exam.name,
    description: exam.description,
    type_label: exam.exam_type.label(),
    question_count: total,
    time_limit_minutes: exam.time_limit_minutes,
    accessible: plan::can_access_exam_type(exam.exam_type, tier),
    visible_questions: plan::question_limit(total, tier),
    tier_label: tier.label(),
    default_sample: crate::config::DEFAULT_RANDOM_SAMPLE.min(total.max(1)),
    error: query.error,
  };
  Html(template.render().unwrap_or_default()).into_response()
}
