//! Admin content management: CRUD over the major/subject/exam hierarchy,
//! question removal, and the user/plan listing.

use askama::Template;
use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::db::{self, LogOnError};
use crate::domain::{ExamType, PlanTier};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
  pub majors: Vec<AdminMajorRow>,
}

pub struct AdminMajorRow {
  pub id: i64,
  pub name: String,
  pub code: String,
  pub subjects: Vec<AdminSubjectRow>,
}

pub struct AdminSubjectRow {
  pub id: i64,
  pub name: String,
  pub code: String,
  pub exams: Vec<AdminExamRow>,
}

pub struct AdminExamRow {
  pub id: i64,
  pub name: String,
  pub type_label: &'static str,
  pub question_count: i64,
}

#[derive(Template)]
#[template(path = "admin_exam.html")]
pub struct AdminExamTemplate {
  pub id: i64,
  pub name: String,
  pub description: String,
  pub time_limit_minutes: i64,
  pub exam_type: String,
  pub questions: Vec<AdminQuestionRow>,
}

pub struct AdminQuestionRow {
  pub id: i64,
  pub number: usize,
  pub text: String,
  pub answer: String,
}

#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersTemplate {
  pub users: Vec<AdminUserRow>,
}

pub struct AdminUserRow {
  pub id: i64,
  pub email: String,
  pub display_name: String,
  pub role: &'static str,
  pub plan: &'static str,
  pub is_anonymous: bool,
}

fn require_admin(auth: &AuthContext) -> Result<(), Redirect> {
  if auth.is_admin() {
    Ok(())
  } else {
    Err(Redirect::to("/"))
  }
}

/// GET /admin - content dashboard
pub async fn dashboard(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r.into_response();
  }
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/").into_response();
  };

  let majors = db::list_majors(&conn)
    .unwrap_or_default()
    .into_iter()
    .map(|major| AdminMajorRow {
      subjects: db::list_subjects_for_major(&conn, major.id)
        .unwrap_or_default()
        .into_iter()
        .map(|subject| AdminSubjectRow {
          exams: db::list_exams_for_subject(&conn, subject.id)
            .unwrap_or_default()
            .into_iter()
            .map(|exam| AdminExamRow {
              id: exam.id,
              name: exam.name,
              type_label: exam.exam_type.label(),
              question_count: exam.question_count,
            })
            .collect(),
          id: subject.id,
          name: subject.name,
          code: subject.code,
        })
        .collect(),
      id: major.id,
      name: major.name,
      code: major.code,
    })
    .collect();

  let template = AdminTemplate { majors };
  Html(template.render().unwrap_or_default()).into_response()
}

// ==================== Majors ====================

#[derive(Deserialize)]
pub struct MajorForm {
  pub name: String,
  pub description: String,
  pub code: String,
}

/// POST /admin/majors
pub async fn create_major(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<MajorForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if form.name.trim().is_empty() || form.code.trim().is_empty() {
    return Redirect::to("/admin");
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::insert_major(
      &conn,
      form.name.trim(),
      none_if_empty(&form.description),
      form.code.trim(),
    )
    .log_warn("Failed to create major");
  }
  Redirect::to("/admin")
}

/// POST /admin/majors/{id}
pub async fn update_major(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Form(form): Form<MajorForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::update_major(&conn, id, form.name.trim(), none_if_empty(&form.description), form.code.trim())
      .log_warn("Failed to update major");
  }
  Redirect::to("/admin")
}

/// POST /admin/majors/{id}/delete
pub async fn delete_major(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::delete_major(&conn, id).log_warn("Failed to delete major");
  }
  Redirect::to("/admin")
}

// ==================== Subjects ====================

#[derive(Deserialize)]
pub struct SubjectForm {
  pub major_id: i64,
  pub name: String,
  pub description: String,
  pub code: String,
}

#[derive(Deserialize)]
pub struct SubjectUpdateForm {
  pub name: String,
  pub description: String,
  pub code: String,
}

/// POST /admin/subjects
pub async fn create_subject(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<SubjectForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if form.name.trim().is_empty() || form.code.trim().is_empty() {
    return Redirect::to("/admin");
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::insert_subject(
      &conn,
      form.major_id,
      form.name.trim(),
      none_if_empty(&form.description),
      form.code.trim(),
    )
    .log_warn("Failed to create subject");
  }
  Redirect::to("/admin")
}

/// POST /admin/subjects/{id}
pub async fn update_subject(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Form(form): Form<SubjectUpdateForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::update_subject(&conn, id, form.name.trim(), none_if_empty(&form.description), form.code.trim())
      .log_warn("Failed to update subject");
  }
  Redirect::to("/admin")
}

/// POST /admin/subjects/{id}/delete
pub async fn delete_subject(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::delete_subject(&conn, id).log_warn("Failed to delete subject");
  }
  Redirect::to("/admin")
}

// ==================== Exams ====================

#[derive(Deserialize)]
pub struct ExamForm {
  pub subject_id: i64,
  pub name: String,
  pub description: String,
  pub time_limit_minutes: i64,
  pub exam_type: String,
}

#[derive(Deserialize)]
pub struct ExamUpdateForm {
  pub name: String,
  pub description: String,
  pub time_limit_minutes: i64,
  pub exam_type: String,
}

/// POST /admin/exams
pub async fn create_exam(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<ExamForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if form.name.trim().is_empty() {
    return Redirect::to("/admin");
  }
  let exam_type = ExamType::from_str(&form.exam_type).unwrap_or(ExamType::Quizlet);
  if let Ok(conn) = db::try_lock(&state.db) {
    db::insert_exam(
      &conn,
      form.subject_id,
      form.name.trim(),
      none_if_empty(&form.description),
      form.time_limit_minutes.max(1),
      exam_type,
    )
    .log_warn("Failed to create exam");
  }
  Redirect::to("/admin")
}

/// GET /admin/exams/{id} - question list and exam settings
pub async fn exam_detail(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r.into_response();
  }
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/admin").into_response();
  };
  let Ok(Some(exam)) = db::get_exam(&conn, id) else {
    return Redirect::to("/admin").into_response();
  };

  let questions = exam
    .questions
    .iter()
    .enumerate()
    .map(|(i, q)| AdminQuestionRow {
      id: q.id,
      number: i + 1,
      text: q.text.clone(),
      answer: format!(
        "{}. {}",
        q.answer_letter(),
        q.options.get(q.correct_answer).cloned().unwrap_or_default()
      ),
    })
    .collect();

  let template = AdminExamTemplate {
    id: exam.id,
    name: exam.name,
    description: exam.description.unwrap_or_default(),
    time_limit_minutes: exam.time_limit_minutes,
    exam_type: exam.exam_type.as_str().to_string(),
    questions,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /admin/exams/{id}
pub async fn update_exam(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Form(form): Form<ExamUpdateForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  let exam_type = ExamType::from_str(&form.exam_type).unwrap_or(ExamType::Quizlet);
  if let Ok(conn) = db::try_lock(&state.db) {
    db::update_exam(
      &conn,
      id,
      form.name.trim(),
      none_if_empty(&form.description),
      form.time_limit_minutes.max(1),
      exam_type,
    )
    .log_warn("Failed to update exam");
  }
  Redirect::to(&format!("/admin/exams/{}", id))
}

/// POST /admin/exams/{id}/delete
pub async fn delete_exam(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  if let Ok(conn) = db::try_lock(&state.db) {
    db::delete_exam(&conn, id).log_warn("Failed to delete exam");
  }
  Redirect::to("/admin")
}

// ==================== Questions ====================

/// POST /admin/questions/{id}/delete
pub async fn delete_question(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  let mut exam_id = None;
  if let Ok(conn) = db::try_lock(&state.db) {
    exam_id = db::get_question(&conn, id).ok().flatten().map(|q| q.exam_id);
    db::delete_question(&conn, id).log_warn("Failed to delete question");
  }
  match exam_id {
    Some(exam_id) => Redirect::to(&format!("/admin/exams/{}", exam_id)),
    None => Redirect::to("/admin"),
  }
}

// ==================== Users ====================

/// GET /admin/users - profiles with role and plan
pub async fn users_page(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r.into_response();
  }
  let Ok(conn) = db::try_lock(&state.db) else {
    return Redirect::to("/").into_response();
  };

  let users = db::list_profiles(&conn)
    .unwrap_or_default()
    .into_iter()
    .map(|p| AdminUserRow {
      id: p.id,
      email: p.email,
      display_name: p.display_name,
      role: p.role.as_str(),
      plan: p.plan.as_str(),
      is_anonymous: p.is_anonymous,
    })
    .collect();

  let template = AdminUsersTemplate { users };
  Html(template.render().unwrap_or_default()).into_response()
}

#[derive(Deserialize)]
pub struct PlanForm {
  pub plan: String,
}

/// POST /admin/users/{id}/plan - the authoritative plan record
pub async fn set_user_plan(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(id): Path<i64>,
  Form(form): Form<PlanForm>,
) -> impl IntoResponse {
  if let Err(r) = require_admin(&auth) {
    return r;
  }
  let plan = PlanTier::from_str(&form.plan).unwrap_or(PlanTier::Basic);
  if let Ok(conn) = db::try_lock(&state.db) {
    db::set_plan(&conn, id, plan).log_warn("Failed to update plan");
  }
  Redirect::to("/admin/users")
}

fn none_if_empty(s: &str) -> Option<&str> {
  let trimmed = s.trim();
  if trimmed.is_empty() { None } else { Some(trimmed) }
}
