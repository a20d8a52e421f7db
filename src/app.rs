//! Router assembly, shared between the server binary and the API tests.

use axum::{Router, routing::get, routing::post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(handlers::index))
    .route("/majors/{id}", get(handlers::major_page))
    .route("/subjects/{id}", get(handlers::subject_page))
    .route("/exams/{id}", get(handlers::exam_page))
    .route("/exams/{id}/locked-note", get(handlers::quiz::locked_note))
    .route("/quiz/start", post(handlers::quiz_start))
    .route("/quiz", get(handlers::quiz_show))
    .route("/quiz/answer", post(handlers::quiz_answer))
    .route("/quiz/goto", post(handlers::quiz_goto))
    .route("/quiz/finish", post(handlers::quiz_finish))
    .route("/quiz/abort", post(handlers::quiz_abort))
    .route("/quiz/restart", post(handlers::quiz_restart))
    .route("/quiz/result", get(handlers::quiz_result))
    .route("/flashcards/{exam_id}", get(handlers::flashcards_start))
    .route("/flashcards", get(handlers::flashcards_show))
    .route("/flashcards/flip", post(handlers::flashcards_flip))
    .route("/flashcards/next", post(handlers::flashcards_next))
    .route("/flashcards/prev", post(handlers::flashcards_prev))
    .route("/flashcards/shuffle", post(handlers::flashcards_shuffle))
    .route("/flashcards/mark", post(handlers::mark))
    .route("/flashcards/bookmark", post(handlers::bookmark))
    .route("/flashcards/close", post(handlers::flashcards_close))
    .route("/results", get(handlers::history))
    .route("/export", get(handlers::export_data))
    .route("/login", get(auth::handlers::login_page).post(auth::handlers::login_submit))
    .route(
      "/register",
      get(auth::handlers::register_page).post(auth::handlers::register_submit),
    )
    .route("/guest", post(auth::handlers::guest_submit))
    .route("/logout", post(auth::handlers::logout))
    .route("/admin", get(handlers::dashboard))
    .route("/admin/majors", post(handlers::create_major))
    .route("/admin/majors/{id}", post(handlers::update_major))
    .route("/admin/majors/{id}/delete", post(handlers::delete_major))
    .route("/admin/subjects", post(handlers::create_subject))
    .route("/admin/subjects/{id}", post(handlers::update_subject))
    .route("/admin/subjects/{id}/delete", post(handlers::delete_subject))
    .route("/admin/exams", post(handlers::create_exam))
    .route("/admin/exams/{id}", get(handlers::exam_detail).post(handlers::update_exam))
    .route("/admin/exams/{id}/delete", post(handlers::delete_exam))
    .route("/admin/questions/{id}/delete", post(handlers::delete_question))
    .route("/admin/users", get(handlers::users_page))
    .route("/admin/users/{id}/plan", post(handlers::set_user_plan))
    .route("/admin/upload/{exam_id}", get(handlers::upload_page))
    .route("/admin/upload/{exam_id}/preview", post(handlers::upload_preview))
    .route("/admin/upload/{exam_id}/save", post(handlers::upload_save))
    .nest_service("/static", ServeDir::new("static"))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
