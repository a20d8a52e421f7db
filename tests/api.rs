//! End-to-end handler tests against the full router, with a fresh database
//! per server.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde::Serialize;

use fu_platform::{app, db, state::AppState};

fn test_server() -> (TestServer, tempfile::TempDir) {
  let temp = tempfile::tempdir().unwrap();
  let pool = db::init_db(&temp.path().join("test.db")).unwrap();
  {
    let conn = pool.lock().unwrap();
    db::seed_demo_catalog(&conn).unwrap();
    db::grant_admin(&conn, "admin@fpt.edu.vn").unwrap();
  }

  let mut server = TestServer::new(app::router(AppState::new(pool))).unwrap();
  server.save_cookies();
  (server, temp)
}

#[derive(Serialize)]
struct RegisterForm<'a> {
  email: &'a str,
  display_name: &'a str,
  password: &'a str,
}

async fn register(server: &TestServer, email: &str, name: &str) {
  let res = server
    .post("/register")
    .form(&RegisterForm {
      email,
      display_name: name,
      password: "longenoughpassword",
    })
    .await;
  res.assert_status(StatusCode::SEE_OTHER);
}

#[derive(Serialize)]
struct StartForm<'a> {
  exam_id: i64,
  mode: &'a str,
  count: Option<usize>,
}

#[derive(Serialize)]
struct ChoiceForm {
  choice: usize,
}

// Seeded catalog layout: exam 1 = "Chapter 1 Review" (quizlet, 3 questions),
// exam 2 = "Practice Exam 1" (PE, 1 question), exam 3 = "SQL Basics".

#[tokio::test]
async fn index_lists_seeded_majors() {
  let (server, _tmp) = test_server();
  let res = server.get("/").await;
  res.assert_status_ok();
  let body = res.text();
  assert!(body.contains("Software Engineering"));
  assert!(body.contains("Sign in"));
}

#[tokio::test]
async fn browse_hierarchy() {
  let (server, _tmp) = test_server();

  let majors = server.get("/majors/1").await;
  majors.assert_status_ok();
  assert!(majors.text().contains("Programming Fundamentals"));

  let subject = server.get("/subjects/1").await;
  subject.assert_status_ok();
  let body = subject.text();
  assert!(body.contains("Chapter 1 Review"));
  assert!(body.contains("Practice Exam 1"));

  let exam = server.get("/exams/1").await;
  exam.assert_status_ok();
  assert!(exam.text().contains("Take the quiz"));
}

#[tokio::test]
async fn missing_content_redirects_home() {
  let (server, _tmp) = test_server();
  let res = server.get("/majors/999").await;
  res.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn guest_quiz_full_lifecycle() {
  let (server, _tmp) = test_server();

  let start = server
    .post("/quiz/start")
    .form(&StartForm { exam_id: 1, mode: "full", count: None })
    .await;
  start.assert_status(StatusCode::SEE_OTHER);

  let quiz = server.get("/quiz").await;
  quiz.assert_status_ok();
  let body = quiz.text();
  assert!(body.contains("Question 1 of 3"));
  assert!(body.contains("Chapter 1 Review"));

  // Answering advances to the next question
  let answer = server.post("/quiz/answer").form(&ChoiceForm { choice: 1 }).await;
  answer.assert_status(StatusCode::SEE_OTHER);
  assert!(server.get("/quiz").await.text().contains("Question 2 of 3"));

  // Arbitrary jump back
  #[derive(Serialize)]
  struct GotoForm {
    index: usize,
  }
  server.post("/quiz/goto").form(&GotoForm { index: 0 }).await;
  assert!(server.get("/quiz").await.text().contains("Question 1 of 3"));

  let finish = server.post("/quiz/finish").await;
  finish.assert_status(StatusCode::SEE_OTHER);

  let result = server.get("/quiz/result").await;
  result.assert_status_ok();
  let body = result.text();
  assert!(body.contains("/ 3 correct"));
  // Guests are nudged to sign in
  assert!(body.contains("Guest results are not saved"));
}

#[tokio::test]
async fn quiz_restart_resets_progress() {
  let (server, _tmp) = test_server();

  server
    .post("/quiz/start")
    .form(&StartForm { exam_id: 1, mode: "full", count: None })
    .await;
  server.post("/quiz/answer").form(&ChoiceForm { choice: 1 }).await;
  server.post("/quiz/finish").await;

  let restart = server.post("/quiz/restart").await;
  restart.assert_status(StatusCode::SEE_OTHER);

  let quiz = server.get("/quiz").await;
  quiz.assert_status_ok();
  assert!(quiz.text().contains("0 answered"));
}

#[tokio::test]
async fn guest_cannot_start_practice_exam() {
  let (server, _tmp) = test_server();

  let res = server
    .post("/quiz/start")
    .form(&StartForm { exam_id: 2, mode: "full", count: None })
    .await;
  res.assert_status(StatusCode::SEE_OTHER);

  let location = res.header("location");
  let location = location.to_str().unwrap();
  assert!(location.starts_with("/exams/2?error="));
}

#[tokio::test]
async fn random_mode_samples_subset() {
  let (server, _tmp) = test_server();

  server
    .post("/quiz/start")
    .form(&StartForm { exam_id: 1, mode: "random", count: Some(2) })
    .await;

  let quiz = server.get("/quiz").await;
  quiz.assert_status_ok();
  assert!(quiz.text().contains("Question 1 of 2"));
}

#[tokio::test]
async fn signed_in_results_are_recorded() {
  let (server, _tmp) = test_server();
  register(&server, "student@example.com", "Student").await;

  server
    .post("/quiz/start")
    .form(&StartForm { exam_id: 1, mode: "full", count: None })
    .await;
  server.post("/quiz/answer").form(&ChoiceForm { choice: 1 }).await;
  server.post("/quiz/finish").await;

  let results = server.get("/results").await;
  results.assert_status_ok();
  let body = results.text();
  assert!(body.contains("Chapter 1 Review"));
  assert!(body.contains("3 questions answered"));
}

#[tokio::test]
async fn results_require_sign_in() {
  let (server, _tmp) = test_server();
  let res = server.get("/results").await;
  res.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(res.header("location").to_str().unwrap(), "/login");
}

#[tokio::test]
async fn flashcards_flow() {
  let (server, _tmp) = test_server();

  let open = server.get("/flashcards/1").await;
  open.assert_status(StatusCode::SEE_OTHER);

  let show = server.get("/flashcards").await;
  show.assert_status_ok();
  let body = show.text();
  assert!(body.contains("Card 1 of 3"));
  assert!(body.contains("Show answer"));

  let flip = server.post("/flashcards/flip").await;
  flip.assert_status(StatusCode::SEE_OTHER);
  assert!(server.get("/flashcards").await.text().contains("Show question"));

  #[derive(Serialize)]
  struct MarkForm {
    known: u8,
  }
  server.post("/flashcards/mark").form(&MarkForm { known: 1 }).await;
  let after_mark = server.get("/flashcards").await.text();
  assert!(after_mark.contains("Card 2 of 3"));
  assert!(after_mark.contains("1 known"));

  let shuffle = server.post("/flashcards/shuffle").await;
  shuffle.assert_status(StatusCode::SEE_OTHER);
  assert!(server.get("/flashcards").await.text().contains("Card 1 of 3"));
}

#[tokio::test]
async fn admin_dashboard_is_role_gated() {
  let (server, _tmp) = test_server();

  // Anonymous: bounced to login by the auth extractor
  let anon = server.get("/admin").await;
  anon.assert_status(StatusCode::SEE_OTHER);

  // Ordinary user: bounced home
  register(&server, "student@example.com", "Student").await;
  let user = server.get("/admin").await;
  user.assert_status(StatusCode::SEE_OTHER);
  assert_eq!(user.header("location").to_str().unwrap(), "/");
}

#[tokio::test]
async fn admin_can_manage_content_and_import() {
  let (server, _tmp) = test_server();
  register(&server, "admin@fpt.edu.vn", "Admin").await;

  let dash = server.get("/admin").await;
  dash.assert_status_ok();
  assert!(dash.text().contains("Content admin"));

  // Create a major
  #[derive(Serialize)]
  struct MajorForm<'a> {
    name: &'a str,
    description: &'a str,
    code: &'a str,
  }
  server
    .post("/admin/majors")
    .form(&MajorForm { name: "Business", description: "", code: "BA" })
    .await
    .assert_status(StatusCode::SEE_OTHER);
  assert!(server.get("/admin").await.text().contains("Business"));

  // Import questions into the seeded quizlet deck
  #[derive(Serialize)]
  struct UploadForm<'a> {
    text: &'a str,
  }
  let bank = "1. What is a pointer?\nA. a value\nB. an address\nANSWER: B\n----------\n2. Bad block\nANSWER: A\n----------\n3. What is NULL?\nA. zero address\nB. a type\nĐáp án: A\n";

  let preview = server
    .post("/admin/upload/1/preview")
    .form(&UploadForm { text: bank })
    .await;
  preview.assert_status_ok();
  let body = preview.text();
  assert!(body.contains("What is a pointer?"));
  assert!(body.contains("1 block(s) could not be parsed"));

  let save = server
    .post("/admin/upload/1/save")
    .form(&UploadForm { text: bank })
    .await;
  save.assert_status_ok();
  assert!(save.text().contains("Imported 2 question(s)"));

  // The exam now offers 5 questions
  let exam = server.get("/exams/1").await;
  assert!(exam.text().contains("5 questions"));
}

#[tokio::test]
async fn export_returns_zip() {
  let (server, _tmp) = test_server();
  register(&server, "student@example.com", "Student").await;

  let res = server.get("/export").await;
  res.assert_status_ok();
  assert_eq!(res.header("content-type").to_str().unwrap(), "application/zip");
  // Zip local-file-header magic
  let bytes = res.into_bytes();
  assert_eq!(&bytes[..2], b"PK".as_slice());
}
