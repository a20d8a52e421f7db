use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slot value for an unanswered question in a result's answer vector.
pub const UNANSWERED: i32 = -1;

/// Immutable record of one completed quiz attempt. `score` is the raw count
/// of correct answers; percentages are derived at display time only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
  pub id: i64,
  pub exam_id: i64,
  pub subject_id: i64,
  pub major_id: i64,
  pub score: i64,
  pub total_questions: i64,
  pub correct_answers: i64,
  pub time_spent_seconds: i64,
  pub completed_at: DateTime<Utc>,
  pub answers: Vec<i32>,
}

impl QuizResult {
  pub fn percentage(&self) -> i64 {
    if self.total_questions > 0 {
      (self.correct_answers * 100) / self.total_questions
    } else {
      0
    }
  }

  pub fn answered_count(&self) -> usize {
    self.answers.iter().filter(|&&a| a != UNANSWERED).count()
  }
}

/// Per-user, per-question flashcard review state. One record per pair;
/// mutated in place on every mark or bookmark toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardProgress {
  pub question_id: i64,
  pub known: bool,
  pub review_count: i64,
  pub last_reviewed: Option<DateTime<Utc>>,
  pub bookmarked: bool,
}

impl FlashcardProgress {
  pub fn new(question_id: i64) -> Self {
    Self {
      question_id,
      known: false,
      review_count: 0,
      last_reviewed: None,
      bookmarked: false,
    }
  }
}
