//! Quiz session state machine.
//!
//! In-memory, single-user state: question set, per-question answers, a
//! wall-clock countdown and final scoring. The caller owns persistence of the
//! produced result; aborting a session just drops it.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::results::UNANSWERED;
use crate::domain::{PlanTier, Question, QuizResult};
use crate::plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizPhase {
  /// No exam chosen yet; the browse pages drive this phase.
  Selecting,
  /// Exam chosen, mode not yet picked.
  Configuring,
  /// Questions loaded, countdown running, answers mutable.
  InProgress,
  /// Submitted or timed out; answers frozen, result computed.
  Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
  /// The full ordered question list.
  Full,
  /// A uniform random sample of this many questions.
  Random(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
  NoQuestions,
}

impl std::fmt::Display for StartError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::NoQuestions => write!(f, "This exam has no questions yet"),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
  pub phase: QuizPhase,
  pub exam_id: i64,
  pub subject_id: i64,
  pub major_id: i64,
  pub exam_name: String,
  /// Full pool the exam offers; `questions` is the started selection.
  pub pool: Vec<Question>,
  pub questions: Vec<Question>,
  /// One slot per selected question, `-1` until answered. Last selection wins.
  pub answers: Vec<i32>,
  pub current: usize,
  pub time_budget_seconds: i64,
  pub started_at: DateTime<Utc>,
  /// Raised by the plan gate; shows a prompt but never blocks local state.
  pub needs_login: bool,
  pub result: Option<QuizResult>,
}

impl QuizSession {
  /// Exam chosen: session begins in `Configuring`.
  pub fn new(
    exam_id: i64,
    subject_id: i64,
    major_id: i64,
    exam_name: String,
    pool: Vec<Question>,
    time_budget_seconds: i64,
  ) -> Self {
    Self {
      phase: QuizPhase::Configuring,
      exam_id,
      subject_id,
      major_id,
      exam_name,
      pool,
      questions: Vec::new(),
      answers: Vec::new(),
      current: 0,
      time_budget_seconds,
      started_at: Utc::now(),
      needs_login: false,
      result: None,
    }
  }

  /// `Configuring → InProgress`. Rejected (no transition) when the exam has
  /// no questions.
  pub fn start(&mut self, mode: QuizMode) -> Result<(), StartError> {
    if self.pool.is_empty() {
      return Err(StartError::NoQuestions);
    }

    self.questions = match mode {
      QuizMode::Full => self.pool.clone(),
      QuizMode::Random(n) => {
        let mut sample = self.pool.clone();
        sample.shuffle(&mut rand::rng());
        sample.truncate(n.max(1));
        sample
      }
    };

    self.answers = vec![UNANSWERED; self.questions.len()];
    self.current = 0;
    self.started_at = Utc::now();
    self.needs_login = false;
    self.result = None;
    self.phase = QuizPhase::InProgress;
    Ok(())
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.questions.get(self.current)
  }

  /// Record an answer for the current question; repeat selections overwrite.
  /// Consults the plan gate and raises the login prompt when the tier's
  /// threshold is crossed.
  pub fn select_answer(&mut self, choice: usize, tier: PlanTier) {
    if self.phase != QuizPhase::InProgress {
      return;
    }
    let Some(question) = self.questions.get(self.current) else {
      return;
    };
    if choice >= question.options.len() {
      return;
    }
    self.answers[self.current] = choice as i32;
    self.needs_login = plan::needs_login_to_continue(self.answered_count(), tier);
  }

  /// Arbitrary index jump; navigation is not sequential.
  pub fn goto(&mut self, index: usize) {
    if self.phase == QuizPhase::InProgress && index < self.questions.len() {
      self.current = index;
    }
  }

  pub fn advance(&mut self) {
    if self.phase == QuizPhase::InProgress && self.current + 1 < self.questions.len() {
      self.current += 1;
    }
  }

  pub fn answered_count(&self) -> usize {
    self.answers.iter().filter(|&&a| a != UNANSWERED).count()
  }

  pub fn elapsed_seconds(&self) -> i64 {
    (Utc::now() - self.started_at).num_seconds().max(0)
  }

  pub fn remaining_seconds(&self) -> i64 {
    if self.phase == QuizPhase::InProgress {
      (self.time_budget_seconds - self.elapsed_seconds()).max(0)
    } else {
      0
    }
  }

  /// True when the countdown hit zero; the next interaction auto-submits.
  pub fn is_expired(&self) -> bool {
    self.phase == QuizPhase::InProgress && self.remaining_seconds() == 0
  }

  pub fn is_accessible(&self, index: usize, tier: PlanTier) -> bool {
    plan::is_question_accessible(index, self.questions.len(), tier)
  }

  /// `InProgress → Finished`, by submission or timeout. Computes the result
  /// and freezes the session; returns the record for the caller to persist.
  pub fn finish(&mut self) -> Option<QuizResult> {
    if self.phase != QuizPhase::InProgress {
      return None;
    }

    let correct = self
      .questions
      .iter()
      .zip(&self.answers)
      .filter(|&(q, &a)| a == q.correct_answer as i32)
      .count() as i64;

    let result = QuizResult {
      id: 0,
      exam_id: self.exam_id,
      subject_id: self.subject_id,
      major_id: self.major_id,
      score: correct,
      total_questions: self.questions.len() as i64,
      correct_answers: correct,
      time_spent_seconds: self.elapsed_seconds().min(self.time_budget_seconds),
      completed_at: Utc::now(),
      answers: self.answers.clone(),
    };

    self.phase = QuizPhase::Finished;
    self.result = Some(result.clone());
    Some(result)
  }

  /// `Finished → InProgress` with the same question set: answers back to
  /// unanswered, timer back to the full budget.
  pub fn restart(&mut self) {
    if self.phase != QuizPhase::Finished {
      return;
    }
    self.answers = vec![UNANSWERED; self.questions.len()];
    self.current = 0;
    self.started_at = Utc::now();
    self.needs_login = false;
    self.result = None;
    self.phase = QuizPhase::InProgress;
  }
}
