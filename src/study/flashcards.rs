//! Flashcard review state.
//!
//! Simpler sibling of the quiz machine: no timer and no terminal state. Keeps
//! an index into a (possibly shuffled) question list, a flip flag, and a
//! per-question progress list merged in place as the user marks cards.

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::domain::{FlashcardProgress, PlanTier, Question};
use crate::plan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardSession {
  pub exam_id: i64,
  pub exam_name: String,
  pub questions: Vec<Question>,
  /// Review order as indices into `questions`; shuffling permutes this.
  pub order: Vec<usize>,
  /// Position within `order`.
  pub current: usize,
  pub flipped: bool,
  /// Keyed by question id: insert-if-absent, else update-in-place.
  pub progress: Vec<FlashcardProgress>,
}

impl FlashcardSession {
  pub fn new(
    exam_id: i64,
    exam_name: String,
    questions: Vec<Question>,
    progress: Vec<FlashcardProgress>,
  ) -> Self {
    let order = (0..questions.len()).collect();
    Self {
      exam_id,
      exam_name,
      questions,
      order,
      current: 0,
      flipped: false,
      progress,
    }
  }

  /// How deep into the review order the user is; the plan gate locks
  /// positions past the tier's limit regardless of shuffling.
  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.order.get(self.current).and_then(|&i| self.questions.get(i))
  }

  pub fn flip(&mut self) {
    if !self.questions.is_empty() {
      self.flipped = !self.flipped;
    }
  }

  pub fn next(&mut self) {
    if !self.questions.is_empty() {
      self.current = (self.current + 1) % self.order.len();
      self.flipped = false;
    }
  }

  pub fn prev(&mut self) {
    if !self.questions.is_empty() {
      self.current = (self.current + self.order.len() - 1) % self.order.len();
      self.flipped = false;
    }
  }

  /// Re-randomize the order, reset to the first card, un-flip.
  pub fn shuffle(&mut self) {
    self.order.shuffle(&mut rand::rng());
    self.current = 0;
    self.flipped = false;
  }

  pub fn progress_for(&self, question_id: i64) -> Option<&FlashcardProgress> {
    self.progress.iter().find(|p| p.question_id == question_id)
  }

  fn entry_mut(&mut self, question_id: i64) -> &mut FlashcardProgress {
    if let Some(pos) = self.progress.iter().position(|p| p.question_id == question_id) {
      &mut self.progress[pos]
    } else {
      self.progress.push(FlashcardProgress::new(question_id));
      self.progress.last_mut().unwrap()
    }
  }

  /// Mark the current card known/unknown, bump its review count and advance
  /// to the next card. Returns the updated record for persistence.
  pub fn mark(&mut self, known: bool) -> Option<FlashcardProgress> {
    let question_id = self.current_question()?.id;
    let entry = self.entry_mut(question_id);
    entry.known = known;
    entry.review_count += 1;
    entry.last_reviewed = Some(Utc::now());
    let updated = entry.clone();
    self.next();
    Some(updated)
  }

  /// Toggle the bookmark on the current card without advancing.
  pub fn toggle_bookmark(&mut self) -> Option<FlashcardProgress> {
    let question_id = self.current_question()?.id;
    let entry = self.entry_mut(question_id);
    entry.bookmarked = !entry.bookmarked;
    Some(entry.clone())
  }

  pub fn known_count(&self) -> usize {
    self.progress.iter().filter(|p| p.known).count()
  }

  pub fn bookmarked_count(&self) -> usize {
    self.progress.iter().filter(|p| p.bookmarked).count()
  }

  pub fn is_accessible(&self, tier: PlanTier) -> bool {
    plan::is_question_accessible(self.current_index(), self.questions.len(), tier)
  }
}
