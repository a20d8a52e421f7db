//! Access gating by plan tier.
//!
//! Pure functions of (counts, tier) with no hidden state; both the quiz and
//! flashcard session machines consult these on every navigation step, so they
//! have to stay deterministic and cheap.

use crate::config;
use crate::domain::{ExamType, PlanTier};

/// How many questions of `total` a user on `tier` may see.
pub fn question_limit(total: usize, tier: PlanTier) -> usize {
  match tier {
    PlanTier::Guest => total.min(config::GUEST_QUESTION_LIMIT),
    PlanTier::Basic => total.min(config::BASIC_QUESTION_LIMIT),
    PlanTier::Pro => total,
  }
}

/// Whether continued studying requires signing in or upgrading.
/// Signals only; callers show a prompt without blocking local state.
pub fn needs_login_to_continue(answered: usize, tier: PlanTier) -> bool {
  match tier {
    PlanTier::Guest => answered >= config::GUEST_QUESTION_LIMIT,
    PlanTier::Basic => answered >= config::BASIC_QUESTION_LIMIT,
    PlanTier::Pro => false,
  }
}

/// Practice and final exams are pro-only; quizlet decks are open to all tiers.
pub fn can_access_exam_type(exam_type: ExamType, tier: PlanTier) -> bool {
  match tier {
    PlanTier::Pro => true,
    PlanTier::Guest | PlanTier::Basic => exam_type == ExamType::Quizlet,
  }
}

/// Per-index visibility check used when rendering a question at `index`.
pub fn is_question_accessible(index: usize, total: usize, tier: PlanTier) -> bool {
  index < question_limit(total, tier)
}
