pub mod content;
pub mod results;
pub mod user;

pub use content::{Difficulty, Exam, ExamType, Major, Question, Subject};
pub use results::{FlashcardProgress, QuizResult};
pub use user::{PlanTier, StudyProgress, UserProfile, UserRole};
