pub mod flashcards;
pub mod quiz;

pub use flashcards::FlashcardSession;
pub use quiz::{QuizMode, QuizPhase, QuizSession, StartError};
