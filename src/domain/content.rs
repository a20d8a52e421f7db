use serde::{Deserialize, Serialize};

/// Exam category. Practice and final exams are gated behind the pro plan;
/// quizlet-style decks are open to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
  Practice,
  Final,
  Quizlet,
}

impl ExamType {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "PE" => Some(Self::Practice),
      "FE" => Some(Self::Final),
      "QUIZLET" => Some(Self::Quizlet),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Practice => "PE",
      Self::Final => "FE",
      Self::Quizlet => "QUIZLET",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Practice => "Practice Exam",
      Self::Final => "Final Exam",
      Self::Quizlet => "Quizlet",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "easy" => Some(Self::Easy),
      "medium" => Some(Self::Medium),
      "hard" => Some(Self::Hard),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Easy => "easy",
      Self::Medium => "medium",
      Self::Hard => "hard",
    }
  }
}

/// Top-level field of study (e.g. Software Engineering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Major {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub code: String,
}

/// A course under a major (e.g. PRF192 under SE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub id: i64,
  pub major_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub code: String,
}

/// A named, typed question set under a subject. `questions` is always the
/// full ordered list; the store adapter loads it in position order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
  pub id: i64,
  pub subject_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub time_limit_minutes: i64,
  pub exam_type: ExamType,
  pub questions: Vec<Question>,
}

impl Exam {
  pub fn total_questions(&self) -> usize {
    self.questions.len()
  }

  pub fn time_budget_seconds(&self) -> i64 {
    self.time_limit_minutes * 60
  }
}

/// One multiple-choice item. Invariant: at least two options and
/// `correct_answer < options.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
  pub id: i64,
  pub exam_id: i64,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  pub difficulty: Difficulty,
  pub category: Option<String>,
}

impl Question {
  pub fn new(exam_id: i64, text: String, options: Vec<String>, correct_answer: usize) -> Self {
    Self {
      id: 0,
      exam_id,
      text,
      options,
      correct_answer,
      difficulty: Difficulty::Medium,
      category: None,
    }
  }

  pub fn is_valid(&self) -> bool {
    !self.text.trim().is_empty() && self.options.len() >= 2 && self.correct_answer < self.options.len()
  }

  /// Option letter for display (A, B, C, ...).
  pub fn answer_letter(&self) -> char {
    (b'A' + self.correct_answer as u8) as char
  }
}
