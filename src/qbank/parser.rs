//! Question-bank text parser.
//!
//! Converts a pasted block of semi-structured text into multiple-choice
//! question drafts. Each non-blank line is classified into exactly one kind
//! (question start, option, answer, separator, plain text) and fed through a
//! small state machine holding at most one open draft. Malformed input never
//! errors; drafts that don't survive validation are dropped and counted.
//!
//! Accepted shape, one question per numbered block:
//!
//! ```text
//! 1. Which keyword moves ownership?
//! A. borrow
//! B. move
//! Answer: B
//! ----------
//! ```
//!
//! Answer markers are matched case-insensitively and include the Vietnamese
//! `đáp án:` form alongside `answer:` and `correct:`.

/// One validated draft: non-empty text, at least two options, and an answer
/// index inside the option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
}

/// Parse result: surviving questions in input order, plus how many numbered
/// blocks were dropped. The caller decides whether a partial result is
/// acceptable.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
  pub questions: Vec<ParsedQuestion>,
  pub rejected: usize,
}

const ANSWER_MARKERS: [&str; 3] = ["đáp án:", "answer:", "correct:"];

/// Marker words stripped before the fallback letter scan, so e.g. the capital
/// C in `Correct:` is never mistaken for the answer itself.
const MARKER_WORDS: [&str; 3] = ["đáp án", "answer", "correct"];

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
  /// `^\d+\.` — starts a new question; payload is the remaining text.
  QuestionStart(&'a str),
  /// `^[A-Z]\.` — an option for the open question.
  Option(&'a str),
  /// An answer marker line; payload is the resolved zero-based index, if any.
  Answer(Option<usize>),
  /// Block separator: a `----------` run anywhere, or exactly `---`/`====`.
  Separator,
  /// Anything else non-blank.
  Text(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
  let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
  if digits > 0 && line[digits..].starts_with('.') {
    return LineKind::QuestionStart(line[digits + 1..].trim());
  }

  let mut chars = line.chars();
  if let (Some(first), Some('.')) = (chars.next(), chars.next()) {
    if first.is_ascii_uppercase() {
      return LineKind::Option(line[2..].trim());
    }
  }

  let lower = line.to_lowercase();
  if ANSWER_MARKERS.iter().any(|m| lower.starts_with(m)) {
    return LineKind::Answer(extract_answer_index(line));
  }

  if line.contains("----------") || line == "---" || line == "====" {
    return LineKind::Separator;
  }

  LineKind::Text(line)
}

/// Resolve the answer letter on an answer line: the first `A`-`Z` after the
/// colon, else the first `A`-`Z` anywhere once marker words are removed.
fn extract_answer_index(line: &str) -> Option<usize> {
  if let Some(pos) = line.find(':') {
    if let Some(c) = line[pos + 1..].chars().find(char::is_ascii_uppercase) {
      return Some(letter_index(c));
    }
  }
  strip_marker_words(line)
    .chars()
    .find(char::is_ascii_uppercase)
    .map(letter_index)
}

fn letter_index(c: char) -> usize {
  (c as u8 - b'A') as usize
}

fn strip_marker_words(line: &str) -> String {
  let chars: Vec<char> = line.chars().collect();
  let mut keep = vec![true; chars.len()];

  for marker in MARKER_WORDS {
    let pattern: Vec<char> = marker.chars().collect();
    let mut i = 0;
    while i + pattern.len() <= chars.len() {
      let hit = (0..pattern.len()).all(|j| {
        chars[i + j].to_lowercase().next().unwrap_or(chars[i + j]) == pattern[j]
      });
      if hit {
        for flag in keep.iter_mut().skip(i).take(pattern.len()) {
          *flag = false;
        }
        i += pattern.len();
      } else {
        i += 1;
      }
    }
  }

  chars
    .into_iter()
    .zip(keep)
    .filter_map(|(c, k)| k.then_some(c))
    .collect()
}

#[derive(Debug, Default)]
struct Draft {
  text: String,
  options: Vec<String>,
  answer: Option<usize>,
}

impl Draft {
  fn new(text: &str) -> Self {
    Self {
      text: text.to_string(),
      options: Vec::new(),
      answer: None,
    }
  }

  fn into_valid(self) -> Option<ParsedQuestion> {
    let answer = self.answer?;
    if self.text.trim().is_empty() || self.options.len() < 2 || answer >= self.options.len() {
      return None;
    }
    Some(ParsedQuestion {
      question: self.text,
      options: self.options,
      correct_answer: answer,
    })
  }
}

/// Close the open draft, if any: valid drafts are emitted, the rest counted.
fn flush(open: &mut Option<Draft>, out: &mut ParseOutcome) {
  if let Some(draft) = open.take() {
    match draft.into_valid() {
      Some(q) => out.questions.push(q),
      None => out.rejected += 1,
    }
  }
}

pub fn parse(input: &str) -> ParseOutcome {
  let mut out = ParseOutcome::default();
  let mut open: Option<Draft> = None;

  for raw in input.lines() {
    let line = raw.trim();
    if line.is_empty() {
      continue;
    }

    match classify(line) {
      LineKind::QuestionStart(text) => {
        flush(&mut open, &mut out);
        open = Some(Draft::new(text));
      }
      LineKind::Option(text) => {
        if let Some(draft) = open.as_mut() {
          draft.options.push(text.to_string());
        }
      }
      LineKind::Answer(resolved) => {
        if let Some(draft) = open.as_mut() {
          if resolved.is_some() {
            draft.answer = resolved;
          }
        }
      }
      LineKind::Separator => {
        flush(&mut open, &mut out);
      }
      LineKind::Text(text) => {
        // Continuation lines only extend the question before any option has
        // appeared; later stray lines are dropped. Historical uploads depend
        // on this exact asymmetry, so it is preserved even though it can
        // truncate a multi-line option.
        if let Some(draft) = open.as_mut() {
          if draft.options.is_empty() {
            if !draft.text.is_empty() {
              draft.text.push(' ');
            }
            draft.text.push_str(text);
          }
        }
      }
    }
  }

  flush(&mut open, &mut out);
  out
}

/// Render questions in the canonical `N. text / A. opt / ANSWER: X` shape.
/// Re-parsing the rendered text yields the same list back.
pub fn render_canonical(questions: &[ParsedQuestion]) -> String {
  let mut out = String::new();
  for (i, q) in questions.iter().enumerate() {
    out.push_str(&format!("{}. {}\n", i + 1, q.question));
    for (j, option) in q.options.iter().enumerate() {
      out.push_str(&format!("{}. {}\n", (b'A' + j as u8) as char, option));
    }
    out.push_str(&format!("ANSWER: {}\n\n", (b'A' + q.correct_answer as u8) as char));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_question() {
    let outcome = parse("1. Q?\nA. x\nB. y\nANSWER: B");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.rejected, 0);

    let q = &outcome.questions[0];
    assert_eq!(q.question, "Q?");
    assert_eq!(q.options, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(q.correct_answer, 1);
  }

  #[test]
  fn test_empty_input() {
    let outcome = parse("");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 0);
  }

  #[test]
  fn test_no_numbered_line_yields_nothing() {
    let outcome = parse("just some text\nA. stray option\nANSWER: A");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 0);
  }

  #[test]
  fn test_multiple_questions_with_separator() {
    let text = "1. First?\nA. a\nB. b\nANSWER: A\n----------\n2. Second?\nA. c\nB. d\nAnswer: B\n";
    let outcome = parse(text);
    assert_eq!(outcome.questions.len(), 2);
    assert_eq!(outcome.questions[0].correct_answer, 0);
    assert_eq!(outcome.questions[1].correct_answer, 1);
  }

  #[test]
  fn test_separator_variants() {
    for sep in ["---", "====", "x ---------- x"] {
      let text = format!("1. A or B?\nA. a\nB. b\nANSWER: A\n{}\n2. C?\nA. c\nB. d\nANSWER: B", sep);
      let outcome = parse(&text);
      assert_eq!(outcome.questions.len(), 2, "separator {:?}", sep);
    }
  }

  #[test]
  fn test_vietnamese_answer_marker() {
    let outcome = parse("1. Thủ đô của Việt Nam?\nA. Huế\nB. Hà Nội\nĐáp án: B");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].correct_answer, 1);
  }

  #[test]
  fn test_answer_out_of_range_is_rejected() {
    let outcome = parse("1. Q?\nA. x\nB. y\nANSWER: E");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 1);
  }

  #[test]
  fn test_missing_answer_is_rejected() {
    let outcome = parse("1. Q?\nA. x\nB. y");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 1);
  }

  #[test]
  fn test_single_option_is_rejected() {
    let outcome = parse("1. Q?\nA. only\nANSWER: A");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 1);
  }

  #[test]
  fn test_incomplete_question_before_next_counts_rejected() {
    let outcome = parse("1. No answer here\nA. x\nB. y\n2. Fine?\nA. a\nB. b\nANSWER: A");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].question, "Fine?");
    assert_eq!(outcome.rejected, 1);
  }

  #[test]
  fn test_continuation_joins_question_text() {
    let outcome = parse("1. What is\nthe borrow checker?\nA. a tool\nB. a keyword\nANSWER: A");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].question, "What is the borrow checker?");
  }

  #[test]
  fn test_stray_line_after_options_is_dropped() {
    // Continuation only applies before the first option: a wrapped option
    // line is silently lost, not appended. This pins the historical
    // behavior; changing it would re-parse old uploads differently.
    let outcome = parse("1. Q?\nA. first\nwrapped tail of option\nB. second\nANSWER: B");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(
      outcome.questions[0].options,
      vec!["first".to_string(), "second".to_string()]
    );
  }

  #[test]
  fn test_answer_before_options_is_kept() {
    let outcome = parse("1. Q?\nANSWER: A\nA. x\nB. y");
    assert_eq!(outcome.questions.len(), 1);
    assert_eq!(outcome.questions[0].correct_answer, 0);
  }

  #[test]
  fn test_last_answer_line_wins() {
    let outcome = parse("1. Q?\nA. x\nB. y\nANSWER: A\nANSWER: B");
    assert_eq!(outcome.questions[0].correct_answer, 1);
  }

  #[test]
  fn test_marker_capital_is_not_the_answer() {
    // `Correct:` contributes no letter itself; with no resolvable letter the
    // draft stays answerless and is rejected.
    let outcome = parse("1. Q?\nA. x\nB. y\nCorrect: b");
    assert!(outcome.questions.is_empty());
    assert_eq!(outcome.rejected, 1);
  }

  #[test]
  fn test_answer_letter_found_after_noise() {
    let outcome = parse("1. Q?\nA. x\nB. y\nanswer: the key is B");
    assert_eq!(outcome.questions[0].correct_answer, 1);
  }

  #[test]
  fn test_blank_lines_ignored() {
    let outcome = parse("\n\n1. Q?\n\nA. x\n\nB. y\n\nANSWER: A\n\n");
    assert_eq!(outcome.questions.len(), 1);
  }

  #[test]
  fn test_rejected_count_mixed_batch() {
    let text = "1. Good?\nA. a\nB. b\nANSWER: B\n2. Bad, no options\nANSWER: A\n3. Also good?\nA. a\nB. b\nANSWER: A\n4. Out of range\nA. a\nB. b\nANSWER: Z";
    let outcome = parse(text);
    assert_eq!(outcome.questions.len(), 2);
    assert_eq!(outcome.rejected, 2);
  }

  #[test]
  fn test_round_trip_canonical() {
    let text = "1. First?\nA. alpha\nB. beta\nC. gamma\nANSWER: C\n\n2. Second?\nA. yes\nB. no\nANSWER: A\n";
    let first = parse(text);
    assert_eq!(first.questions.len(), 2);

    let rendered = render_canonical(&first.questions);
    let second = parse(&rendered);
    assert_eq!(second.questions, first.questions);
    assert_eq!(second.rejected, 0);
  }

  #[test]
  fn test_render_canonical_shape() {
    let q = ParsedQuestion {
      question: "Q?".to_string(),
      options: vec!["x".to_string(), "y".to_string()],
      correct_answer: 1,
    };
    assert_eq!(render_canonical(&[q]), "1. Q?\nA. x\nB. y\nANSWER: B\n\n");
  }

  #[test]
  fn test_option_order_preserved() {
    let outcome = parse("1. Q?\nA. one\nB. two\nC. three\nD. four\nANSWER: D");
    assert_eq!(
      outcome.questions[0].options,
      vec!["one", "two", "three", "four"]
    );
    assert_eq!(outcome.questions[0].correct_answer, 3);
  }
}
