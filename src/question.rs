use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{QuizError, Result};

pub const OPTION_COUNT: usize = 4;

static BANK_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/banks");

/// A single multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: [String; OPTION_COUNT],
    #[serde(rename = "answer")]
    pub correct_index: usize,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct_index: usize,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options: options.map(str::to_string),
            correct_index,
        }
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

/// A question paired with whatever the respondent chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    question: Question,
    submitted: Option<usize>,
}

impl AnswerRecord {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            submitted: None,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn submitted(&self) -> Option<usize> {
        self.submitted
    }

    pub fn is_answered(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn is_correct(&self) -> bool {
        self.submitted
            .is_some_and(|index| self.question.is_correct(index))
    }

    /// Records the chosen option. A record accepts exactly one submission
    /// until it is reset.
    pub fn submit(&mut self, index: usize) -> Result<()> {
        if self.submitted.is_some() {
            return Err(QuizError::InvalidState("question already answered"));
        }
        if index >= self.question.options.len() {
            return Err(QuizError::invalid_input(format!(
                "option {index} out of range (0..{})",
                self.question.options.len()
            )));
        }
        self.submitted = Some(index);
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.submitted = None;
    }
}

/// Built-in question banks shipped with the binary.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Bank {
    Javascript,
    Rust,
}

#[derive(Deserialize)]
struct BankFile {
    questions: Vec<Question>,
}

impl Bank {
    pub fn questions(&self) -> Result<Vec<Question>> {
        let file_name = format!("{self}.json");
        let file = BANK_DIR.get_file(&file_name).ok_or_else(|| {
            QuizError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("bank {file_name} not embedded"),
            ))
        })?;
        parse_bank(file.contents())
    }
}

/// Reads a custom bank from disk. Accepts either the full bank document
/// (`{"name": .., "questions": [..]}`) or a bare array of questions.
pub fn load_questions<P: AsRef<Path>>(path: P) -> Result<Vec<Question>> {
    let bytes = fs::read(path.as_ref())?;
    parse_bank(&bytes)
}

fn parse_bank(bytes: &[u8]) -> Result<Vec<Question>> {
    match serde_json::from_slice::<BankFile>(bytes) {
        Ok(bank) => Ok(bank.questions),
        Err(_) => Ok(serde_json::from_slice::<Vec<Question>>(bytes)?),
    }
}

pub fn shuffle(questions: &mut [Question]) {
    questions.shuffle(&mut rand::thread_rng());
}

/// Parses a 0-based option index typed as text.
pub fn parse_choice(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| QuizError::invalid_input(format!("'{raw}' is not an option number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn sample() -> Question {
        Question::new("2 + 2?", ["3", "4", "5", "22"], 1)
    }

    #[test]
    fn test_new_record_is_unanswered() {
        let record = AnswerRecord::new(sample());
        assert!(!record.is_answered());
        assert!(!record.is_correct());
        assert_eq!(record.submitted(), None);
    }

    #[test]
    fn test_submit_correct_and_incorrect() {
        let mut right = AnswerRecord::new(sample());
        right.submit(1).unwrap();
        assert!(right.is_answered());
        assert!(right.is_correct());

        let mut wrong = AnswerRecord::new(sample());
        wrong.submit(3).unwrap();
        assert!(wrong.is_answered());
        assert!(!wrong.is_correct());
    }

    #[test]
    fn test_submit_twice_is_rejected() {
        let mut record = AnswerRecord::new(sample());
        record.submit(0).unwrap();
        assert_matches!(record.submit(1), Err(QuizError::InvalidState(_)));
        assert_eq!(record.submitted(), Some(0));
    }

    #[test]
    fn test_submit_out_of_range() {
        let mut record = AnswerRecord::new(sample());
        assert_matches!(record.submit(4), Err(QuizError::InvalidInput(_)));
        assert!(!record.is_answered());
    }

    #[test]
    fn test_reset_clears_submission() {
        let mut record = AnswerRecord::new(sample());
        record.submit(1).unwrap();
        record.reset();
        assert!(!record.is_answered());
        record.submit(2).unwrap();
        assert_eq!(record.submitted(), Some(2));
    }

    #[test]
    fn test_builtin_banks_load() {
        let js = Bank::Javascript.questions().unwrap();
        assert_eq!(js.len(), 5);
        assert_eq!(js[0].prompt, "Which word is not a keyword in JavaScript?");
        assert_eq!(js[0].correct_index, 3);

        let rust = Bank::Rust.questions().unwrap();
        assert!(!rust.is_empty());
        assert!(rust.iter().all(|q| q.correct_index < OPTION_COUNT));
    }

    #[test]
    fn test_bank_display() {
        assert_eq!(Bank::Javascript.to_string(), "javascript");
        assert_eq!(Bank::Rust.to_string(), "rust");
    }

    #[test]
    fn test_load_questions_from_bare_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        fs::write(
            &path,
            r#"[{"prompt": "p", "options": ["a", "b", "c", "d"], "answer": 0}]"#,
        )
        .unwrap();

        let questions = load_questions(&path).unwrap();
        assert_eq!(questions, vec![Question::new("p", ["a", "b", "c", "d"], 0)]);
    }

    #[test]
    fn test_load_questions_rejects_wrong_option_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quiz.json");
        fs::write(
            &path,
            r#"[{"prompt": "p", "options": ["a", "b"], "answer": 0}]"#,
        )
        .unwrap();

        assert_matches!(load_questions(&path), Err(QuizError::Json(_)));
    }

    #[test]
    fn test_load_questions_missing_file() {
        let dir = tempdir().unwrap();
        assert_matches!(
            load_questions(dir.path().join("nope.json")),
            Err(QuizError::Io(_))
        );
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2").unwrap(), 2);
        assert_eq!(parse_choice(" 0 ").unwrap(), 0);
        assert_matches!(parse_choice("two"), Err(QuizError::InvalidInput(_)));
        assert_matches!(parse_choice("-1"), Err(QuizError::InvalidInput(_)));
    }

    #[test]
    fn test_shuffle_keeps_questions() {
        let mut questions = Bank::Javascript.questions().unwrap();
        let mut before: Vec<String> = questions.iter().map(|q| q.prompt.clone()).collect();
        shuffle(&mut questions);
        let mut after: Vec<String> = questions.iter().map(|q| q.prompt.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}
