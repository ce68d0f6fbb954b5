use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::PoolError;

/// Canonical identifier of an answer option: the first character of its
/// display string (`"A) Paris"` has key `A`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerKey(String);

impl AnswerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key of a display string, or `None` for an empty string.
    pub fn of_answer(answer: &str) -> Option<Self> {
        answer.chars().next().map(|c| Self(c.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnswerKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Radio vs checkbox semantics, fixed once when the question is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multiple,
}

/// A question record as it appears in the JSON source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: String,
    #[serde(default)]
    pub possible_answers: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub possible_answers: Vec<String>,
    pub correct_answer: String,
    keys: Vec<AnswerKey>,
    correct_keys: BTreeSet<AnswerKey>,
    mode: SelectionMode,
}

impl Question {
    /// Validate a source record. `index` is its position in the source and
    /// only used for error reporting.
    pub fn from_record(index: usize, record: QuestionRecord) -> Result<Self, PoolError> {
        let invalid = |reason: String| PoolError::InvalidQuestion { index, reason };

        let possible_answers = match record.possible_answers {
            Some(answers) if !answers.is_empty() => answers,
            Some(_) => return Err(invalid("possibleAnswers is empty".into())),
            None => return Err(invalid("possibleAnswers is missing".into())),
        };
        let correct_answer = record
            .correct_answer
            .ok_or_else(|| invalid("correctAnswer is missing".into()))?;

        let mut keys = Vec::with_capacity(possible_answers.len());
        for answer in &possible_answers {
            let key = AnswerKey::of_answer(answer)
                .ok_or_else(|| invalid("an answer option is empty".into()))?;
            if keys.contains(&key) {
                return Err(invalid(format!("answer key `{}` appears twice", key)));
            }
            keys.push(key);
        }

        let mut correct_keys = BTreeSet::new();
        for part in correct_answer.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid(format!("correctAnswer `{}` has an empty key", correct_answer)));
            }
            let key = AnswerKey::new(part);
            if !keys.contains(&key) {
                return Err(invalid(format!("correct key `{}` is not one of the answers", key)));
            }
            if !correct_keys.insert(key) {
                return Err(invalid(format!("correct key `{}` is listed twice", part)));
            }
        }

        let mode = if correct_keys.len() > 1 {
            SelectionMode::Multiple
        } else {
            SelectionMode::Single
        };

        Ok(Self {
            text: record.question,
            possible_answers,
            correct_answer,
            keys,
            correct_keys,
            mode,
        })
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_multiple(&self) -> bool {
        self.mode == SelectionMode::Multiple
    }

    /// Answer keys in display order.
    pub fn keys(&self) -> &[AnswerKey] {
        &self.keys
    }

    pub fn has_key(&self, key: &AnswerKey) -> bool {
        self.keys.contains(key)
    }

    pub fn correct_keys(&self) -> &BTreeSet<AnswerKey> {
        &self.correct_keys
    }

    /// Number of selections needed before the question counts as attempted.
    pub fn required_count(&self) -> usize {
        match self.mode {
            SelectionMode::Single => 1,
            SelectionMode::Multiple => self.correct_keys.len(),
        }
    }

    /// Text shown to the user, with the selection hint for multi-select.
    pub fn prompt(&self) -> String {
        match self.mode {
            SelectionMode::Single => self.text.clone(),
            SelectionMode::Multiple => {
                format!("{} (Select {} answers)", self.text, self.required_count())
            }
        }
    }

    /// Pairs of (key, display string) in display order.
    pub fn options(&self) -> impl Iterator<Item = (&AnswerKey, &str)> {
        self.keys
            .iter()
            .zip(self.possible_answers.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, answers: &[&str], correct: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.into(),
            possible_answers: Some(answers.iter().map(|a| a.to_string()).collect()),
            correct_answer: Some(correct.into()),
        }
    }

    #[test]
    fn single_select_question() {
        let q = Question::from_record(0, record("Capital?", &["A) Paris", "B) Rome"], "A")).unwrap();
        assert_eq!(q.mode(), SelectionMode::Single);
        assert_eq!(q.required_count(), 1);
        assert_eq!(q.keys(), &[AnswerKey::from("A"), AnswerKey::from("B")]);
        assert_eq!(q.prompt(), "Capital?");
    }

    #[test]
    fn multi_select_keys_are_trimmed() {
        let q = Question::from_record(
            0,
            record("Primes?", &["A) 2", "B) 4", "C) 5"], "A, C"),
        )
        .unwrap();
        assert!(q.is_multiple());
        assert_eq!(q.required_count(), 2);
        assert!(q.correct_keys().contains(&AnswerKey::from("C")));
        assert_eq!(q.prompt(), "Primes? (Select 2 answers)");
    }

    #[test]
    fn rejects_unknown_correct_key() {
        let err = Question::from_record(3, record("Q", &["A) x", "B) y"], "A,D")).unwrap_err();
        assert!(matches!(err, PoolError::InvalidQuestion { index: 3, .. }));
    }

    #[test]
    fn rejects_missing_fields() {
        let missing_answers = QuestionRecord {
            question: "Q".into(),
            possible_answers: None,
            correct_answer: Some("A".into()),
        };
        assert!(Question::from_record(0, missing_answers).is_err());

        let missing_correct = QuestionRecord {
            question: "Q".into(),
            possible_answers: Some(vec!["A) x".into()]),
            correct_answer: None,
        };
        assert!(Question::from_record(0, missing_correct).is_err());
    }

    #[test]
    fn rejects_empty_and_duplicate_keys() {
        assert!(Question::from_record(0, record("Q", &["A) x", "B) y"], "A,")).is_err());
        assert!(Question::from_record(0, record("Q", &["A) x", "A) y"], "A")).is_err());
        assert!(Question::from_record(0, record("Q", &["A) x", "B) y"], "A,A")).is_err());
        assert!(Question::from_record(0, record("Q", &["A) x", ""], "A")).is_err());
    }
}
