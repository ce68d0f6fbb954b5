use log::{debug, error, info};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::fs;
use std::path::Path;

use crate::error::PoolError;
use crate::question::{Question, QuestionRecord};

/// Reorders questions before a sample is cut. Tests swap in a
/// deterministic implementation; any `FnMut(&mut [Question])` qualifies.
pub trait Shuffler {
    fn shuffle(&mut self, questions: &mut [Question]);
}

impl<F> Shuffler for F
where
    F: FnMut(&mut [Question]),
{
    fn shuffle(&mut self, questions: &mut [Question]) {
        self(questions)
    }
}

/// Unseeded shuffle backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffler;

impl Shuffler for RandomShuffler {
    fn shuffle(&mut self, questions: &mut [Question]) {
        questions.shuffle(&mut thread_rng());
    }
}

/// The full, validated question set read from one source.
#[derive(Debug, Clone)]
pub struct QuestionPool {
    pub source: String,
    pub questions: Vec<Question>,
}

impl QuestionPool {
    pub fn load_from_path(path: &Path) -> Result<Self, PoolError> {
        info!("Loading questions from: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            PoolError::from(e)
        })?;
        Self::load_from_str(&contents, path.display().to_string())
    }

    /// Parse and validate a JSON array of question records. One bad record
    /// rejects the whole pool.
    pub fn load_from_str(json: &str, source: impl Into<String>) -> Result<Self, PoolError> {
        let source = source.into();
        let records: Vec<QuestionRecord> = serde_json::from_str(json).map_err(|e| {
            error!("Question source {} is not valid JSON: {}", source, e);
            PoolError::from(e)
        })?;

        if records.is_empty() {
            error!("Question source {} is empty", source);
            return Err(PoolError::Empty);
        }

        let mut questions = Vec::with_capacity(records.len());
        for (i, record) in records.into_iter().enumerate() {
            let question = Question::from_record(i, record).map_err(|e| {
                error!("Rejecting question source {}: {}", source, e);
                e
            })?;
            debug!(
                "Question {} loaded ({:?}, {} options)",
                i,
                question.mode(),
                question.possible_answers.len()
            );
            questions.push(question);
        }

        info!("Loaded {} questions from {}", questions.len(), source);
        Ok(Self { source, questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn sample(&self, n: usize, shuffler: &mut dyn Shuffler) -> Vec<Question> {
        sample(&self.questions, n, shuffler)
    }
}

/// Pick `n` questions in random order without replacement. When the pool
/// holds `n` or fewer questions all of them come back, shuffled.
pub fn sample(all: &[Question], n: usize, shuffler: &mut dyn Shuffler) -> Vec<Question> {
    let mut picked = all.to_vec();
    shuffler.shuffle(&mut picked);
    picked.truncate(n);
    debug!("Sampled {} of {} questions", picked.len(), all.len());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"[
        {"question": "One", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "A"},
        {"question": "Two", "possibleAnswers": ["A) a", "B) b", "C) c"], "correctAnswer": "A,C"},
        {"question": "Three", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "B"}
    ]"#;

    fn reverse(questions: &mut [Question]) {
        questions.reverse();
    }

    #[test]
    fn loads_valid_source() {
        let pool = QuestionPool::load_from_str(SOURCE, "inline").unwrap();
        assert_eq!(pool.len(), 3);
        assert!(pool.questions[1].is_multiple());
    }

    #[test]
    fn empty_source_is_unavailable() {
        assert!(matches!(
            QuestionPool::load_from_str("[]", "inline"),
            Err(PoolError::Empty)
        ));
    }

    #[test]
    fn malformed_json_is_unavailable() {
        assert!(matches!(
            QuestionPool::load_from_str("{not json", "inline"),
            Err(PoolError::Parse(_))
        ));
    }

    #[test]
    fn one_bad_question_rejects_pool() {
        let json = r#"[
            {"question": "Ok", "possibleAnswers": ["A) a"], "correctAnswer": "A"},
            {"question": "Bad", "possibleAnswers": ["A) a"]}
        ]"#;
        assert!(matches!(
            QuestionPool::load_from_str(json, "inline"),
            Err(PoolError::InvalidQuestion { index: 1, .. })
        ));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let path = std::env::temp_dir().join("quiz_session_no_such_file.json");
        assert!(matches!(
            QuestionPool::load_from_path(&path),
            Err(PoolError::Io(_))
        ));
    }

    #[test]
    fn sample_uses_injected_shuffle() {
        let pool = QuestionPool::load_from_str(SOURCE, "inline").unwrap();
        let picked = pool.sample(2, &mut reverse);
        let texts: Vec<_> = picked.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["Three", "Two"]);
    }

    #[test]
    fn sample_larger_than_pool_returns_everything() {
        let pool = QuestionPool::load_from_str(SOURCE, "inline").unwrap();
        let picked = pool.sample(65, &mut RandomShuffler);
        assert_eq!(picked.len(), 3);
        for q in &pool.questions {
            assert!(picked.contains(q));
        }
    }
}
