use thiserror::Error;

use crate::session::Phase;

/// The question source could not be turned into a usable pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    #[error("question source could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("question source is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question source contains no questions")]
    Empty,
    #[error("question {index} is malformed: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

/// An event arrived that the session cannot accept in its current state.
///
/// These are contract violations on the caller's side. The session never
/// mutates state when returning one of them.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("`{operation}` is not allowed while the session is {phase:?}")]
    InvalidTransition { operation: &'static str, phase: Phase },
    #[error("question {0} does not exist")]
    QuestionOutOfRange(usize),
    #[error("question {0} has not been reached yet")]
    QuestionNotVisited(usize),
    #[error("question {0} already received feedback and can no longer change")]
    QuestionLocked(usize),
    #[error("question {question} has no answer `{key}`")]
    UnknownAnswerKey { question: usize, key: String },
}

/// Preferences could not be written back to disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
