pub mod app;
pub mod config;
pub mod error;
pub mod grader;
pub mod logging;
pub mod pool;
pub mod question;
pub mod session;
pub mod theme;
pub mod timer;
pub mod ui;

pub use error::{ConfigError, PoolError, SessionError};
pub use grader::{grade, QuestionOutcome, ResultRecord};
pub use pool::{QuestionPool, RandomShuffler, Shuffler};
pub use question::{AnswerKey, Question, QuestionRecord, SelectionMode};
pub use session::{Phase, QuizSession, SessionSettings, Step, Submission};
pub use timer::Clock;
