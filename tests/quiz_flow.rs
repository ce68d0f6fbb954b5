use std::path::Path;
use std::time::Duration;

use quiz_session::session::{Decoration, FEEDBACK_DELAY};
use quiz_session::{
    AnswerKey, Clock, Phase, Question, QuestionPool, QuizSession, SessionSettings, Step,
};

fn pool(json: &str) -> QuestionPool {
    QuestionPool::load_from_str(json, "test").unwrap()
}

fn in_order(_: &mut [Question]) {}

fn start(json: &str, settings: SessionSettings) -> QuizSession {
    QuizSession::start(&pool(json), settings, Clock::manual(), &mut in_order)
}

fn key(k: &str) -> AnswerKey {
    AnswerKey::from(k)
}

const TWO_SINGLE: &str = r#"[
    {"question": "First", "possibleAnswers": ["A) yes", "B) no"], "correctAnswer": "A"},
    {"question": "Second", "possibleAnswers": ["A) no", "B) yes"], "correctAnswer": "B"}
]"#;

const ONE_MULTI: &str = r#"[
    {"question": "Pick two", "possibleAnswers": ["A) a", "B) b", "C) c"], "correctAnswer": "A,C"}
]"#;

const FOUR_MIXED: &str = r#"[
    {"question": "Q1", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "A"},
    {"question": "Q2", "possibleAnswers": ["A) a", "B) b", "C) c"], "correctAnswer": "B,C"},
    {"question": "Q3", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "B"},
    {"question": "Q4", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "A"}
]"#;

#[test]
fn all_single_select_answers_correct_passes() {
    let mut session = start(TWO_SINGLE, SessionSettings::default());
    session.select_answer(0, &key("A"), true).unwrap();
    assert_eq!(session.advance(), Ok(Step::Moved(1)));
    session.select_answer(1, &key("B"), true).unwrap();
    assert_eq!(session.advance(), Ok(Step::Submitted));

    let result = session.submission().unwrap().grade();
    assert_eq!(result.correct_count, 2);
    assert_eq!(result.percentage, 100.0);
    assert!(result.pass);
}

#[test]
fn right_count_of_wrong_keys_is_incorrect() {
    let mut session = start(ONE_MULTI, SessionSettings::default());
    session.select_answer(0, &key("A"), true).unwrap();
    assert!(session.select_answer(0, &key("B"), true).unwrap());
    assert!(session.can_advance());
    session.advance().unwrap();

    let result = session.submission().unwrap().grade();
    assert!(!result.outcomes[0].is_correct);
    assert_eq!(result.percentage, 0.0);
}

#[test]
fn timeout_mid_quiz_submits_over_full_denominator() {
    let settings = SessionSettings {
        time_limit_secs: Some(5),
        ..SessionSettings::default()
    };
    let mut session = start(FOUR_MIXED, settings);
    session.select_answer(0, &key("A"), true).unwrap();
    session.advance().unwrap();
    assert_eq!(session.current_index(), 1);

    session.clock_mut().advance(Duration::from_secs(4));
    session.poll();
    assert_eq!(session.remaining_display().as_deref(), Some("0:01"));
    assert_eq!(session.phase(), Phase::Answering);

    session.clock_mut().advance(Duration::from_secs(1));
    assert!(session.poll());
    assert_eq!(session.phase(), Phase::Submitted);

    let submission = session.submission().unwrap();
    assert_eq!(submission.selected_answers.len(), 4);
    for index in 1..4 {
        assert!(submission.selected_answers[&index].values().all(|s| !s));
    }

    let result = submission.grade();
    assert_eq!(result.total, 4);
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.percentage, 25.0);
    assert_eq!(result.missed().count(), 3);
}

#[test]
fn feedback_waits_for_required_count_then_auto_advances() {
    let json = r#"[
        {"question": "Pick two", "possibleAnswers": ["A) a", "B) b", "C) c"], "correctAnswer": "A,C"},
        {"question": "Next", "possibleAnswers": ["A) a", "B) b"], "correctAnswer": "A"}
    ]"#;
    let settings = SessionSettings {
        feedback_mode: true,
        ..SessionSettings::default()
    };
    let mut session = start(json, settings);

    session.select_answer(0, &key("A"), true).unwrap();
    assert_eq!(session.advance(), Ok(Step::AwaitingAnswers));
    assert_eq!(session.phase(), Phase::Answering);
    assert_eq!(session.feedback(&key("C")), None);
    session.clock_mut().advance(FEEDBACK_DELAY * 2);
    session.poll();
    assert_eq!(session.current_index(), 0);

    session.select_answer(0, &key("C"), true).unwrap();
    assert_eq!(session.phase(), Phase::FeedbackPending);
    assert_eq!(session.decoration(&key("A")), Decoration::Correct);
    assert_eq!(session.decoration(&key("B")), Decoration::Plain);

    session.clock_mut().advance(FEEDBACK_DELAY);
    assert!(session.poll());
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.phase(), Phase::Answering);
}

#[test]
fn feedback_on_last_question_submits_after_pause() {
    let settings = SessionSettings {
        feedback_mode: true,
        ..SessionSettings::default()
    };
    let mut session = start(ONE_MULTI, settings);
    session.select_answer(0, &key("A"), true).unwrap();
    session.select_answer(0, &key("C"), true).unwrap();
    assert!(session.submission().is_none());

    session.clock_mut().advance(FEEDBACK_DELAY);
    session.poll();
    let result = session.submission().unwrap().grade();
    assert!(result.pass);
}

#[test]
fn submitting_early_backfills_everything_untouched() {
    let mut session = start(FOUR_MIXED, SessionSettings::default());
    session.select_answer(0, &key("A"), true).unwrap();
    let submission = session.submit().unwrap().clone();

    let result = submission.grade();
    assert_eq!(result.total, 4);
    assert_eq!(result.correct_count, 1);
    assert_eq!(submission.grade(), result);
    assert!(session.submit().is_err());
}

#[test]
fn user_name_travels_with_the_submission() {
    let settings = SessionSettings {
        user_name: Some("Robin".into()),
        ..SessionSettings::default()
    };
    let mut session = start(TWO_SINGLE, settings);
    let submission = session.submit().unwrap();
    assert_eq!(submission.user_name.as_deref(), Some("Robin"));
}

#[test]
fn sample_is_capped_at_question_count() {
    let settings = SessionSettings {
        question_count: 2,
        ..SessionSettings::default()
    };
    let session = start(FOUR_MIXED, settings);
    assert_eq!(session.questions().len(), 2);
    assert_eq!(session.questions()[0].text, "Q1");
}

#[test]
fn bundled_question_file_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/questions.json");
    let pool = QuestionPool::load_from_path(&path).unwrap();
    assert_eq!(pool.len(), 6);
    assert!(pool
        .questions
        .iter()
        .all(|q| q.correct_keys().iter().all(|k| q.has_key(k))));
}
