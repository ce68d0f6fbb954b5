//! Scoring of a finished answer set.
//!
//! Grading is all-or-nothing per question: the selected keys must equal the
//! correct keys exactly. The functions here are pure and may be called any
//! number of times on the same submission.

use log::info;
use std::collections::BTreeSet;

use crate::question::{AnswerKey, Question};
use crate::session::SelectedAnswers;

/// Minimum percentage for a pass.
pub const PASS_PERCENTAGE: f64 = 70.0;

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOutcome {
    pub index: usize,
    pub question: Question,
    pub user_answer_keys: BTreeSet<AnswerKey>,
    pub correct_answer_keys: BTreeSet<AnswerKey>,
    pub is_correct: bool,
}

impl QuestionOutcome {
    /// Picked but not correct, in display order.
    pub fn wrongly_selected(&self) -> Vec<&AnswerKey> {
        self.question
            .keys()
            .iter()
            .filter(|k| self.user_answer_keys.contains(*k) && !self.correct_answer_keys.contains(*k))
            .collect()
    }

    /// Correct but not picked, in display order.
    pub fn wrongly_omitted(&self) -> Vec<&AnswerKey> {
        self.question
            .keys()
            .iter()
            .filter(|k| self.correct_answer_keys.contains(*k) && !self.user_answer_keys.contains(*k))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub correct_count: usize,
    pub total: usize,
    pub percentage: f64,
    pub pass: bool,
    pub outcomes: Vec<QuestionOutcome>,
}

impl ResultRecord {
    pub fn missed(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_correct)
    }

    /// `Pass - 84.62%`
    pub fn summary(&self) -> String {
        format!(
            "{} - {:.2}%",
            if self.pass { "Pass" } else { "Fail" },
            self.percentage
        )
    }
}

pub fn grade(questions: &[Question], selected_answers: &SelectedAnswers) -> ResultRecord {
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let user_answer_keys: BTreeSet<AnswerKey> = selected_answers
                .get(&index)
                .map(|answers| {
                    answers
                        .iter()
                        .filter(|(_, selected)| **selected)
                        .map(|(key, _)| key.clone())
                        .collect()
                })
                .unwrap_or_default();
            let correct_answer_keys = question.correct_keys().clone();
            let is_correct = user_answer_keys == correct_answer_keys;
            QuestionOutcome {
                index,
                question: question.clone(),
                user_answer_keys,
                correct_answer_keys,
                is_correct,
            }
        })
        .collect();

    let total = questions.len();
    let correct_count = outcomes.iter().filter(|o| o.is_correct).count();
    let percentage = if total == 0 {
        0.0
    } else {
        correct_count as f64 * 100.0 / total as f64
    };
    let pass = percentage >= PASS_PERCENTAGE;

    info!(
        "Graded {}/{} correct ({:.2}%, {})",
        correct_count,
        total,
        percentage,
        if pass { "pass" } else { "fail" }
    );

    ResultRecord {
        correct_count,
        total,
        percentage,
        pass,
        outcomes,
    }
}
