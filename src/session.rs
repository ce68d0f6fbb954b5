use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::error::{PoolError, SessionError};
use crate::grader::{self, ResultRecord};
use crate::pool::{QuestionPool, Shuffler};
use crate::question::{AnswerKey, Question, SelectionMode};
use crate::timer::{format_remaining, Clock, Countdown, TimerHandle};

/// Pause between showing feedback and moving on.
pub const FEEDBACK_DELAY: Duration = Duration::from_millis(2000);

pub const DEFAULT_QUESTION_COUNT: usize = 65;

/// Answer key -> selected, for the keys the user has touched.
pub type AnswerMap = BTreeMap<AnswerKey, bool>;

/// Question index -> touched answers.
pub type SelectedAnswers = BTreeMap<usize, AnswerMap>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Answering,
    FeedbackPending,
    Submitted,
    Failed,
}

impl Phase {
    pub fn is_in_progress(self) -> bool {
        matches!(self, Phase::Answering | Phase::FeedbackPending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

/// How an answer option of the current question should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Correct,
    Incorrect,
    Selected,
    Plain,
}

/// What a forward step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(usize),
    FeedbackStarted,
    AwaitingAnswers,
    Submitted,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub question_count: usize,
    pub time_limit_secs: Option<u32>,
    pub feedback_mode: bool,
    pub feedback_delay: Duration,
    pub user_name: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            time_limit_secs: None,
            feedback_mode: false,
            feedback_delay: FEEDBACK_DELAY,
            user_name: None,
        }
    }
}

/// Everything the result screen needs, with unanswered questions backfilled.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub questions: Vec<Question>,
    pub selected_answers: SelectedAnswers,
    pub user_name: Option<String>,
}

impl Submission {
    pub fn grade(&self) -> ResultRecord {
        grader::grade(&self.questions, &self.selected_answers)
    }
}

#[derive(Debug)]
struct PendingFeedback {
    question: usize,
    marks: BTreeMap<AnswerKey, Feedback>,
    timer: TimerHandle,
}

/// Number of keys currently marked selected.
pub fn selected_count(answers: &AnswerMap) -> usize {
    answers.values().filter(|selected| **selected).count()
}

/// Marks every correct key `Correct` whether or not it was picked, and every
/// picked wrong key `Incorrect`. Untouched wrong keys get no mark.
pub fn compute_feedback(question: &Question, answers: &AnswerMap) -> BTreeMap<AnswerKey, Feedback> {
    let mut marks = BTreeMap::new();
    for key in question.keys() {
        let is_correct = question.correct_keys().contains(key);
        let is_selected = answers.get(key).copied().unwrap_or(false);
        if is_correct {
            marks.insert(key.clone(), Feedback::Correct);
        } else if is_selected {
            marks.insert(key.clone(), Feedback::Incorrect);
        }
    }
    marks
}

#[derive(Debug)]
pub struct QuizSession {
    phase: Phase,
    settings: SessionSettings,
    clock: Clock,
    questions: Vec<Question>,
    current_index: usize,
    furthest_index: usize,
    selected_answers: SelectedAnswers,
    locked: BTreeSet<usize>,
    feedback_mode: bool,
    pending: Option<PendingFeedback>,
    countdown: Option<Countdown>,
    failure: Option<PoolError>,
    submission: Option<Submission>,
}

impl QuizSession {
    /// A session waiting for its questions.
    pub fn new(settings: SessionSettings, clock: Clock) -> Self {
        let feedback_mode = settings.feedback_mode;
        Self {
            phase: Phase::Loading,
            settings,
            clock,
            questions: Vec::new(),
            current_index: 0,
            furthest_index: 0,
            selected_answers: SelectedAnswers::new(),
            locked: BTreeSet::new(),
            feedback_mode,
            pending: None,
            countdown: None,
            failure: None,
            submission: None,
        }
    }

    /// Sample a fresh question sequence from `pool` and start answering.
    pub fn start(
        pool: &QuestionPool,
        settings: SessionSettings,
        clock: Clock,
        shuffler: &mut dyn Shuffler,
    ) -> Self {
        let questions = pool.sample(settings.question_count, shuffler);
        let mut session = Self::new(settings, clock);
        // A fresh session is always in Loading.
        let _ = session.begin(Ok(questions));
        session
    }

    /// Leave `Loading`, either with the sampled questions or with the
    /// reason they could not be obtained.
    pub fn begin(&mut self, loaded: Result<Vec<Question>, PoolError>) -> Result<(), SessionError> {
        self.require(Phase::Loading == self.phase, "begin")?;

        match loaded {
            Ok(questions) if !questions.is_empty() => {
                info!(
                    "Quiz started with {} questions (feedback: {}, time limit: {:?})",
                    questions.len(),
                    self.feedback_mode,
                    self.settings.time_limit_secs
                );
                self.questions = questions;
                self.countdown = self
                    .settings
                    .time_limit_secs
                    .filter(|secs| *secs > 0)
                    .map(|secs| Countdown::start(secs, self.clock.now()));
                self.phase = Phase::Answering;
            }
            Ok(_) => self.fail(PoolError::Empty),
            Err(e) => self.fail(e),
        }
        Ok(())
    }

    fn fail(&mut self, error: PoolError) {
        warn!("Quiz could not start: {}", error);
        self.failure = Some(error);
        self.phase = Phase::Failed;
    }

    fn require(&self, allowed: bool, operation: &'static str) -> Result<(), SessionError> {
        if allowed {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    /// Record a selection change. Single-select questions keep exactly one
    /// key selected; multi-select keys accumulate. In feedback mode, reaching
    /// the current question's required count starts the feedback pause.
    ///
    /// Returns whether the question now meets its required count.
    pub fn select_answer(
        &mut self,
        question_index: usize,
        key: &AnswerKey,
        selected: bool,
    ) -> Result<bool, SessionError> {
        self.require(self.phase == Phase::Answering, "select_answer")?;
        let question = self
            .questions
            .get(question_index)
            .ok_or(SessionError::QuestionOutOfRange(question_index))?;
        if question_index > self.furthest_index {
            return Err(SessionError::QuestionNotVisited(question_index));
        }
        if self.locked.contains(&question_index) {
            return Err(SessionError::QuestionLocked(question_index));
        }
        if !question.has_key(key) {
            return Err(SessionError::UnknownAnswerKey {
                question: question_index,
                key: key.to_string(),
            });
        }
        let mode = question.mode();

        let answers = self.selected_answers.entry(question_index).or_default();
        let before = answers.clone();
        match (mode, selected) {
            (SelectionMode::Single, true) => {
                for value in answers.values_mut() {
                    *value = false;
                }
                answers.insert(key.clone(), true);
            }
            _ => {
                answers.insert(key.clone(), selected);
            }
        }
        let changed = *answers != before;
        debug!(
            "Question {}: {} -> {} ({})",
            question_index,
            key,
            selected,
            if changed { "changed" } else { "unchanged" }
        );

        let met = self.threshold_met(question_index);
        if changed && met && self.feedback_mode && question_index == self.current_index {
            self.start_feedback();
        }
        Ok(met)
    }

    /// Move forward, submit at the last question, or in feedback mode start
    /// the feedback pause once the required count is met.
    pub fn advance(&mut self) -> Result<Step, SessionError> {
        self.require(self.phase == Phase::Answering, "advance")?;

        if self.feedback_mode && !self.locked.contains(&self.current_index) {
            if !self.threshold_met(self.current_index) {
                debug!("Question {} still awaiting answers", self.current_index);
                return Ok(Step::AwaitingAnswers);
            }
            self.start_feedback();
            return Ok(Step::FeedbackStarted);
        }
        Ok(self.move_forward_or_submit())
    }

    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        self.require(self.phase == Phase::Answering, "retreat")?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(self.current_index)
    }

    /// Consume one second of a timed session. Reaching zero submits,
    /// discarding any pending feedback.
    pub fn tick(&mut self) -> Result<u32, SessionError> {
        self.require(self.phase.is_in_progress(), "tick")?;
        let countdown = self.countdown.as_mut().ok_or(SessionError::InvalidTransition {
            operation: "tick",
            phase: self.phase,
        })?;
        let remaining = countdown.tick();
        if countdown.is_expired() {
            info!("Time is up on question {}", self.current_index);
            self.finish();
        }
        Ok(remaining)
    }

    /// Fire every timer that is due on the session clock, in deadline order.
    /// A countdown tick due at the same instant as the feedback pause runs
    /// first. Returns whether anything fired.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        let mut fired = false;
        while self.phase.is_in_progress() {
            let tick_at = self
                .countdown
                .as_ref()
                .map(Countdown::next_tick)
                .filter(|at| *at <= now);
            let feedback_at = self
                .pending
                .as_ref()
                .filter(|p| p.timer.is_due(now))
                .map(|p| p.timer.deadline());

            match (tick_at, feedback_at) {
                (Some(tick), Some(feedback)) if feedback < tick => self.complete_feedback(),
                (Some(_), _) => {
                    if let Err(e) = self.tick() {
                        warn!("Countdown tick failed: {}", e);
                        break;
                    }
                }
                (None, Some(_)) => self.complete_feedback(),
                (None, None) => break,
            }
            fired = true;
        }
        fired
    }

    /// End the session. Questions never touched are backfilled with every
    /// correct key explicitly unselected so they grade as wrong.
    pub fn submit(&mut self) -> Result<&Submission, SessionError> {
        self.require(self.phase.is_in_progress(), "submit")?;
        self.finish();
        self.submission.as_ref().ok_or(SessionError::InvalidTransition {
            operation: "submit",
            phase: self.phase,
        })
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Cancelled feedback timer {}", pending.timer.id());
        }
        self.countdown = None;

        let mut backfilled = 0;
        for (index, question) in self.questions.iter().enumerate() {
            self.selected_answers.entry(index).or_insert_with(|| {
                backfilled += 1;
                question
                    .correct_keys()
                    .iter()
                    .map(|key| (key.clone(), false))
                    .collect()
            });
        }

        info!(
            "Quiz submitted at question {} of {} ({} unanswered)",
            self.current_index + 1,
            self.questions.len(),
            backfilled
        );
        self.submission = Some(Submission {
            questions: self.questions.clone(),
            selected_answers: self.selected_answers.clone(),
            user_name: self.settings.user_name.clone(),
        });
        self.phase = Phase::Submitted;
    }

    /// Switch feedback mode. Turning it on while the current question already
    /// meets its required count starts feedback right away.
    pub fn set_feedback_mode(&mut self, on: bool) -> Result<(), SessionError> {
        self.require(self.phase.is_in_progress(), "set_feedback_mode")?;
        self.feedback_mode = on;
        debug!("Feedback mode {}", if on { "on" } else { "off" });
        if on
            && self.phase == Phase::Answering
            && !self.locked.contains(&self.current_index)
            && self.threshold_met(self.current_index)
        {
            self.start_feedback();
        }
        Ok(())
    }

    fn start_feedback(&mut self) {
        let index = self.current_index;
        let (Some(question), Some(answers)) =
            (self.questions.get(index), self.selected_answers.get(&index))
        else {
            return;
        };
        let marks = compute_feedback(question, answers);
        let timer = TimerHandle::schedule(self.clock.now(), self.settings.feedback_delay);
        debug!("Feedback for question {} shown, timer {} armed", index, timer.id());
        self.locked.insert(index);
        self.pending = Some(PendingFeedback {
            question: index,
            marks,
            timer,
        });
        self.phase = Phase::FeedbackPending;
    }

    fn complete_feedback(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Feedback timer {} fired for question {}", pending.timer.id(), pending.question);
            self.phase = Phase::Answering;
            self.move_forward_or_submit();
        }
    }

    fn move_forward_or_submit(&mut self) -> Step {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.furthest_index = self.furthest_index.max(self.current_index);
            Step::Moved(self.current_index)
        } else {
            self.finish();
            Step::Submitted
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn selected_answers(&self) -> &SelectedAnswers {
        &self.selected_answers
    }

    pub fn is_selected(&self, question_index: usize, key: &AnswerKey) -> bool {
        self.selected_answers
            .get(&question_index)
            .and_then(|answers| answers.get(key))
            .copied()
            .unwrap_or(false)
    }

    pub fn threshold_met(&self, question_index: usize) -> bool {
        let Some(question) = self.questions.get(question_index) else {
            return false;
        };
        let count = self
            .selected_answers
            .get(&question_index)
            .map(selected_count)
            .unwrap_or(0);
        count >= question.required_count()
    }

    pub fn is_locked(&self, question_index: usize) -> bool {
        self.locked.contains(&question_index)
    }

    pub fn feedback_mode(&self) -> bool {
        self.feedback_mode
    }

    /// Feedback mark for a key of the current question while the pause runs.
    pub fn feedback(&self, key: &AnswerKey) -> Option<Feedback> {
        self.pending
            .as_ref()
            .filter(|p| p.question == self.current_index)
            .and_then(|p| p.marks.get(key).copied())
    }

    pub fn decoration(&self, key: &AnswerKey) -> Decoration {
        match self.feedback(key) {
            Some(Feedback::Correct) => Decoration::Correct,
            Some(Feedback::Incorrect) => Decoration::Incorrect,
            None if self.is_selected(self.current_index, key) => Decoration::Selected,
            None => Decoration::Plain,
        }
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    pub fn remaining_display(&self) -> Option<String> {
        self.remaining_seconds().map(format_remaining)
    }

    /// Manual navigation is only offered when feedback mode is off.
    pub fn shows_navigation(&self) -> bool {
        !self.feedback_mode
    }

    pub fn can_retreat(&self) -> bool {
        self.phase == Phase::Answering && self.current_index > 0
    }

    /// Multi-select questions keep "Next" disabled until enough keys are picked.
    pub fn can_advance(&self) -> bool {
        if self.phase != Phase::Answering {
            return false;
        }
        match self.current_question() {
            Some(q) if q.is_multiple() => self.threshold_met(self.current_index),
            Some(_) => true,
            None => false,
        }
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    pub fn advance_label(&self) -> &'static str {
        if self.is_last_question() {
            "Submit"
        } else {
            "Next"
        }
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.phase.is_in_progress() {
            return None;
        }
        let tick = self.countdown.as_ref().map(Countdown::next_tick);
        let feedback = self.pending.as_ref().map(|p| p.timer.deadline());
        match (tick, feedback) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn user_name(&self) -> Option<&str> {
        self.settings.user_name.as_deref()
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn failure(&self) -> Option<&PoolError> {
        self.failure.as_ref()
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}
