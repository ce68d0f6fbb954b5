use eframe::egui;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::UserConfig;
use crate::grader::ResultRecord;
use crate::pool::{QuestionPool, RandomShuffler};
use crate::session::{Phase, QuizSession};
use crate::theme::{EguiTheme, ThemeController};
use crate::timer::Clock;
use crate::ui::{QuizAction, QuizUI};

#[derive(Debug)]
enum AppState {
    FileSelection,
    QuizSummary,
    QuizInProgress,
    QuizResults,
    QuestionReview,
    LoadFailed,
}

pub struct QuizApp {
    config: UserConfig,
    ui: QuizUI,
    theme: EguiTheme,
    pool: Option<QuestionPool>,
    session: Option<QuizSession>,
    result: Option<ResultRecord>,
    review_index: Option<usize>,
    state: AppState,
}

impl QuizApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = UserConfig::load();
        let theme = EguiTheme::new(cc.egui_ctx.clone(), config.dark_mode);
        Self {
            config,
            ui: QuizUI::default(),
            theme,
            pool: None,
            session: None,
            result: None,
            review_index: None,
            state: AppState::FileSelection,
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            warn!("Failed to save settings: {}", e);
        }
    }

    fn load_pool(&mut self, path: &Path) {
        match QuestionPool::load_from_path(path) {
            Ok(pool) => {
                self.pool = Some(pool);
                self.session = None;
                self.state = AppState::QuizSummary;
                self.config.update_file_history(path.display().to_string());
                self.save_config();
            }
            Err(e) => {
                // The session records the failure as its terminal state.
                let mut session = QuizSession::new(self.config.session_settings(), Clock::System);
                if let Err(e) = session.begin(Err(e)) {
                    warn!("{}", e);
                }
                self.pool = None;
                self.session = Some(session);
                self.state = AppState::LoadFailed;
            }
        }
    }

    fn start_session(&mut self) {
        if let Some(pool) = &self.pool {
            self.save_config();
            let session = QuizSession::start(
                pool,
                self.config.session_settings(),
                Clock::System,
                &mut RandomShuffler,
            );
            self.state = match session.phase() {
                Phase::Failed => AppState::LoadFailed,
                _ => AppState::QuizInProgress,
            };
            self.session = Some(session);
            self.result = None;
            self.review_index = None;
        }
    }

    fn handle_quiz_action(&mut self, action: QuizAction) {
        if action == QuizAction::ToggleTheme {
            self.config.dark_mode = self.theme.toggle();
            self.save_config();
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };
        let outcome = match action {
            QuizAction::Select(key, selected) => {
                let index = session.current_index();
                session.select_answer(index, &key, selected).map(|_| ())
            }
            QuizAction::PreviousQuestion => session.retreat().map(|_| ()),
            QuizAction::NextQuestion => session.advance().map(|_| ()),
            QuizAction::SetFeedbackMode(on) => session.set_feedback_mode(on),
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            warn!("Ignored quiz event: {}", e);
        }
    }

    /// Run due timers and pick up a submission however it happened.
    fn drive_session(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else {
            return;
        };
        session.poll();

        if let Some(submission) = session.submission() {
            info!("Showing results for {} questions", submission.questions.len());
            self.result = Some(submission.grade());
            self.state = AppState::QuizResults;
            return;
        }
        if let Some(deadline) = session.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }

    fn return_to_file_selection(&mut self) {
        self.state = AppState::FileSelection;
        self.pool = None;
        self.session = None;
        self.result = None;
        self.review_index = None;
    }
}

impl eframe::App for QuizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.state, AppState::QuizInProgress) {
            self.drive_session(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            match self.state {
                AppState::FileSelection => {
                    if let Some(file) = self.ui.show_file_selection(
                        ui,
                        &self.config.quiz_folder,
                        &self.config.file_history,
                    ) {
                        let path = resolve_question_file(&self.config.quiz_folder, file);
                        self.load_pool(&path);
                    }

                    if ui.button("Settings").clicked() {
                        self.ui.show_settings = !self.ui.show_settings;
                    }

                    if self.ui.show_settings {
                        let mut show = true;
                        egui::Window::new("Settings")
                            .open(&mut show)
                            .show(ctx, |ui| {
                                self.ui.show_settings(ui, &mut self.config);
                            });
                        if !show {
                            self.save_config();
                        }
                        self.ui.show_settings = show;
                    }
                }
                AppState::QuizSummary => {
                    if let Some(pool) = &self.pool {
                        match self.ui.show_quiz_summary(ui, pool, &mut self.config) {
                            QuizAction::BeginQuiz => self.start_session(),
                            QuizAction::ReturnToFileSelection => self.return_to_file_selection(),
                            _ => {}
                        }
                    }
                }
                AppState::QuizInProgress => {
                    if let Some(session) = &self.session {
                        let action = self.ui.show_question(ui, session, self.theme.is_dark());
                        if action != QuizAction::None {
                            self.handle_quiz_action(action);
                            ctx.request_repaint();
                        }
                    }
                }
                AppState::QuizResults => {
                    if let Some(result) = &self.result {
                        let user_name = self
                            .session
                            .as_ref()
                            .and_then(|s| s.submission())
                            .and_then(|s| s.user_name.as_deref());
                        let (selected_question, action) =
                            self.ui.show_results(ui, result, user_name);

                        if let Some(index) = selected_question {
                            self.review_index = Some(index);
                            self.state = AppState::QuestionReview;
                        }
                        match action {
                            QuizAction::RestartQuiz => self.start_session(),
                            QuizAction::ReturnToFileSelection => self.return_to_file_selection(),
                            _ => {}
                        }
                    }
                }
                AppState::QuestionReview => {
                    let outcome = self
                        .review_index
                        .zip(self.result.as_ref())
                        .and_then(|(index, result)| result.outcomes.get(index));
                    match outcome {
                        Some(outcome) => {
                            if self.ui.show_review(ui, outcome) {
                                self.review_index = None;
                                self.state = AppState::QuizResults;
                            }
                        }
                        None => self.state = AppState::QuizResults,
                    }
                }
                AppState::LoadFailed => {
                    let message = self
                        .session
                        .as_ref()
                        .and_then(|s| s.failure())
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "No questions could be loaded.".into());
                    if self.ui.show_load_error(ui, &message) == QuizAction::ReturnToFileSelection {
                        self.return_to_file_selection();
                    }
                }
            }
        });
    }
}

/// Where a history entry or folder listing points, resolved against the
/// question folder.
pub fn resolve_question_file(folder: &Path, file: PathBuf) -> PathBuf {
    if file.is_absolute() {
        file
    } else {
        folder.join(file)
    }
}
