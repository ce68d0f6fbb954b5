use egui::{Color32, RichText, Ui};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::UserConfig;
use crate::grader::{QuestionOutcome, ResultRecord};
use crate::pool::QuestionPool;
use crate::question::AnswerKey;
use crate::session::{Decoration, QuizSession};

const CORRECT: Color32 = Color32::from_rgb(60, 170, 90);
const INCORRECT: Color32 = Color32::from_rgb(210, 70, 70);
const SELECTED: Color32 = Color32::from_rgb(90, 140, 230);

#[derive(Default)]
pub struct QuizUI {
    pub show_settings: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizAction {
    None,
    Select(AnswerKey, bool),
    PreviousQuestion,
    NextQuestion,
    SetFeedbackMode(bool),
    ToggleTheme,
    BeginQuiz,
    RestartQuiz,
    ReturnToFileSelection,
}

fn decorated(text: &str, decoration: Decoration) -> RichText {
    let text = RichText::new(text);
    match decoration {
        Decoration::Correct => text.color(CORRECT).strong(),
        Decoration::Incorrect => text.color(INCORRECT).strong(),
        Decoration::Selected => text.color(SELECTED),
        Decoration::Plain => text,
    }
}

fn json_files(folder: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

impl QuizUI {
    pub fn show_file_selection(
        &mut self,
        ui: &mut Ui,
        quiz_folder: &Path,
        file_history: &[(String, i64)],
    ) -> Option<PathBuf> {
        let mut selected_file = None;

        ui.heading("Select Question File");
        ui.separator();

        if !file_history.is_empty() {
            ui.label("Recent Files:");
            for (file, _) in file_history {
                if ui.button(file).clicked() {
                    selected_file = Some(PathBuf::from(file));
                }
            }
            ui.separator();
        }

        ui.label(format!("Current Folder: {}", quiz_folder.display()));
        ui.add_space(10.0);
        ui.label("Available Question Files:");
        ui.separator();
        for path in json_files(quiz_folder) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if ui.button(name).clicked() {
                selected_file = Some(path.clone());
            }
        }

        selected_file
    }

    pub fn show_settings(&mut self, ui: &mut Ui, config: &mut UserConfig) {
        ui.heading("Settings");
        ui.separator();

        ui.label("Question Folder:");
        ui.horizontal(|ui| {
            ui.label(config.quiz_folder.display().to_string());
            if ui.button("Browse").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .set_directory(&config.quiz_folder)
                    .pick_folder()
                {
                    config.quiz_folder = path;
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Questions per quiz:");
            ui.add(egui::DragValue::new(&mut config.question_count).clamp_range(1..=500));
        });

        let mut timed = config.time_limit_secs.is_some();
        ui.checkbox(&mut timed, "Timed quiz");
        if timed {
            let mut minutes = config.time_limit_secs.unwrap_or(60 * 60) / 60;
            ui.horizontal(|ui| {
                ui.label("Minutes:");
                ui.add(egui::DragValue::new(&mut minutes).clamp_range(1..=600));
            });
            config.time_limit_secs = Some(minutes.max(1) * 60);
        } else {
            config.time_limit_secs = None;
        }

        ui.checkbox(&mut config.feedback_mode, "Show visual feedback by default");
        ui.horizontal(|ui| {
            ui.label("Your name:");
            ui.text_edit_singleline(&mut config.user_name);
        });
    }

    pub fn show_quiz_summary(&mut self, ui: &mut Ui, pool: &QuestionPool, config: &mut UserConfig) -> QuizAction {
        ui.heading("Quiz Summary");
        ui.separator();

        let multi = pool.questions.iter().filter(|q| q.is_multiple()).count();
        ui.label(format!("Source: {}", pool.source));
        ui.label(format!("Questions available: {}", pool.len()));
        ui.label(format!("Multiple-answer questions: {}", multi));
        ui.label(format!(
            "Questions this round: {}",
            config.question_count.min(pool.len())
        ));
        match config.time_limit_secs {
            Some(secs) => ui.label(format!("Time limit: {} minutes", secs / 60)),
            None => ui.label("Untimed"),
        };

        ui.add_space(10.0);
        ui.checkbox(&mut config.feedback_mode, "Show visual feedback");
        ui.horizontal(|ui| {
            ui.label("Your name:");
            ui.text_edit_singleline(&mut config.user_name);
        });

        ui.add_space(20.0);
        let mut action = QuizAction::None;
        ui.horizontal(|ui| {
            if ui.button("Begin Quiz").clicked() {
                action = QuizAction::BeginQuiz;
            }
            if ui.button("Back").clicked() {
                action = QuizAction::ReturnToFileSelection;
            }
        });
        action
    }

    pub fn show_question(&mut self, ui: &mut Ui, session: &QuizSession, dark_mode: bool) -> QuizAction {
        let mut action = QuizAction::None;
        let Some(question) = session.current_question() else {
            return action;
        };
        let index = session.current_index();

        ui.horizontal(|ui| {
            let mut feedback = session.feedback_mode();
            if ui.checkbox(&mut feedback, "Show Visual Feedback").changed() {
                action = QuizAction::SetFeedbackMode(feedback);
            }
            ui.add_space(50.0);
            let theme_label = if dark_mode { "Light Theme" } else { "Dark Theme" };
            if ui.button(theme_label).clicked() {
                action = QuizAction::ToggleTheme;
            }
        });

        ui.heading(format!("Question {} of {}", index + 1, session.questions().len()));
        if let Some(remaining) = session.remaining_display() {
            ui.label(format!("Time left: {}", remaining));
        }
        ui.separator();

        ui.add_space(10.0);
        ui.label(RichText::new(question.prompt()).size(18.0));
        ui.add_space(10.0);

        let editable = !session.is_locked(index);
        for (key, text) in question.options() {
            let selected = session.is_selected(index, key);
            let label = decorated(text, session.decoration(key));
            ui.add_enabled_ui(editable, |ui| {
                if question.is_multiple() {
                    let mut checked = selected;
                    if ui.checkbox(&mut checked, label).changed() {
                        action = QuizAction::Select(key.clone(), checked);
                    }
                } else if ui.radio(selected, label).clicked() && !selected {
                    action = QuizAction::Select(key.clone(), true);
                }
            });
        }

        if session.shows_navigation() {
            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(session.can_retreat(), egui::Button::new("Previous"))
                    .clicked()
                {
                    action = QuizAction::PreviousQuestion;
                }
                if ui
                    .add_enabled(session.can_advance(), egui::Button::new(session.advance_label()))
                    .clicked()
                {
                    action = QuizAction::NextQuestion;
                }
            });
        }

        action
    }

    pub fn show_results(
        &mut self,
        ui: &mut Ui,
        result: &ResultRecord,
        user_name: Option<&str>,
    ) -> (Option<usize>, QuizAction) {
        match user_name {
            Some(name) => ui.heading(format!("{}'s Result", name)),
            None => ui.heading("Your Result"),
        };
        ui.separator();

        let color = if result.pass { CORRECT } else { INCORRECT };
        ui.label(RichText::new(result.summary()).size(22.0).color(color));
        ui.label(format!("Score: {}/{}", result.correct_count, result.total));

        let mut selected_question = None;
        let mut action = QuizAction::None;

        if result.missed().next().is_some() {
            ui.add_space(10.0);
            ui.label("Missed Questions:");
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                for outcome in result.missed() {
                    if ui
                        .button(format!("Question {}: {}", outcome.index + 1, outcome.question.text))
                        .clicked()
                    {
                        selected_question = Some(outcome.index);
                    }
                }
            });
        }

        ui.add_space(20.0);
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Restart Quiz").clicked() {
                action = QuizAction::RestartQuiz;
            }
            if ui.button("Return to File Selection").clicked() {
                action = QuizAction::ReturnToFileSelection;
            }
        });

        (selected_question, action)
    }

    /// Returns true when the user wants to go back to the results.
    pub fn show_review(&mut self, ui: &mut Ui, outcome: &QuestionOutcome) -> bool {
        ui.heading(format!("Review Question {}", outcome.index + 1));
        ui.separator();
        ui.label(RichText::new(outcome.question.prompt()).size(18.0));
        ui.add_space(10.0);

        let wrong: Vec<_> = outcome.wrongly_selected();
        let omitted: Vec<_> = outcome.wrongly_omitted();
        for (key, text) in outcome.question.options() {
            let decoration = if wrong.contains(&key) {
                Decoration::Incorrect
            } else if omitted.contains(&key) || outcome.correct_answer_keys.contains(key) {
                Decoration::Correct
            } else {
                Decoration::Plain
            };
            let marker = if outcome.user_answer_keys.contains(key) { "[x]" } else { "[ ]" };
            ui.label(decorated(&format!("{} {}", marker, text), decoration));
        }

        ui.add_space(10.0);
        let join = |keys: &[&AnswerKey]| {
            keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
        };
        if !wrong.is_empty() {
            ui.label(format!("Wrongly selected: {}", join(&wrong)));
        }
        if !omitted.is_empty() {
            ui.label(format!("Missed: {}", join(&omitted)));
        }

        ui.add_space(20.0);
        ui.button("Back to Results").clicked()
    }

    pub fn show_load_error(&mut self, ui: &mut Ui, message: &str) -> QuizAction {
        ui.heading("Questions unavailable");
        ui.separator();
        ui.label(RichText::new(message).color(INCORRECT));
        ui.add_space(20.0);
        if ui.button("Return to File Selection").clicked() {
            QuizAction::ReturnToFileSelection
        } else {
            QuizAction::None
        }
    }
}
