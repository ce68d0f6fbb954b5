use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::session::{SessionSettings, DEFAULT_QUESTION_COUNT, FEEDBACK_DELAY};

const CONFIG_FILE: &str = "userconfig.cfg";
const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub quiz_folder: PathBuf,
    pub file_history: Vec<(String, i64)>,
    pub question_count: usize,
    pub time_limit_secs: Option<u32>,
    pub feedback_mode: bool,
    pub dark_mode: bool,
    pub user_name: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            quiz_folder: PathBuf::from("."),
            file_history: Vec::new(),
            question_count: DEFAULT_QUESTION_COUNT,
            time_limit_secs: None,
            feedback_mode: false,
            dark_mode: true,
            user_name: String::new(),
        }
    }
}

/// `<config dir>/quiz_session/userconfig.cfg`, or the working directory when
/// the platform has no config dir.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("quiz_session"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE)
}

impl UserConfig {
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Missing or unreadable preferences fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring corrupt config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn update_file_history(&mut self, filename: String) {
        let timestamp = chrono::Utc::now().timestamp();
        self.file_history.retain(|(f, _)| f != &filename);
        self.file_history.insert(0, (filename, timestamp));
        if self.file_history.len() > HISTORY_LIMIT {
            self.file_history.truncate(HISTORY_LIMIT);
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        let name = self.user_name.trim();
        SessionSettings {
            question_count: self.question_count.max(1),
            time_limit_secs: self.time_limit_secs.filter(|secs| *secs > 0),
            feedback_mode: self.feedback_mode,
            feedback_delay: FEEDBACK_DELAY,
            user_name: (!name.is_empty()).then(|| name.to_string()),
        }
    }
}
