use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, File};
use std::path::PathBuf;

const LEVEL_VAR: &str = "QUIZ_LOG";
const LOG_FILE: &str = "quiz_session.log";

/// Level from `QUIZ_LOG`, defaulting to `info`.
pub fn level_from_env() -> LevelFilter {
    std::env::var(LEVEL_VAR)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

fn log_file_path() -> Option<PathBuf> {
    let dir = dirs::data_local_dir()?.join("quiz_session");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(LOG_FILE))
}

/// Terminal logger, plus a log file when the platform data dir is usable.
pub fn init() {
    let level = level_from_env();
    let file_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file_path() {
        match File::create(&path) {
            Ok(file) => loggers.push(WriteLogger::new(level, file_config, file)),
            Err(e) => eprintln!("Could not open log file {}: {}", path.display(), e),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Logger already initialised: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_level_names() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("chatty"), None);
    }
}
