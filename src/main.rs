use eframe::egui;
use quiz_session::app::QuizApp;
use quiz_session::logging;

fn main() -> Result<(), eframe::Error> {
    logging::init();
    log::info!("Starting quiz_session {}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(800.0, 600.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Quiz",
        options,
        Box::new(|cc| Box::new(QuizApp::new(cc))),
    )
}
