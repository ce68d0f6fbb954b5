use egui::{Context, Visuals};

/// Light/dark switching owned by the display layer. The quiz core never
/// touches the theme.
pub trait ThemeController {
    /// Flip the theme and return whether it is now dark.
    fn toggle(&mut self) -> bool;
    fn is_dark(&self) -> bool;
}

pub struct EguiTheme {
    ctx: Context,
    dark: bool,
}

impl EguiTheme {
    pub fn new(ctx: Context, dark: bool) -> Self {
        let theme = Self { ctx, dark };
        theme.apply();
        theme
    }

    fn apply(&self) {
        let visuals = if self.dark { Visuals::dark() } else { Visuals::light() };
        self.ctx.set_visuals(visuals);
    }
}

impl ThemeController for EguiTheme {
    fn toggle(&mut self) -> bool {
        self.dark = !self.dark;
        self.apply();
        self.dark
    }

    fn is_dark(&self) -> bool {
        self.dark
    }
}
