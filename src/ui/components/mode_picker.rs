//! Mode picker shown when no mode is active

use crate::session::{AppCommand, Mode};
use crate::ui::components::label_widget;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{RichText, Vec2, WidgetType};

pub struct ModePicker<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> ModePicker<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.heading("Choose how to check your taste");
            ui.add_space(self.theme.spacing);

            for mode in Mode::ALL {
                let spec = mode.spec();
                let button = egui::Button::new(
                    RichText::new(format!("{}  {}", icon(mode), spec.label))
                        .size(17.0)
                        .color(self.theme.text_primary),
                )
                .min_size(Vec2::new(280.0, 52.0))
                .rounding(self.theme.button_rounding);

                let response = ui.add(button).on_hover_text(blurb(mode));
                label_widget(&response, WidgetType::Button, true, spec.label);
                if response.clicked() {
                    self.state.command(AppCommand::SelectMode(mode));
                }
                ui.add_space(self.theme.spacing_sm);
            }
        });
    }
}

fn icon(mode: Mode) -> &'static str {
    match mode {
        Mode::Single => "📱",
        Mode::Evolution => "📈",
        Mode::Battle => "⚔",
        Mode::Manual => "✍",
    }
}

fn blurb(mode: Mode) -> &'static str {
    match mode {
        Mode::Single => "Upload one screenshot of your listening stats",
        Mode::Evolution => "Upload 2-3 screenshots from different periods",
        Mode::Battle => "Two people, one screenshot each",
        Mode::Manual => "No screenshot? Answer six quick questions",
    }
}
