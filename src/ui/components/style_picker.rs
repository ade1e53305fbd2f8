//! Feedback style chooser, revealed once the inputs are ready

use crate::session::{AppCommand, AppStateSnapshot, FeedbackStyle};
use crate::ui::components::label_widget;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{RichText, Vec2, WidgetType};

pub struct StylePicker<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> StylePicker<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let busy = snapshot.loading.is_some();
        let selected = snapshot.session.feedback_style.as_ref();

        ui.label(
            RichText::new("How should we judge you?")
                .size(18.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.add_space(self.theme.spacing_sm);

        ui.horizontal_wrapped(|ui| {
            for (tag, text) in FeedbackStyle::OFFERED {
                let is_selected = selected.is_some_and(|s| s.as_str() == tag);
                let fill = if is_selected {
                    self.theme.secondary
                } else {
                    self.theme.bg_tertiary
                };
                let button = egui::Button::new(RichText::new(text).color(self.theme.text_primary))
                    .fill(fill)
                    .min_size(Vec2::new(140.0, 40.0))
                    .rounding(self.theme.button_rounding);

                let response = ui.add_enabled(!busy, button);
                label_widget(&response, WidgetType::Button, !busy, &format!("Style {}", tag));
                if response.clicked() {
                    self.state
                        .command(AppCommand::SelectStyle(FeedbackStyle::new(tag)));
                }
            }
        });
    }
}
