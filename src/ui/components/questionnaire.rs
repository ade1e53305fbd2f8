//! Six-question form for manual mode

use crate::session::{AppCommand, AppStateSnapshot, ManualAnswers};
use crate::ui::components::label_widget;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{RichText, Vec2, WidgetType};

pub struct Questionnaire<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> Questionnaire<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let locked = snapshot.loading.is_some();

        let name = ui.add_enabled(
            !locked,
            egui::TextEdit::singleline(&mut self.state.names.user_name)
                .hint_text("Your name (optional)")
                .desired_width(240.0),
        );
        label_widget(&name, WidgetType::TextEdit, !locked, "Your name");
        if name.changed() {
            let names = self.state.names.clone();
            self.state.command(AppCommand::SetNames(names));
        }
        ui.add_space(self.theme.spacing_sm);

        for (index, question) in ManualAnswers::QUESTIONS.iter().enumerate() {
            let required = index < ManualAnswers::REQUIRED;
            let marker = if required { " *" } else { "" };
            ui.label(
                RichText::new(format!("{}. {}{}", index + 1, question, marker))
                    .color(self.theme.text_secondary),
            );
            let response = ui.add_enabled(
                !locked,
                egui::TextEdit::singleline(&mut self.state.answers[index])
                    .desired_width(f32::INFINITY),
            );
            label_widget(
                &response,
                WidgetType::TextEdit,
                !locked,
                &format!("Answer {}", index + 1),
            );
            ui.add_space(4.0);
        }

        ui.label(
            RichText::new("* required")
                .size(12.0)
                .color(self.theme.text_muted),
        );

        if let Some(error) = &snapshot.input_error {
            let label = ui.label(RichText::new(error).color(self.theme.error));
            label_widget(&label, WidgetType::Label, true, &format!("Validation error: {}", error));
        }

        ui.add_space(self.theme.spacing_sm);
        let submit = ui.add_enabled(
            !locked,
            egui::Button::new(RichText::new("Continue").strong())
                .fill(self.theme.primary)
                .min_size(Vec2::new(160.0, 38.0)),
        );
        label_widget(&submit, WidgetType::Button, !locked, "Submit answers");
        if submit.clicked() {
            let answers = self.state.answers.clone();
            self.state.command(AppCommand::SubmitAnswers(answers));
        }
    }
}
