//! Loading indicator for an in-flight analysis

use crate::processor::status_message;
use crate::session::LoadingState;
use crate::ui::components::label_widget;
use crate::ui::theme::Theme;
use egui::{RichText, WidgetType};

pub struct LoadingPanel<'a> {
    loading: &'a LoadingState,
    theme: &'a Theme,
}

impl<'a> LoadingPanel<'a> {
    pub fn new(loading: &'a LoadingState, theme: &'a Theme) -> Self {
        Self { loading, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        self.theme.card_frame().show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add(egui::Spinner::new().size(36.0).color(self.theme.primary));
                ui.add_space(self.theme.spacing_sm);

                let headline = ui.label(
                    RichText::new(self.loading.headline)
                        .size(18.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                label_widget(
                    &headline,
                    WidgetType::Label,
                    true,
                    &format!("Loading: {}", self.loading.headline),
                );

                let status = status_message(self.loading.status_index);
                let line = ui.label(RichText::new(status).color(self.theme.text_muted));
                label_widget(&line, WidgetType::Label, true, &format!("Status: {}", status));
            });
        });
    }
}
