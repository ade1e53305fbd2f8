//! Header bar with branding and the signed-in user

use crate::session::{AppCommand, AppStateSnapshot};
use crate::ui::components::label_widget;
use crate::ui::state::UiState;
use crate::ui::theme::Theme;
use egui::{RichText, WidgetType};

/// Top header: title on the left, account info on the right
pub struct Header<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new("🎵 TasteCheck")
                    .size(22.0)
                    .strong()
                    .color(self.theme.text_primary),
            );
            ui.label(
                RichText::new("How good is your music taste?")
                    .size(13.0)
                    .color(self.theme.text_muted),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let user = &snapshot.auth.user;
                if user.authenticated {
                    let logout = ui.button("Logout");
                    label_widget(&logout, WidgetType::Button, true, "Logout");
                    if logout.clicked() {
                        self.state.command(AppCommand::Logout);
                    }

                    if user.is_premium() {
                        egui::Frame::none()
                            .fill(self.theme.premium)
                            .rounding(self.theme.button_rounding)
                            .inner_margin(egui::Margin::symmetric(8.0, 2.0))
                            .show(ui, |ui| {
                                let badge = ui.label(
                                    RichText::new("Premium")
                                        .size(12.0)
                                        .strong()
                                        .color(self.theme.bg_primary),
                                );
                                label_widget(&badge, WidgetType::Label, true, "Premium badge");
                            });
                    }

                    if let Some(email) = &user.email {
                        let label =
                            ui.label(RichText::new(email).color(self.theme.text_secondary));
                        label_widget(
                            &label,
                            WidgetType::Label,
                            true,
                            &format!("Signed in as {}", email),
                        );
                    }
                } else if snapshot.auth.guest {
                    ui.label(RichText::new("Guest").color(self.theme.text_muted));
                }
            });
        });
    }
}
