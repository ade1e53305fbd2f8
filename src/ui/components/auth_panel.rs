//! Login / register / guest panel
//!
//! Shown until the user is authenticated or chooses to continue as a guest.
//! Password checks for registration run in the controller before any request.

use crate::session::{AppCommand, AppStateSnapshot};
use crate::ui::components::label_widget;
use crate::ui::state::{AuthTab, UiState};
use crate::ui::theme::Theme;
use egui::{RichText, Vec2, WidgetType};

pub struct AuthPanel<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
}

impl<'a> AuthPanel<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let pending = snapshot.auth.pending;

        self.theme.card_frame().show(ui, |ui| {
            ui.set_max_width(380.0);
            ui.vertical_centered(|ui| {
                ui.heading("Welcome to TasteCheck");
                ui.add_space(self.theme.spacing_sm);

                ui.horizontal(|ui| {
                    for (tab, text) in [(AuthTab::Login, "Login"), (AuthTab::Register, "Register")]
                    {
                        let selected = self.state.auth.tab == tab;
                        let response = ui.selectable_label(selected, text);
                        label_widget(
                            &response,
                            WidgetType::SelectableLabel,
                            true,
                            &format!("{} tab", text),
                        );
                        if response.clicked() && !selected {
                            self.state.auth.tab = tab;
                            self.state.auth.clear_passwords();
                        }
                    }
                });
                ui.add_space(self.theme.spacing_sm);

                self.show_fields(ui, pending);

                if let Some(error) = &snapshot.auth.error {
                    ui.add_space(self.theme.spacing_sm);
                    let label = ui.label(RichText::new(error).color(self.theme.error));
                    label_widget(&label, WidgetType::Label, true, &format!("Auth error: {}", error));
                }

                ui.add_space(self.theme.spacing);
                self.show_submit(ui, pending);

                ui.add_space(self.theme.spacing_sm);
                let guest = ui.add_enabled(!pending, egui::Button::new("Continue as guest"));
                label_widget(&guest, WidgetType::Button, !pending, "Continue as guest");
                if guest.clicked() {
                    self.state.command(AppCommand::ContinueAsGuest);
                }
            });
        });
    }

    fn show_fields(&mut self, ui: &mut egui::Ui, pending: bool) {
        let form = &mut self.state.auth;

        let email = ui.add_enabled(
            !pending,
            egui::TextEdit::singleline(&mut form.email)
                .hint_text("Email")
                .desired_width(f32::INFINITY),
        );
        label_widget(&email, WidgetType::TextEdit, !pending, "Email");

        let password = ui.add_enabled(
            !pending,
            egui::TextEdit::singleline(&mut form.password)
                .hint_text("Password")
                .password(true)
                .desired_width(f32::INFINITY),
        );
        label_widget(&password, WidgetType::TextEdit, !pending, "Password");

        if form.tab == AuthTab::Register {
            let confirm = ui.add_enabled(
                !pending,
                egui::TextEdit::singleline(&mut form.confirm)
                    .hint_text("Confirm password")
                    .password(true)
                    .desired_width(f32::INFINITY),
            );
            label_widget(&confirm, WidgetType::TextEdit, !pending, "Confirm password");
        }
    }

    fn show_submit(&mut self, ui: &mut egui::Ui, pending: bool) {
        let text = match (self.state.auth.tab, pending) {
            (_, true) => "Please wait...",
            (AuthTab::Login, false) => "Log In",
            (AuthTab::Register, false) => "Create Account",
        };
        let button = egui::Button::new(RichText::new(text).strong())
            .fill(self.theme.primary)
            .min_size(Vec2::new(200.0, 40.0));
        let response = ui.add_enabled(!pending, button);
        label_widget(&response, WidgetType::Button, !pending, "Submit credentials");

        if response.clicked() {
            let form = &mut self.state.auth;
            let command = match form.tab {
                AuthTab::Login => AppCommand::Login {
                    email: form.email.trim().to_string(),
                    password: form.password.clone(),
                },
                AuthTab::Register => AppCommand::Register {
                    email: form.email.trim().to_string(),
                    password: form.password.clone(),
                    confirm: form.confirm.clone(),
                },
            };
            form.clear_passwords();
            self.state.command(command);
        }
    }
}
