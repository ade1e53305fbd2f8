//! Image slots for the screenshot modes
//!
//! Files arrive either through the path field next to each slot or by dropping
//! them on the window; both end up as `UiAction::LoadImage`.

use crate::session::{AppCommand, AppStateSnapshot, Mode};
use crate::ui::components::label_widget;
use crate::ui::state::{UiAction, UiState};
use crate::ui::theme::Theme;
use egui::load::SizedTexture;
use egui::{RichText, Vec2, WidgetType};
use std::path::PathBuf;

pub struct ImageUpload<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
    mode: Mode,
}

impl<'a> ImageUpload<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme, mode: Mode) -> Self {
        Self { state, theme, mode }
    }

    pub fn show(mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let spec = self.mode.spec();
        let locked = snapshot.loading.is_some();

        ui.label(
            RichText::new(instructions(self.mode))
                .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_sm);

        self.show_names(ui, locked);
        ui.add_space(self.theme.spacing_sm);

        for slot in 0..spec.slot_count {
            self.show_slot(ui, snapshot, slot, locked);
            ui.add_space(self.theme.spacing_sm);
        }

        ui.label(
            RichText::new("Tip: you can also drop image files onto the window")
                .size(12.0)
                .color(self.theme.text_muted),
        );

        if let Some(error) = &self.state.file_error {
            let label = ui.label(RichText::new(error).color(self.theme.error));
            label_widget(&label, WidgetType::Label, true, &format!("File error: {}", error));
        }
        if let Some(error) = &snapshot.input_error {
            let label = ui.label(RichText::new(error).color(self.theme.error));
            label_widget(&label, WidgetType::Label, true, &format!("Validation error: {}", error));
        }
    }

    fn show_names(&mut self, ui: &mut egui::Ui, locked: bool) {
        let mut changed = false;
        let names = &mut self.state.names;

        if self.mode.is_battle() {
            ui.horizontal(|ui| {
                for (field, hint, label) in [
                    (&mut names.name_a, "Person 1", "First name"),
                    (&mut names.name_b, "Person 2", "Second name"),
                ] {
                    let response = ui.add_enabled(
                        !locked,
                        egui::TextEdit::singleline(field)
                            .hint_text(hint)
                            .desired_width(160.0),
                    );
                    label_widget(&response, WidgetType::TextEdit, !locked, label);
                    changed |= response.changed();
                }
            });
        } else {
            let response = ui.add_enabled(
                !locked,
                egui::TextEdit::singleline(&mut names.user_name)
                    .hint_text("Your name (optional)")
                    .desired_width(240.0),
            );
            label_widget(&response, WidgetType::TextEdit, !locked, "Your name");
            changed = response.changed();
        }

        if changed {
            let names = self.state.names.clone();
            self.state.command(AppCommand::SetNames(names));
        }
    }

    fn show_slot(
        &mut self,
        ui: &mut egui::Ui,
        snapshot: &AppStateSnapshot,
        slot: usize,
        locked: bool,
    ) {
        let blob = snapshot.session.images.get(slot);
        let title = slot_title(self.mode, slot);
        let ctx = ui.ctx().clone();

        self.theme.card_frame().inner_margin(self.theme.spacing).show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(&title).strong().color(self.theme.text_primary));

            match self.state.preview(&ctx, slot, blob) {
                Some(texture) => {
                    let image = egui::Image::from_texture(SizedTexture::from_handle(texture))
                        .max_size(Vec2::new(240.0, 160.0));
                    let response = ui.add(image);
                    label_widget(&response, WidgetType::Other, true, &format!("{} preview", title));
                }
                None => {
                    let text = match blob {
                        Some(blob) => blob.name.clone(),
                        None => "No image yet".to_string(),
                    };
                    ui.label(RichText::new(text).color(self.theme.text_muted));
                }
            }

            ui.horizontal(|ui| {
                let field_label = format!("Image path {}", slot + 1);
                let path = self.state.path_input(slot);
                let field = ui.add_enabled(
                    !locked,
                    egui::TextEdit::singleline(path)
                        .hint_text("/path/to/screenshot.png")
                        .desired_width(260.0),
                );
                label_widget(&field, WidgetType::TextEdit, !locked, &field_label);

                let can_load = !locked && !self.state.path_inputs[slot].trim().is_empty();
                let load = ui.add_enabled(can_load, egui::Button::new("Load"));
                label_widget(
                    &load,
                    WidgetType::Button,
                    can_load,
                    &format!("Load image {}", slot + 1),
                );
                let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if can_load && (load.clicked() || submitted) {
                    let path = PathBuf::from(self.state.path_inputs[slot].trim());
                    self.state.push(UiAction::LoadImage { slot, path });
                }

                if blob.is_some() {
                    let remove = ui.add_enabled(!locked, egui::Button::new("✖ Remove"));
                    label_widget(
                        &remove,
                        WidgetType::Button,
                        !locked,
                        &format!("Remove image {}", slot + 1),
                    );
                    if remove.clicked() {
                        self.state.path_input(slot).clear();
                        self.state.command(AppCommand::ClearImage(slot));
                    }
                }
            });
        });
    }
}

fn instructions(mode: Mode) -> &'static str {
    match mode {
        Mode::Single => "Upload a screenshot of your top artists or tracks.",
        Mode::Evolution => "Upload two or three screenshots from different times, oldest first.",
        Mode::Battle => "Each person uploads one screenshot. May the best taste win.",
        Mode::Manual => "",
    }
}

fn slot_title(mode: Mode, slot: usize) -> String {
    match (mode, slot) {
        (Mode::Battle, 0) => "Person 1's screenshot".to_string(),
        (Mode::Battle, _) => "Person 2's screenshot".to_string(),
        (Mode::Evolution, 2) => "Screenshot 3 (optional)".to_string(),
        (_, slot) => format!("Screenshot {}", slot + 1),
    }
}
