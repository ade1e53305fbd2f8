//! Theme and styling for the TasteCheck UI
//!
//! Colors follow the TasteCheck brand gradient (indigo to violet).

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Brand gradient start
    pub primary: Color32,
    /// Brand gradient end
    pub secondary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Large score digits
    pub score: Color32,
    /// Highlight for the battle winner
    pub winner: Color32,
    /// Premium badge fill
    pub premium: Color32,
    /// Share card fill
    pub card_fill: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(102, 126, 234),  // #667eea
            secondary: Color32::from_rgb(118, 75, 162), // #764ba2
            success: Color32::from_rgb(72, 187, 120),
            warning: Color32::from_rgb(236, 201, 75),
            error: Color32::from_rgb(245, 101, 101),

            bg_primary: Color32::from_rgb(26, 22, 46),
            bg_secondary: Color32::from_rgb(40, 34, 68),
            bg_tertiary: Color32::from_rgb(58, 50, 94),

            text_primary: Color32::from_rgb(250, 250, 255),
            text_secondary: Color32::from_rgb(214, 210, 240),
            text_muted: Color32::from_rgb(160, 154, 196),

            score: Color32::from_rgb(255, 255, 255),
            winner: Color32::from_rgb(250, 204, 21),
            premium: Color32::from_rgb(236, 201, 75),
            card_fill: Color32::from_rgb(102, 126, 234),

            button_rounding: Rounding::same(10.0),
            card_rounding: Rounding::same(20.0),

            spacing: 16.0,
            spacing_lg: 28.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.weak_bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);
        visuals.widgets.inactive.rounding = self.button_rounding;

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.weak_bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.hovered.rounding = self.button_rounding;

        visuals.widgets.active.bg_fill = self.secondary;
        visuals.widgets.active.weak_bg_fill = self.secondary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.active.rounding = self.button_rounding;

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.4);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);
        visuals.hyperlink_color = self.primary;

        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, self.bg_tertiary);

        ctx.set_visuals(visuals);
        ctx.set_fonts(egui::FontDefinitions::default());

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(28.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(15.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(13.0, FontFamily::Monospace),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(15.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }

    /// Frame for a content card
    pub fn card_frame(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.bg_secondary)
            .rounding(self.card_rounding)
            .inner_margin(self.spacing_lg)
    }
}
