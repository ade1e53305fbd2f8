//! Result view: animated scores, analysis text, share card and side flows
//!
//! Battle results promote the winner to the left column; a tie keeps the
//! original order.

use crate::session::{AnalysisResult, AppCommand, AppStateSnapshot, BattleOutcome};
use crate::share::{ShareCard, CARD_CREDIT, CARD_SITE, CARD_SUBTITLE, CARD_TITLE};
use crate::ui::components::{label_widget, PodcastControls};
use crate::ui::state::{UiAction, UiState};
use crate::ui::theme::Theme;
use egui::{Align, Layout, RichText, Vec2, WidgetType};
use std::time::Instant;

pub struct ResultsView<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
    playing: bool,
    loaded: bool,
}

/// One score column
struct Contestant<'r> {
    name: &'r str,
    index: usize,
    target: i64,
    winner: bool,
}

impl<'a> ResultsView<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            playing: false,
            loaded: false,
        }
    }

    /// Podcast player status, owned by the app
    pub fn with_playback(mut self, playing: bool, loaded: bool) -> Self {
        self.playing = playing;
        self.loaded = loaded;
        self
    }

    pub fn show(mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let Some(result) = snapshot.session.result.as_ref() else {
            return;
        };

        ui.vertical_centered(|ui| {
            let title = ui.heading(RichText::new(result.title()).color(self.theme.text_primary));
            label_widget(&title, WidgetType::Label, true, &format!("Result title: {}", result.title()));
        });
        ui.add_space(self.theme.spacing);

        match result {
            AnalysisResult::Battle { .. } => self.show_battle_scores(ui, result),
            AnalysisResult::Single { .. } => self.show_single_score(ui, result),
        }

        ui.add_space(self.theme.spacing);
        self.theme.card_frame().show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            let text = ui.label(
                RichText::new(result.analysis())
                    .size(15.0)
                    .color(self.theme.text_secondary),
            );
            label_widget(&text, WidgetType::Label, true, "Analysis text");
        });

        ui.add_space(self.theme.spacing);
        self.show_share_card(ui, result);

        ui.add_space(self.theme.spacing_sm);
        self.show_actions(ui, snapshot);
    }

    fn show_single_score(&self, ui: &mut egui::Ui, result: &AnalysisResult) {
        let target = result.score_targets().first().copied().unwrap_or_default();
        let value = self.state.score_value(0, target);
        ui.vertical_centered(|ui| {
            let score = ui.label(
                RichText::new(value.to_string())
                    .size(72.0)
                    .strong()
                    .color(self.theme.score),
            );
            label_widget(&score, WidgetType::Label, true, &format!("Score {}", value));
            ui.label(RichText::new("out of 100").color(self.theme.text_muted));
        });
    }

    fn show_battle_scores(&self, ui: &mut egui::Ui, result: &AnalysisResult) {
        let AnalysisResult::Battle { name_a, name_b, .. } = result else {
            return;
        };
        let Some(outcome) = result.outcome() else {
            return;
        };
        let targets = result.score_targets();
        let first_wins = outcome == BattleOutcome::FirstWins;

        let mut columns = [
            Contestant {
                name: name_a,
                index: 0,
                target: targets.first().copied().unwrap_or_default(),
                winner: first_wins,
            },
            Contestant {
                name: name_b,
                index: 1,
                target: targets.get(1).copied().unwrap_or_default(),
                winner: outcome.second_promoted(),
            },
        ];
        if outcome.second_promoted() {
            columns.swap(0, 1);
        }

        ui.vertical_centered(|ui| {
            let headline = outcome.headline(name_a, name_b);
            let label = ui.label(
                RichText::new(&headline)
                    .size(26.0)
                    .strong()
                    .color(self.theme.winner),
            );
            label_widget(&label, WidgetType::Label, true, &format!("Winner: {}", headline));
        });
        ui.add_space(self.theme.spacing_sm);

        ui.columns(2, |cols| {
            for (position, (ui, contestant)) in cols.iter_mut().zip(&columns).enumerate() {
                ui.vertical_centered(|ui| {
                    let crown = if contestant.winner { "👑 " } else { "" };
                    let name_color = if contestant.winner {
                        self.theme.winner
                    } else {
                        self.theme.text_secondary
                    };
                    ui.label(
                        RichText::new(format!("{}{}", crown, contestant.name))
                            .size(18.0)
                            .strong()
                            .color(name_color),
                    );
                    let value = self.state.score_value(contestant.index, contestant.target);
                    let score = ui.label(
                        RichText::new(value.to_string())
                            .size(56.0)
                            .strong()
                            .color(self.theme.score),
                    );
                    label_widget(
                        &score,
                        WidgetType::Label,
                        true,
                        &format!("Position {} {} score {}", position + 1, contestant.name, value),
                    );
                });
            }
        });
    }

    fn show_share_card(&mut self, ui: &mut egui::Ui, result: &AnalysisResult) {
        let card = ShareCard::from_result(result);
        let theme = self.theme;

        let response = egui::Frame::none()
            .fill(theme.card_fill)
            .rounding(theme.card_rounding)
            .inner_margin(theme.spacing_lg)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(CARD_TITLE).size(26.0).strong().color(theme.score));
                    ui.label(RichText::new(CARD_SUBTITLE).color(theme.text_primary));
                    ui.add_space(theme.spacing_sm);
                    ui.label(
                        RichText::new(&card.score_text)
                            .size(56.0)
                            .strong()
                            .color(theme.score),
                    );
                    ui.add_space(theme.spacing_sm);
                    ui.label(RichText::new(&card.snippet).color(theme.text_primary));
                    ui.add_space(theme.spacing_sm);
                    ui.label(RichText::new(CARD_SITE).size(12.0).color(theme.text_secondary));
                    ui.label(RichText::new(CARD_CREDIT).size(12.0).color(theme.text_secondary));
                });
            })
            .response;

        label_widget(&response, WidgetType::Other, true, "Share card");
        self.state.share_card_rect = Some(response.rect);
    }

    fn show_actions(self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let now = Instant::now();
        let theme = self.theme;

        ui.with_layout(Layout::top_down(Align::Center), |ui| {
            let share_busy = self.state.share_status.is_busy();
            let share = ui.add_enabled(
                !share_busy,
                egui::Button::new(RichText::new(self.state.share_status.label()).strong())
                    .fill(theme.primary)
                    .min_size(Vec2::new(220.0, 40.0)),
            );
            label_widget(&share, WidgetType::Button, !share_busy, "Share results");
            if share.clicked() {
                self.state.push(UiAction::Share);
            }

            let link = ui.add(
                egui::Button::new(self.state.link_status.label(now)).min_size(Vec2::new(220.0, 36.0)),
            );
            label_widget(&link, WidgetType::Button, true, "Copy share link");
            if link.clicked() {
                self.state.push(UiAction::CopyLink);
            }

            if snapshot.session.offers_podcast() {
                ui.add_space(theme.spacing_sm);
                PodcastControls::new(self.state, theme)
                    .with_playback(self.playing, self.loaded)
                    .show(ui, &snapshot.podcast);
            }

            ui.add_space(theme.spacing_sm);
            let restart = ui.button("🔄 Start Over");
            label_widget(&restart, WidgetType::Button, true, "Restart");
            if restart.clicked() {
                self.state.command(AppCommand::GoBack);
            }
        });
    }
}
