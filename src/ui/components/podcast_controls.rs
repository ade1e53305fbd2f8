//! Podcast audio trigger and player

use crate::session::{AppCommand, PodcastState};
use crate::ui::components::label_widget;
use crate::ui::state::{UiAction, UiState};
use crate::ui::theme::Theme;
use egui::{RichText, Vec2, WidgetType};
use std::time::Instant;

pub struct PodcastControls<'a> {
    state: &'a mut UiState,
    theme: &'a Theme,
    /// Whether the player is currently producing sound
    playing: bool,
    /// Whether audio was handed to the player at least once
    loaded: bool,
}

impl<'a> PodcastControls<'a> {
    pub fn new(state: &'a mut UiState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            playing: false,
            loaded: false,
        }
    }

    pub fn with_playback(mut self, playing: bool, loaded: bool) -> Self {
        self.playing = playing;
        self.loaded = loaded;
        self
    }

    pub fn show(self, ui: &mut egui::Ui, podcast: &PodcastState) {
        match podcast {
            PodcastState::Ready(audio) => {
                ui.horizontal(|ui| {
                    let (text, label, action) = if !self.loaded {
                        ("▶ Play Podcast", "Play podcast", UiAction::PlayPodcast)
                    } else if self.playing {
                        ("⏸ Pause", "Pause podcast", UiAction::TogglePodcast)
                    } else {
                        ("▶ Resume", "Resume podcast", UiAction::TogglePodcast)
                    };
                    let response = ui.add(
                        egui::Button::new(RichText::new(text).strong())
                            .fill(self.theme.secondary)
                            .min_size(Vec2::new(150.0, 38.0)),
                    );
                    label_widget(&response, WidgetType::Button, true, label);
                    if response.clicked() {
                        self.state.push(action);
                    }

                    if self.loaded {
                        let replay = ui.button("⏮ Restart");
                        label_widget(&replay, WidgetType::Button, true, "Replay podcast");
                        if replay.clicked() {
                            self.state.push(UiAction::PlayPodcast);
                        }
                    }

                    ui.label(
                        RichText::new(format!("{} KB", audio.len() / 1024))
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                });
            }
            other => {
                let generating = other.is_generating();
                let notice = match other {
                    PodcastState::Idle => self.state.podcast_notice.message(Instant::now()),
                    _ => None,
                };
                let text = match other {
                    PodcastState::Generating { .. } => "🎙️ Generating audio...",
                    PodcastState::Failed => "❌ Audio failed",
                    _ if notice.is_some() => "🔇 No audio available",
                    _ => "🎙️ Listen as Podcast",
                };
                let response = ui.add_enabled(
                    !generating,
                    egui::Button::new(RichText::new(text).strong())
                        .fill(self.theme.secondary)
                        .min_size(Vec2::new(200.0, 38.0)),
                );
                label_widget(&response, WidgetType::Button, !generating, "Generate podcast audio");
                if response.clicked() {
                    self.state.command(AppCommand::GeneratePodcast);
                }

                if let Some(message) = notice {
                    let label = ui.label(
                        RichText::new(message)
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                    label_widget(
                        &label,
                        WidgetType::Label,
                        true,
                        &format!("Podcast status: {}", message),
                    );
                }
            }
        }
    }
}
