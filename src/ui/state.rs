//! Presentation state
//!
//! Everything here is local to the window: text being typed, decoded previews,
//! transient button labels and running score counters. The session itself lives
//! in `SharedAppState` and is only changed through controller commands.

use crate::processor::AnimatedScore;
use crate::session::{AnalysisResult, AppCommand, ImageBlob, NameInputs};
use crate::share::{LinkCopyStatus, ShareStatus, STATUS_HOLD};
use egui::{ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Something a component asks the app to do
#[derive(Clone, Debug)]
pub enum UiAction {
    /// Forward to the controller
    Command(AppCommand),
    /// Read a file and submit it to a slot of the current mode
    LoadImage { slot: usize, path: PathBuf },
    /// Render and export the share card
    Share,
    /// Copy the public link to the clipboard
    CopyLink,
    /// Play the ready podcast audio
    PlayPodcast,
    /// Pause or resume playback
    TogglePodcast,
}

/// Which auth form is visible
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

/// Login/register form fields
#[derive(Clone, Debug, Default)]
pub struct AuthForm {
    pub tab: AuthTab,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl AuthForm {
    /// Forget typed secrets
    pub fn clear_passwords(&mut self) {
        self.password.clear();
        self.confirm.clear();
    }
}

/// Short-lived notice that the server returned no podcast audio
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PodcastNotice {
    shown_at: Option<Instant>,
}

impl PodcastNotice {
    pub fn mark_unavailable(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    /// Notice text while it is still within the hold time
    pub fn message(&self, now: Instant) -> Option<&'static str> {
        match self.shown_at {
            Some(at) if now.duration_since(at) < STATUS_HOLD => Some("No audio available"),
            _ => None,
        }
    }
}

/// Decoded preview for one image slot
pub struct Preview {
    /// Bytes the texture was decoded from
    source: Arc<Vec<u8>>,
    pub texture: TextureHandle,
}

/// Central presentation state for TasteCheck
#[derive(Default)]
pub struct UiState {
    /// Raw name fields, sent to the controller when they change
    pub names: NameInputs,
    /// Six questionnaire answers as typed
    pub answers: [String; 6],
    /// Path entry per image slot
    pub path_inputs: Vec<String>,
    /// A file could not be read from disk
    pub file_error: Option<String>,
    pub auth: AuthForm,
    pub share_status: ShareStatus,
    pub link_status: LinkCopyStatus,
    pub podcast_notice: PodcastNotice,
    /// Where the share card was drawn on the last frame
    pub share_card_rect: Option<egui::Rect>,
    /// Counters for the displayed result, in display order
    pub scores: Vec<AnimatedScore>,
    /// Result the counters were started for
    pub animated_result: Option<AnalysisResult>,
    previews: HashMap<usize, Preview>,
    /// Actions queued by components this frame
    pub pending: Vec<UiAction>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: UiAction) {
        self.pending.push(action);
    }

    pub fn command(&mut self, command: AppCommand) {
        self.pending.push(UiAction::Command(command));
    }

    /// Take every queued action
    pub fn drain_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.pending)
    }

    /// Path field for a slot, grown on demand
    pub fn path_input(&mut self, slot: usize) -> &mut String {
        if self.path_inputs.len() <= slot {
            self.path_inputs.resize(slot + 1, String::new());
        }
        &mut self.path_inputs[slot]
    }

    /// Forget everything typed for the previous session
    pub fn reset(&mut self) {
        let auth = std::mem::take(&mut self.auth);
        *self = Self {
            auth,
            link_status: self.link_status,
            ..Self::default()
        };
    }

    /// Preview texture for a slot, decoding the blob when it changed
    pub fn preview(
        &mut self,
        ctx: &egui::Context,
        slot: usize,
        blob: Option<&ImageBlob>,
    ) -> Option<&TextureHandle> {
        let Some(blob) = blob else {
            self.previews.remove(&slot);
            return None;
        };

        let stale = self
            .previews
            .get(&slot)
            .map_or(true, |p| !Arc::ptr_eq(&p.source, &blob.bytes));
        if stale {
            self.previews.remove(&slot);
            match decode_preview(&blob.bytes) {
                Some(image) => {
                    let texture = ctx.load_texture(
                        format!("preview-{}", slot),
                        image,
                        TextureOptions::LINEAR,
                    );
                    self.previews.insert(
                        slot,
                        Preview {
                            source: Arc::clone(&blob.bytes),
                            texture,
                        },
                    );
                }
                None => warn!("Could not decode preview for {}", blob.name),
            }
        }
        self.previews.get(&slot).map(|p| &p.texture)
    }

    /// Start counters when a new result appears, drop them when it goes away
    pub fn sync_scores<F>(&mut self, result: Option<&AnalysisResult>, start: F)
    where
        F: Fn(i64) -> AnimatedScore,
    {
        if self.animated_result.as_ref() == result {
            return;
        }
        self.scores.clear();
        self.animated_result = result.cloned();
        if let Some(result) = result {
            self.share_status = ShareStatus::Idle;
            self.scores = result.score_targets().into_iter().map(start).collect();
        }
    }

    /// Displayed value of a counter, falling back to the target
    pub fn score_value(&self, index: usize, target: i64) -> i64 {
        self.scores.get(index).map_or(target, AnimatedScore::value)
    }
}

fn decode_preview(bytes: &[u8]) -> Option<ColorImage> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let thumbnail = decoded.thumbnail(320, 320).to_rgba8();
    let size = [thumbnail.width() as usize, thumbnail.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, thumbnail.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ScoreAnimation;
    use crate::session::Mode;
    use std::time::Duration;

    fn instant(target: i64) -> AnimatedScore {
        AnimatedScore::start(
            ScoreAnimation::new(target, Duration::from_millis(2), Duration::from_millis(1)),
            || {},
        )
    }

    #[test]
    fn test_reset_keeps_auth_form() {
        let mut state = UiState::new();
        state.names.user_name = "Kim".into();
        state.answers[0] = "Bjork".into();
        state.auth.email = "kim@example.com".into();
        state.command(AppCommand::GoBack);

        state.reset();

        assert!(state.names.user_name.is_empty());
        assert!(state.answers[0].is_empty());
        assert!(state.pending.is_empty());
        assert_eq!(state.auth.email, "kim@example.com");
    }

    #[test]
    fn test_sync_scores_follows_result() {
        let mut state = UiState::new();
        let result = AnalysisResult::Battle {
            name_a: "Ana".into(),
            name_b: "Ben".into(),
            score_a: 80.0,
            score_b: 60.0,
            analysis: String::new(),
        };

        state.sync_scores(Some(&result), instant);
        assert_eq!(state.scores.len(), 2);

        state.sync_scores(None, instant);
        assert!(state.scores.is_empty());
        assert_eq!(state.score_value(0, 55), 55);

        let single = AnalysisResult::Single {
            mode: Mode::Manual,
            score: 12.0,
            analysis: String::new(),
        };
        state.sync_scores(Some(&single), instant);
        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores[0].target(), 12);
    }

    #[test]
    fn test_podcast_notice_expires() {
        let mut notice = PodcastNotice::default();
        let now = Instant::now();
        assert_eq!(notice.message(now), None);

        notice.mark_unavailable(now);
        assert_eq!(notice.message(now), Some("No audio available"));
        assert_eq!(notice.message(now + STATUS_HOLD), None);
    }

    #[test]
    fn test_preview_follows_blob_identity() {
        let mut png = Vec::new();
        image::RgbaImage::new(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let ctx = egui::Context::default();
        let mut state = UiState::new();

        let first = ImageBlob::new("shot.png", "image/png", png.clone());
        let first_id = state.preview(&ctx, 0, Some(&first)).unwrap().id();
        let again = state.preview(&ctx, 0, Some(&first.clone())).unwrap().id();
        assert_eq!(again, first_id);

        // Same name and size, different upload
        let replacement = ImageBlob::new("shot.png", "image/png", png);
        let replaced = state.preview(&ctx, 0, Some(&replacement)).unwrap().id();
        assert_ne!(replaced, first_id);

        assert!(state.preview(&ctx, 0, None).is_none());
    }

    #[test]
    fn test_path_inputs_grow() {
        let mut state = UiState::new();
        state.path_input(2).push_str("c.png");
        assert_eq!(state.path_inputs.len(), 3);
        assert_eq!(state.path_inputs[2], "c.png");
    }
}
