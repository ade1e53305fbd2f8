//! Share card export
//!
//! The result view renders a branded card; exporting it asks egui for a
//! screenshot of the next frame, crops it to the card and writes a PNG.

use crate::session::AnalysisResult;
use crate::{Result, TasteError};
use egui::{vec2, ColorImage, Context, Event, Pos2, Rect, UserData, ViewportCommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const CARD_TITLE: &str = "TasteCheck";
pub const CARD_SUBTITLE: &str = "My Music Taste Score";
pub const CARD_SITE: &str = "tastecheckapp.onrender.com";
pub const CARD_CREDIT: &str = "Analyzed by Claude AI";

/// Public link copied by the "share app" button
pub const SHARE_LINK: &str = "https://tastecheckapp.onrender.com";

/// Characters of analysis kept on the card
pub const SNIPPET_CHARS: usize = 200;

/// How long transient button labels stay up
pub const STATUS_HOLD: Duration = Duration::from_secs(2);

/// Content of the share card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareCard {
    pub score_text: String,
    pub snippet: String,
}

impl ShareCard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let score_text = result
            .score_targets()
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join("-");
        Self {
            score_text,
            snippet: snippet(result.analysis()),
        }
    }

    /// Download name, e.g. `tastecheck-score-87.png`
    pub fn file_name(&self) -> String {
        format!("tastecheck-score-{}.png", self.score_text)
    }
}

/// First characters of the analysis followed by an ellipsis
pub fn snippet(analysis: &str) -> String {
    let mut text: String = analysis.chars().take(SNIPPET_CHARS).collect();
    text.push_str("...");
    text
}

/// What an export produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Saved(PathBuf),
    /// The cropped raster was empty; nothing was written
    NothingCaptured,
}

/// Pending capture carried through the screenshot round trip
#[derive(Clone, Debug)]
struct CaptureRequest {
    file_name: String,
    region: Rect,
}

/// Ask for a screenshot of the next frame, to be cropped to `region`
pub fn request_capture(ctx: &Context, file_name: &str, region: Rect) {
    info!("[SHARE] Requesting capture of {:?} for {}", region, file_name);
    let request = CaptureRequest {
        file_name: file_name.to_string(),
        region,
    };
    ctx.send_viewport_cmd(ViewportCommand::Screenshot(UserData::new(request)));
}

/// Handle a finished capture if one arrived this frame
///
/// Returns `None` when no capture was delivered.
pub fn process_capture_events(ctx: &Context, dir: &Path) -> Option<Result<ShareOutcome>> {
    let pixels_per_point = ctx.pixels_per_point();
    let captured: Option<(CaptureRequest, Arc<ColorImage>)> = ctx.input(|input| {
        input.events.iter().find_map(|event| match event {
            Event::Screenshot {
                user_data, image, ..
            } => user_data
                .data
                .as_ref()
                .and_then(|data| data.downcast_ref::<CaptureRequest>())
                .map(|request| (request.clone(), Arc::clone(image))),
            _ => None,
        })
    });

    let (request, image) = captured?;
    let [width, height] = image.size;
    let bounds = Rect::from_min_size(
        Pos2::ZERO,
        vec2(width as f32, height as f32) / pixels_per_point,
    );
    let region = request.region.intersect(bounds);
    if !region.is_positive() {
        debug!("[SHARE] Card region is off screen");
        return Some(Ok(ShareOutcome::NothingCaptured));
    }
    let card = image.region(&region, Some(pixels_per_point));
    let outcome = save_png(&card, dir, &request.file_name);
    if let Err(e) = &outcome {
        error!("[SHARE] Export failed: {}", e);
    }
    Some(outcome)
}

/// Write an image as PNG into `dir`
pub fn save_png(image: &ColorImage, dir: &Path, file_name: &str) -> Result<ShareOutcome> {
    let [width, height] = image.size;
    if width == 0 || height == 0 {
        debug!("[SHARE] Empty raster, nothing to save");
        return Ok(ShareOutcome::NothingCaptured);
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let rgba: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, rgba)
        .ok_or_else(|| TasteError::ShareError("pixel buffer has the wrong size".to_string()))?;
    buffer
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|e| TasteError::ShareError(e.to_string()))?;

    info!(
        "[SHARE] Saved {} ({}x{})",
        path.display(),
        width,
        height
    );
    Ok(ShareOutcome::Saved(path))
}

/// Label state of the share button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShareStatus {
    #[default]
    Idle,
    /// Card is on screen, waiting for the screenshot
    Capturing,
    Downloaded(Instant),
    Failed,
}

impl ShareStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ShareStatus::Idle => "📸 Share My Results",
            ShareStatus::Capturing => "Generating...",
            ShareStatus::Downloaded(_) => "✅ Downloaded!",
            ShareStatus::Failed => "❌ Failed - Try Again",
        }
    }

    /// Trigger is disabled only while a capture is running
    pub fn is_busy(&self) -> bool {
        matches!(self, ShareStatus::Capturing)
    }

    /// Drop the transient "Downloaded!" label once it has been shown long enough
    pub fn settle(&mut self, now: Instant) {
        if let ShareStatus::Downloaded(at) = *self {
            if now.duration_since(at) >= STATUS_HOLD {
                *self = ShareStatus::Idle;
            }
        }
    }

    pub fn from_outcome(outcome: &Result<ShareOutcome>, now: Instant) -> Self {
        match outcome {
            Ok(ShareOutcome::Saved(_)) => ShareStatus::Downloaded(now),
            Ok(ShareOutcome::NothingCaptured) => ShareStatus::Idle,
            Err(_) => ShareStatus::Failed,
        }
    }
}

/// Label state of the copy-link button
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkCopyStatus {
    copied_at: Option<Instant>,
}

impl LinkCopyStatus {
    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn label(&self, now: Instant) -> &'static str {
        match self.copied_at {
            Some(at) if now.duration_since(at) < STATUS_HOLD => "✅ Link Copied!",
            _ => "🔗 Share TasteCheck",
        }
    }
}
