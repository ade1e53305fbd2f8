//! Inputs collected per mode: image slots, questionnaire answers and display names

use crate::{Result, TasteError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default display name for the first battle contestant
pub const DEFAULT_NAME_A: &str = "Person 1";
/// Default display name for the second battle contestant
pub const DEFAULT_NAME_B: &str = "Person 2";

/// A user-supplied image file
///
/// Bytes are reference counted so snapshots of the session stay cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlob {
    /// File name as supplied by the user
    pub name: String,
    /// Declared media type, e.g. `image/png`
    pub media_type: String,
    /// Raw file contents
    pub bytes: Arc<Vec<u8>>,
}

impl ImageBlob {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Read a file from disk, declaring its media type from the extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_named_bytes(name, bytes))
    }

    /// Wrap bytes whose media type is only known from the file name
    pub fn from_named_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = image::ImageFormat::from_path(&name)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        Self::new(name, media_type, bytes)
    }

    /// Check whether the declared media type is an image type
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Ordered image slots for the active mode
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageSlots {
    slots: Vec<Option<ImageBlob>>,
}

impl ImageSlots {
    /// Create `count` unset slots
    pub fn with_count(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Number of slots (set or unset)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store an image at `index`, overwriting any previous value
    pub fn set(&mut self, index: usize, blob: ImageBlob) -> Result<()> {
        let capacity = self.capacity();
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            TasteError::ValidationError(format!(
                "Image slot {} does not exist (this mode has {} slots)",
                index + 1,
                capacity
            ))
        })?;
        *slot = Some(blob);
        Ok(())
    }

    /// Reset slot `index` to unset; out-of-range indices are ignored
    pub fn clear(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }

    pub fn get(&self, index: usize) -> Option<&ImageBlob> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of populated slots
    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Populated slots in slot order, unset slots skipped
    pub fn populated(&self) -> impl Iterator<Item = &ImageBlob> {
        self.slots.iter().flatten()
    }
}

/// The six questionnaire answers of manual mode
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAnswers {
    pub favorite_artist: String,
    pub favorite_album: String,
    pub current_song: String,
    pub current_artist: String,
    pub guilty_pleasure: String,
    pub genres: String,
}

impl ManualAnswers {
    /// Questions in form order, the first three mandatory
    pub const QUESTIONS: [&'static str; 6] = [
        "Who is your favorite artist of all time?",
        "What is your favorite album?",
        "What song are you obsessed with right now?",
        "Which artist are you listening to most lately?",
        "What is your guilty pleasure song?",
        "Which genres do you listen to?",
    ];

    /// Number of mandatory questions
    pub const REQUIRED: usize = 3;

    /// Validate and trim raw form text
    ///
    /// Fails without producing anything when one of the first three answers is blank
    /// after trimming.
    pub fn from_raw(raw: [&str; 6]) -> Result<Self> {
        let trimmed = raw.map(str::trim);
        if trimmed[..Self::REQUIRED].iter().any(|a| a.is_empty()) {
            return Err(TasteError::ValidationError(
                "Please answer at least the first 3 questions".to_string(),
            ));
        }
        let [favorite_artist, favorite_album, current_song, current_artist, guilty_pleasure, genres] =
            trimmed.map(str::to_string);
        Ok(Self {
            favorite_artist,
            favorite_album,
            current_song,
            current_artist,
            guilty_pleasure,
            genres,
        })
    }

    /// Check the mandatory answers are present
    pub fn is_complete(&self) -> bool {
        !self.favorite_artist.trim().is_empty()
            && !self.favorite_album.trim().is_empty()
            && !self.current_song.trim().is_empty()
    }
}

/// Raw name fields as typed by the user
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameInputs {
    /// Single, evolution and manual modes
    pub user_name: String,
    /// Battle, first contestant
    pub name_a: String,
    /// Battle, second contestant
    pub name_b: String,
}

/// Display names captured when an analysis starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Names {
    /// One (possibly empty) display name
    Single(String),
    /// Battle contestants, never blank
    Pair { name_a: String, name_b: String },
}

impl NameInputs {
    /// Capture display names for a request in the given battle/non-battle shape
    pub fn capture(&self, battle: bool) -> Names {
        if battle {
            Names::Pair {
                name_a: or_default(&self.name_a, DEFAULT_NAME_A),
                name_b: or_default(&self.name_b, DEFAULT_NAME_B),
            }
        } else {
            Names::Single(self.user_name.trim().to_string())
        }
    }
}

fn or_default(raw: &str, default: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
