//! Feedback style tags
//!
//! The style is opaque to the client. It is forwarded verbatim and only
//! inspected to decide whether podcast audio is offered.

use serde::{Deserialize, Serialize};

/// User-chosen tone tag forwarded to the analysis endpoint
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackStyle(String);

impl FeedbackStyle {
    pub const ROASTING: &'static str = "roasting";
    pub const ENCOURAGING: &'static str = "encouraging";
    pub const SARCASTIC: &'static str = "sarcastic";
    pub const ANALYTICAL: &'static str = "analytical";
    pub const PODCAST: &'static str = "podcast";

    /// Styles offered by the picker, with their button labels
    pub const OFFERED: [(&'static str, &'static str); 5] = [
        (Self::ROASTING, "🔥 Roast Me"),
        (Self::ENCOURAGING, "💖 Hype Me Up"),
        (Self::SARCASTIC, "😏 Sarcastic"),
        (Self::ANALYTICAL, "📊 Analytical"),
        (Self::PODCAST, "🎙️ Podcast"),
    ];

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the podcast-audio side flow is offered for this style
    pub fn offers_podcast(&self) -> bool {
        self.0 == Self::PODCAST
    }
}

impl std::fmt::Display for FeedbackStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeedbackStyle {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_podcast_offers_audio() {
        assert!(FeedbackStyle::from("podcast").offers_podcast());
        assert!(!FeedbackStyle::from("roasting").offers_podcast());
        assert!(!FeedbackStyle::from("Podcast").offers_podcast());
    }

    #[test]
    fn test_unknown_style_forwarded_verbatim() {
        let style = FeedbackStyle::from("dramatic-reading");
        assert_eq!(serde_json::to_string(&style).unwrap(), "\"dramatic-reading\"");
    }
}
