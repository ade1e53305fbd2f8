//! Analysis modes and their dispatch table

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the four mutually exclusive analysis workflows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One screenshot
    Single,
    /// Two or three screenshots showing a listening history over time
    Evolution,
    /// Two people, one screenshot each
    Battle,
    /// Six-question questionnaire, no images
    Manual,
}

/// Static per-mode behavior
///
/// Every mode-dependent decision goes through this table instead of branching
/// at each call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSpec {
    /// Tag sent in the `mode` field of the request
    pub wire_tag: &'static str,
    /// Number of image slots shown for this mode
    pub slot_count: usize,
    /// Populated slots needed before the mode is ready
    pub min_images: usize,
    /// Heading on the result view
    pub result_title: &'static str,
    /// Headline of the loading indicator
    pub loading_headline: &'static str,
    /// Label on the mode picker
    pub label: &'static str,
    /// Whether the result carries two scores
    pub dual_score: bool,
}

const SINGLE: ModeSpec = ModeSpec {
    wire_tag: "single",
    slot_count: 1,
    min_images: 1,
    result_title: "Your TasteCheck Results",
    loading_headline: "Analyzing your taste...",
    label: "Single Upload",
    dual_score: false,
};

const EVOLUTION: ModeSpec = ModeSpec {
    wire_tag: "evolution",
    slot_count: 3,
    min_images: 2,
    result_title: "Your Musical Evolution",
    loading_headline: "Analyzing your musical journey...",
    label: "Evolution",
    dual_score: false,
};

const BATTLE: ModeSpec = ModeSpec {
    wire_tag: "battle",
    slot_count: 2,
    min_images: 2,
    result_title: "Battle Results",
    loading_headline: "Deciding the winner...",
    label: "Taste Battle",
    dual_score: true,
};

const MANUAL: ModeSpec = ModeSpec {
    wire_tag: "manual",
    slot_count: 0,
    min_images: 0,
    result_title: "Your TasteCheck Results",
    loading_headline: "Analyzing your taste...",
    label: "Answer Questions",
    dual_score: false,
};

impl Mode {
    /// All modes in picker order
    pub const ALL: [Mode; 4] = [Mode::Single, Mode::Evolution, Mode::Battle, Mode::Manual];

    /// Get the dispatch table entry for this mode
    pub fn spec(self) -> &'static ModeSpec {
        match self {
            Mode::Single => &SINGLE,
            Mode::Evolution => &EVOLUTION,
            Mode::Battle => &BATTLE,
            Mode::Manual => &MANUAL,
        }
    }

    /// Check if this mode collects images
    pub fn uses_images(self) -> bool {
        self.spec().slot_count > 0
    }

    pub fn is_battle(self) -> bool {
        matches!(self, Mode::Battle)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec().wire_tag)
    }
}

/// Returned when a mode tag is not one of the four known modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl std::fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.spec().wire_tag == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!("single".parse::<Mode>(), Ok(Mode::Single));
        assert_eq!("evolution".parse::<Mode>(), Ok(Mode::Evolution));
        assert_eq!("battle".parse::<Mode>(), Ok(Mode::Battle));
        assert_eq!("manual".parse::<Mode>(), Ok(Mode::Manual));
    }

    #[test]
    fn test_parse_unknown_tag() {
        assert_eq!(
            "karaoke".parse::<Mode>(),
            Err(UnknownMode("karaoke".to_string()))
        );
    }

    #[test]
    fn test_slot_table() {
        assert_eq!(Mode::Single.spec().slot_count, 1);
        assert_eq!(Mode::Evolution.spec().slot_count, 3);
        assert_eq!(Mode::Battle.spec().slot_count, 2);
        assert!(!Mode::Manual.uses_images());
        assert!(Mode::Battle.spec().dual_score);
    }

    #[test]
    fn test_serde_uses_wire_tag() {
        let json = serde_json::to_string(&Mode::Evolution).unwrap();
        assert_eq!(json, "\"evolution\"");
        for mode in Mode::ALL {
            assert_eq!(mode.to_string(), mode.spec().wire_tag);
        }
    }
}
