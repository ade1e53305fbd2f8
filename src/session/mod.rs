//! Session state machine
//!
//! Mode selection, input collection, readiness and the shared state that the
//! controller, UI and test runner all read.

pub mod inputs;
pub mod mode;
pub mod state;
pub mod style;

pub use inputs::{ImageBlob, ImageSlots, ManualAnswers, NameInputs, Names};
pub use mode::{Mode, ModeSpec, UnknownMode};
pub use state::{
    AnalysisResult, AppCommand, AppEvent, AppState, AppStateSnapshot, AuthState, BattleOutcome,
    LoadingState, PodcastState, Session, SharedAppState,
};
pub use style::FeedbackStyle;
