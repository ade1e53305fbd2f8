//! Unified client state for TasteCheck
//!
//! This module provides a thread-safe shared state that can be accessed by:
//! - **Controller**: Writes state changes in response to commands and API events
//! - **UI**: Reads snapshots for rendering, sends commands
//! - **TestRunner**: Reads snapshots for assertions, sends commands
//!
//! The design separates:
//! - **Session**: The user's inputs and result for one run through the flow
//! - **Commands**: Requests to change state (sent to the controller)
//! - **Events**: Notifications for UI updates (readiness, results, errors)

use crate::api::auth::UserStatus;
use crate::audio::PodcastAudio;
use crate::session::inputs::{ImageBlob, ImageSlots, ManualAnswers, NameInputs, Names};
use crate::session::mode::Mode;
use crate::session::style::FeedbackStyle;
use crate::{Result, TasteError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Result of a successful analysis, tagged by the mode that produced it
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisResult {
    /// Single, evolution and manual modes
    Single {
        mode: Mode,
        score: f64,
        analysis: String,
    },
    /// Battle mode
    Battle {
        name_a: String,
        name_b: String,
        score_a: f64,
        score_b: f64,
        analysis: String,
    },
}

/// Who won a battle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattleOutcome {
    FirstWins,
    SecondWins,
    Tie,
}

impl BattleOutcome {
    /// Decide the outcome by strict numeric comparison
    pub fn decide(score_a: f64, score_b: f64) -> Self {
        if score_a > score_b {
            BattleOutcome::FirstWins
        } else if score_b > score_a {
            BattleOutcome::SecondWins
        } else {
            BattleOutcome::Tie
        }
    }

    /// Headline announcing the winner
    pub fn headline(self, name_a: &str, name_b: &str) -> String {
        match self {
            BattleOutcome::FirstWins => format!("{} Wins!", name_a),
            BattleOutcome::SecondWins => format!("{} Wins!", name_b),
            BattleOutcome::Tie => "It's a Tie!".to_string(),
        }
    }

    /// Whether the second contestant is promoted to the first position
    pub fn second_promoted(self) -> bool {
        matches!(self, BattleOutcome::SecondWins)
    }
}

impl AnalysisResult {
    pub fn mode(&self) -> Mode {
        match self {
            AnalysisResult::Single { mode, .. } => *mode,
            AnalysisResult::Battle { .. } => Mode::Battle,
        }
    }

    pub fn analysis(&self) -> &str {
        match self {
            AnalysisResult::Single { analysis, .. } | AnalysisResult::Battle { analysis, .. } => {
                analysis
            }
        }
    }

    /// Heading for the result view
    pub fn title(&self) -> &'static str {
        self.mode().spec().result_title
    }

    /// Battle outcome, `None` for single-score results
    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self {
            AnalysisResult::Battle {
                score_a, score_b, ..
            } => Some(BattleOutcome::decide(*score_a, *score_b)),
            AnalysisResult::Single { .. } => None,
        }
    }

    /// Integer targets for the score counters, one per displayed score
    pub fn score_targets(&self) -> Vec<i64> {
        match self {
            AnalysisResult::Single { score, .. } => vec![score.round() as i64],
            AnalysisResult::Battle {
                score_a, score_b, ..
            } => vec![score_a.round() as i64, score_b.round() as i64],
        }
    }

    /// Build a result from its parts, enforcing mode homogeneity
    pub fn from_names(mode: Mode, names: Names, scores: &[f64], analysis: String) -> Result<Self> {
        match (mode, names, scores) {
            (Mode::Battle, Names::Pair { name_a, name_b }, &[score_a, score_b]) => {
                Ok(AnalysisResult::Battle {
                    name_a,
                    name_b,
                    score_a,
                    score_b,
                    analysis,
                })
            }
            (Mode::Battle, _, _) => Err(TasteError::DecodeError(
                "battle results need two scores and two names".to_string(),
            )),
            (mode, Names::Single(_), &[score]) => Ok(AnalysisResult::Single {
                mode,
                score,
                analysis,
            }),
            (mode, _, _) => Err(TasteError::DecodeError(format!(
                "{} results need exactly one score",
                mode
            ))),
        }
    }
}

/// One run through the mode → inputs → style → result flow
///
/// Reset on mode change or "go back"; never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    /// Active mode, `None` on the picker
    pub mode: Option<Mode>,
    /// Image slots sized for the active mode
    pub images: ImageSlots,
    /// Questionnaire answers, manual mode only
    pub answers: Option<ManualAnswers>,
    /// Raw name fields
    pub names: NameInputs,
    /// Chosen tone tag
    pub feedback_style: Option<FeedbackStyle>,
    /// Result of the last successful analysis
    pub result: Option<AnalysisResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace with the initial empty session
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    /// Enter a mode, discarding everything collected so far
    pub fn select_mode(&mut self, mode: Mode) {
        self.reset();
        self.mode = Some(mode);
        self.images = ImageSlots::with_count(mode.spec().slot_count);
    }

    /// Store an image in a slot of the active mode
    ///
    /// Returns `true` when this call made the session ready.
    pub fn submit_image(&mut self, mode: Mode, slot: usize, blob: ImageBlob) -> Result<bool> {
        if self.mode != Some(mode) {
            return Err(TasteError::ValidationError(format!(
                "Cannot add an image for {} while in {}",
                mode,
                self.mode_label()
            )));
        }
        if !mode.uses_images() {
            return Err(TasteError::ValidationError(
                "This mode does not take images".to_string(),
            ));
        }
        if !blob.is_image() {
            return Err(TasteError::ValidationError(
                "Please select an image file".to_string(),
            ));
        }

        let was_ready = self.is_ready();
        if mode == Mode::Single {
            // A new single upload always replaces the previous one
            let mut slots = ImageSlots::with_count(mode.spec().slot_count);
            slots.set(0, blob)?;
            self.images = slots;
        } else {
            self.images.set(slot, blob)?;
        }
        debug!(
            "Stored image in slot {} ({} populated)",
            slot,
            self.images.populated_count()
        );
        Ok(!was_ready && self.is_ready())
    }

    /// Reset one image slot to unset
    pub fn clear_image(&mut self, slot: usize) {
        self.images.clear(slot);
    }

    /// Validate and store questionnaire answers
    ///
    /// Returns `true` when this call made the session ready.
    pub fn submit_answers(&mut self, raw: [&str; 6]) -> Result<bool> {
        if self.mode != Some(Mode::Manual) {
            return Err(TasteError::ValidationError(
                "Answers can only be submitted in manual mode".to_string(),
            ));
        }
        let answers = ManualAnswers::from_raw(raw)?;
        let was_ready = self.is_ready();
        self.answers = Some(answers);
        Ok(!was_ready && self.is_ready())
    }

    /// Mode-specific readiness predicate
    pub fn is_ready(&self) -> bool {
        match self.mode {
            None => false,
            Some(Mode::Manual) => self.answers.as_ref().is_some_and(ManualAnswers::is_complete),
            Some(mode) => self.images.populated_count() >= mode.spec().min_images,
        }
    }

    /// Whether `runAnalysis` preconditions hold
    pub fn can_run_analysis(&self) -> bool {
        self.is_ready() && self.feedback_style.is_some()
    }

    /// Whether podcast audio is offered for the current result
    pub fn offers_podcast(&self) -> bool {
        self.result.is_some()
            && self
                .feedback_style
                .as_ref()
                .is_some_and(FeedbackStyle::offers_podcast)
    }

    /// Store a result produced for the active mode
    pub fn set_result(&mut self, result: AnalysisResult) -> Result<()> {
        if self.mode != Some(result.mode()) {
            return Err(TasteError::DecodeError(format!(
                "result for {} does not match {}",
                result.mode(),
                self.mode_label()
            )));
        }
        self.result = Some(result);
        Ok(())
    }

    fn mode_label(&self) -> String {
        self.mode
            .map(|m| m.to_string())
            .unwrap_or_else(|| "mode selection".to_string())
    }
}

/// An analysis request that is in flight
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadingState {
    /// Request id, responses with other ids are stale
    pub request_id: Uuid,
    /// Mode-specific headline
    pub headline: &'static str,
    /// Index into the status rotation
    pub status_index: usize,
}

/// Podcast audio side flow
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PodcastState {
    /// Trigger available
    #[default]
    Idle,
    /// Synthesis request in flight
    Generating { request_id: Uuid },
    /// Decoded audio ready for the player
    Ready(PodcastAudio),
    /// Last attempt failed, trigger re-enabled
    Failed,
}

impl PodcastState {
    pub fn is_generating(&self) -> bool {
        matches!(self, PodcastState::Generating { .. })
    }
}

/// Authentication view of the current user
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    /// Last status reported by the server
    pub user: UserStatus,
    /// User chose to continue without an account
    pub guest: bool,
    /// Inline error for the login/register form
    pub error: Option<String>,
    /// Login or register call in flight
    pub pending: bool,
}

impl AuthState {
    /// Whether the main flow should be shown instead of the login panel
    pub fn can_use_app(&self) -> bool {
        self.user.authenticated || self.guest
    }
}

/// Unified application state
///
/// This is the single source of truth. It can be shared across threads using
/// `SharedAppState`.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Inputs and result of the current run
    pub session: Session,
    /// In-flight analysis
    pub loading: Option<LoadingState>,
    /// Generic analysis failure message
    pub error: Option<String>,
    /// Inline validation message for the current input surface
    pub input_error: Option<String>,
    /// Podcast side flow
    pub podcast: PodcastState,
    /// Authentication
    pub auth: AuthState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            session: self.session.clone(),
            ready: self.session.is_ready(),
            loading: self.loading.clone(),
            error: self.error.clone(),
            input_error: self.input_error.clone(),
            podcast: self.podcast.clone(),
            auth: self.auth.clone(),
        }
    }

    /// Collapse the flow back to the mode picker, keeping authentication
    pub fn go_back(&mut self) {
        self.session.reset();
        self.loading = None;
        self.error = None;
        self.input_error = None;
        self.podcast = PodcastState::Idle;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Immutable snapshot of application state
///
/// Used for rendering and assertions without holding locks.
#[derive(Clone, Debug)]
pub struct AppStateSnapshot {
    pub session: Session,
    pub ready: bool,
    pub loading: Option<LoadingState>,
    pub error: Option<String>,
    pub input_error: Option<String>,
    pub podcast: PodcastState,
    pub auth: AuthState,
}

/// Thread-safe shared application state
///
/// This wraps `AppState` in `Arc<RwLock<>>` for safe concurrent access.
#[derive(Clone, Default)]
pub struct SharedAppState {
    inner: Arc<RwLock<AppState>>,
}

impl SharedAppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppState::new())),
        }
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.inner.read()
    }

    /// Get a write lock on the state
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, AppState> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> AppStateSnapshot {
        self.inner.read().snapshot()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.inner.read().session.mode
    }

    pub fn is_ready(&self) -> bool {
        self.inner.read().session.is_ready()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading()
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.inner.read().session.result.clone()
    }

    pub fn session(&self) -> Session {
        self.inner.read().session.clone()
    }
}

/// Commands that can be sent to the controller
#[derive(Clone, Debug)]
pub enum AppCommand {
    /// Enter a mode
    SelectMode(Mode),
    /// Enter a mode by tag; unknown tags are ignored
    SelectModeTag(String),
    /// Reset everything and return to the mode picker
    GoBack,
    /// Store an image in a slot
    SubmitImage {
        mode: Mode,
        slot: usize,
        blob: ImageBlob,
    },
    /// Reset an image slot
    ClearImage(usize),
    /// Update the raw name fields
    SetNames(NameInputs),
    /// Validate and store the six questionnaire answers
    SubmitAnswers([String; 6]),
    /// Choose a feedback style; analysis starts after a short delay
    SelectStyle(FeedbackStyle),
    /// Start the analysis now (no-op unless ready with a style)
    RunAnalysis,
    /// Synthesize podcast audio for the current result
    GeneratePodcast,
    /// Ask the server who is logged in
    RefreshUserStatus,
    /// Log in with email and password
    Login { email: String, password: String },
    /// Register after client-side password checks
    Register {
        email: String,
        password: String,
        confirm: String,
    },
    /// Log out and refresh status
    Logout,
    /// Use the app without an account
    ContinueAsGuest,
    /// Stop the controller and its worker
    Shutdown,
}

/// Events emitted by the controller
///
/// State should be queried from `SharedAppState`; events only signal that
/// something worth repainting happened.
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// State has changed (trigger UI repaint)
    StateChanged,
    /// Readiness went from false to true; show the style chooser
    ReadyForFeedback,
    /// Input rejected before any network call
    ValidationFailed(String),
    /// Analysis request sent
    AnalysisStarted(Uuid),
    /// Loading rotation advanced
    LoadingStatus(String),
    /// Result stored and ready to render
    ResultReady,
    /// Analysis failed; inputs kept for retry
    AnalysisFailed(String),
    /// Podcast audio decoded and ready to play
    PodcastReady,
    /// Server returned no audio; trigger stays available
    PodcastUnavailable,
    /// Podcast synthesis failed
    PodcastFailed(String),
    /// Login state changed
    AuthChanged,
    /// Login or registration rejected
    AuthFailed(String),
    /// Shutdown complete
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> ImageBlob {
        ImageBlob::new(name, "image/png", vec![1, 2, 3])
    }

    fn populated_session() -> Session {
        let mut session = Session::new();
        session.select_mode(Mode::Battle);
        session.submit_image(Mode::Battle, 0, png("a.png")).unwrap();
        session.submit_image(Mode::Battle, 1, png("b.png")).unwrap();
        session.names.name_a = "Ana".into();
        session.feedback_style = Some(FeedbackStyle::from("roasting"));
        session
            .set_result(AnalysisResult::Battle {
                name_a: "Ana".into(),
                name_b: "Person 2".into(),
                score_a: 80.0,
                score_b: 60.0,
                analysis: "close call".into(),
            })
            .unwrap();
        session
    }

    #[test]
    fn test_initial_session() {
        let session = Session::new();
        assert_eq!(session.mode, None);
        assert!(!session.is_ready());
        assert!(!session.can_run_analysis());
    }

    #[test]
    fn test_single_ready_after_one_image() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        assert!(!session.is_ready());
        let became_ready = session.submit_image(Mode::Single, 0, png("a.png")).unwrap();
        assert!(became_ready);

        // A second upload replaces the first, no second transition
        let became_ready = session.submit_image(Mode::Single, 0, png("b.png")).unwrap();
        assert!(!became_ready);
        assert_eq!(session.images.populated_count(), 1);
        assert_eq!(session.images.get(0).unwrap().name, "b.png");
    }

    #[test]
    fn test_evolution_readiness_transitions() {
        let mut session = Session::new();
        session.select_mode(Mode::Evolution);

        assert!(!session.submit_image(Mode::Evolution, 0, png("2019.png")).unwrap());
        assert!(!session.is_ready());

        assert!(session.submit_image(Mode::Evolution, 2, png("2023.png")).unwrap());
        assert!(session.is_ready());

        session.clear_image(0);
        assert!(!session.is_ready());

        // Third slot is optional
        session.submit_image(Mode::Evolution, 1, png("2021.png")).unwrap();
        assert!(session.is_ready());
    }

    #[test]
    fn test_battle_readiness_transitions() {
        let mut session = Session::new();
        session.select_mode(Mode::Battle);
        session.submit_image(Mode::Battle, 1, png("b.png")).unwrap();
        assert!(!session.is_ready());
        session.submit_image(Mode::Battle, 0, png("a.png")).unwrap();
        assert!(session.is_ready());
        session.clear_image(1);
        assert!(!session.is_ready());
    }

    #[test]
    fn test_non_image_rejected_without_state_change() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        let before = session.clone();
        let err = session
            .submit_image(Mode::Single, 0, ImageBlob::new("a.pdf", "application/pdf", vec![1]))
            .unwrap_err();
        assert_eq!(
            err,
            TasteError::ValidationError("Please select an image file".into())
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_image_for_other_mode_rejected() {
        let mut session = Session::new();
        session.select_mode(Mode::Evolution);
        assert!(session.submit_image(Mode::Battle, 0, png("a.png")).is_err());
        assert_eq!(session.images.populated_count(), 0);
    }

    #[test]
    fn test_manual_answers_flow() {
        let mut session = Session::new();
        session.select_mode(Mode::Manual);

        let err = session.submit_answers(["Bjork", "", "Joga", "", "", ""]);
        assert!(err.is_err());
        assert!(session.answers.is_none());
        assert!(!session.is_ready());

        let became_ready = session
            .submit_answers(["Bjork", "Homogenic", "Joga", "", "", "art pop"])
            .unwrap();
        assert!(became_ready);
        assert!(session.is_ready());
    }

    #[test]
    fn test_answers_rejected_outside_manual() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        assert!(session.submit_answers(["a", "b", "c", "", "", ""]).is_err());
    }

    #[test]
    fn test_analysis_needs_style_and_readiness() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        session.feedback_style = Some(FeedbackStyle::from("sarcastic"));
        assert!(!session.can_run_analysis());

        session.submit_image(Mode::Single, 0, png("a.png")).unwrap();
        assert!(session.can_run_analysis());

        session.feedback_style = None;
        assert!(!session.can_run_analysis());
    }

    #[test]
    fn test_reset_equals_fresh_session() {
        let mut session = populated_session();
        session.reset();
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_mode_change_discards_inputs() {
        let mut session = populated_session();
        session.select_mode(Mode::Manual);
        assert_eq!(session.mode, Some(Mode::Manual));
        assert_eq!(session.images.capacity(), 0);
        assert!(session.feedback_style.is_none());
        assert!(session.result.is_none());
        assert_eq!(session.names, NameInputs::default());
    }

    #[test]
    fn test_result_must_match_mode() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        let battle = AnalysisResult::Battle {
            name_a: "a".into(),
            name_b: "b".into(),
            score_a: 1.0,
            score_b: 2.0,
            analysis: String::new(),
        };
        assert!(session.set_result(battle).is_err());
        assert!(session.result.is_none());
    }

    #[test]
    fn test_battle_outcomes() {
        assert_eq!(BattleOutcome::decide(80.0, 60.0), BattleOutcome::FirstWins);
        assert_eq!(BattleOutcome::decide(60.0, 80.0), BattleOutcome::SecondWins);
        assert_eq!(BattleOutcome::decide(70.0, 70.0), BattleOutcome::Tie);

        assert_eq!(BattleOutcome::FirstWins.headline("Ana", "Ben"), "Ana Wins!");
        assert_eq!(BattleOutcome::SecondWins.headline("Ana", "Ben"), "Ben Wins!");
        assert_eq!(BattleOutcome::Tie.headline("Ana", "Ben"), "It's a Tie!");
        assert!(!BattleOutcome::Tie.second_promoted());
        assert!(BattleOutcome::SecondWins.second_promoted());
    }

    #[test]
    fn test_result_homogeneity() {
        let single = AnalysisResult::from_names(
            Mode::Evolution,
            Names::Single("Kim".into()),
            &[72.0],
            "grew up".into(),
        )
        .unwrap();
        assert_eq!(single.title(), "Your Musical Evolution");
        assert_eq!(single.score_targets(), vec![72]);
        assert!(single.outcome().is_none());

        let pair = Names::Pair {
            name_a: "Ana".into(),
            name_b: "Ben".into(),
        };
        assert!(AnalysisResult::from_names(Mode::Battle, pair.clone(), &[50.0], String::new())
            .is_err());
        let battle =
            AnalysisResult::from_names(Mode::Battle, pair, &[50.0, 51.0], String::new()).unwrap();
        assert_eq!(battle.outcome(), Some(BattleOutcome::SecondWins));
    }

    #[test]
    fn test_podcast_offered_only_for_podcast_style_with_result() {
        let mut session = Session::new();
        session.select_mode(Mode::Single);
        session.feedback_style = Some(FeedbackStyle::from("podcast"));
        assert!(!session.offers_podcast());
        session
            .set_result(AnalysisResult::Single {
                mode: Mode::Single,
                score: 50.0,
                analysis: "hi".into(),
            })
            .unwrap();
        assert!(session.offers_podcast());
        session.feedback_style = Some(FeedbackStyle::from("roasting"));
        assert!(!session.offers_podcast());
    }

    #[test]
    fn test_go_back_keeps_auth() {
        let mut state = AppState::new();
        state.session = populated_session();
        state.auth.guest = true;
        state.set_error("boom".into());
        state.go_back();

        assert_eq!(state.session, Session::new());
        assert!(state.error.is_none());
        assert!(state.auth.guest);
    }

    #[test]
    fn test_shared_state_snapshot_is_independent() {
        let shared = SharedAppState::new();
        let before = shared.snapshot();

        shared.write().session.select_mode(Mode::Manual);

        assert_eq!(before.session.mode, None);
        assert_eq!(shared.mode(), Some(Mode::Manual));
        assert!(!shared.is_ready());
    }
}
