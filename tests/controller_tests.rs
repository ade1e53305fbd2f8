//! Integration tests for the TasteCheck controller
//!
//! These tests drive the controller through its handle against a scripted
//! in-memory service and check the requests it sends and the state it leaves.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tastecheck::api::{
    AnalysisRequest, AnalysisResponse, AudioResponse, AuthAction, AuthReply, Credentials,
    TasteService, UserStatus,
};
use tastecheck::config::ClientConfig;
use tastecheck::orchestrator::{Controller, ControllerHandle};
use tastecheck::session::{
    AnalysisResult, AppEvent, AppState, BattleOutcome, FeedbackStyle, ImageBlob, Mode, NameInputs,
    PodcastState,
};
use tastecheck::{Result, TasteError};

/// Service replaying scripted replies and recording every analysis request
#[derive(Clone, Default)]
struct ScriptedService {
    analyses: Arc<Mutex<VecDeque<Result<AnalysisResponse>>>>,
    audio: Arc<Mutex<VecDeque<Result<AudioResponse>>>>,
    auth: Arc<Mutex<VecDeque<Result<AuthReply>>>>,
    status: Arc<Mutex<UserStatus>>,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
    /// When set, the first analysis waits for one message before replying
    gate: Option<Receiver<()>>,
}

impl ScriptedService {
    fn reply(self, response: Result<AnalysisResponse>) -> Self {
        self.analyses.lock().push_back(response);
        self
    }

    fn audio_reply(self, response: Result<AudioResponse>) -> Self {
        self.audio.lock().push_back(response);
        self
    }

    fn auth_reply(self, reply: Result<AuthReply>) -> Self {
        self.auth.lock().push_back(reply);
        self
    }

    fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = bounded(4);
        self.gate = Some(rx);
        (self, tx)
    }

    fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().clone()
    }
}

impl TasteService for ScriptedService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let seen = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };
        if let (1, Some(gate)) = (seen, &self.gate) {
            let _ = gate.recv_timeout(Duration::from_secs(5));
        }
        self.analyses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TasteError::TransportError("no scripted reply".into())))
    }

    async fn generate_audio(&self, _dialogue: &str) -> Result<AudioResponse> {
        self.audio
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(AudioResponse::default()))
    }

    async fn user_status(&self) -> Result<UserStatus> {
        Ok(self.status.lock().clone())
    }

    async fn authenticate(
        &self,
        _action: AuthAction,
        credentials: &Credentials,
    ) -> Result<AuthReply> {
        let reply = self
            .auth
            .lock()
            .pop_front()
            .unwrap_or(Ok(AuthReply::Accepted));
        if matches!(reply, Ok(AuthReply::Accepted)) {
            *self.status.lock() = UserStatus {
                authenticated: true,
                email: Some(credentials.email.clone()),
                is_premium: Some(false),
            };
        }
        reply
    }

    async fn logout(&self) -> Result<()> {
        *self.status.lock() = UserStatus::default();
        Ok(())
    }
}

fn start(service: ScriptedService) -> ControllerHandle {
    let config = ClientConfig::default()
        .with_style_select_delay_ms(10)
        .with_loading_rotation_ms(20);
    let (controller, handle) = Controller::new(config, service).unwrap();
    controller.start().unwrap();
    handle
}

fn wait_for(handle: &ControllerHandle, wanted: impl Fn(&AppEvent) -> bool) -> AppEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(event) = handle.recv_event_timeout(Duration::from_millis(50)) {
            if wanted(&event) {
                return event;
            }
        }
    }
    panic!("event not received in time");
}

fn wait_until(handle: &ControllerHandle, what: &str, done: impl Fn(&AppState) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(&handle.state().read()) {
        assert!(Instant::now() < deadline, "{} did not happen in time", what);
        handle.recv_event_timeout(Duration::from_millis(20));
    }
}

fn png(name: &str, bytes: &[u8]) -> ImageBlob {
    ImageBlob::new(name, "image/png", bytes.to_vec())
}

/// Enter single mode, upload one image and choose a style
fn ready_single(handle: &ControllerHandle, style: &str) {
    handle.select_mode(Mode::Single).unwrap();
    handle
        .submit_image(Mode::Single, 0, png("stats.png", b"top artists"))
        .unwrap();
    wait_for(handle, |e| *e == AppEvent::ReadyForFeedback);
    handle.select_style(FeedbackStyle::new(style)).unwrap();
}

/// Test that a retry after a failed analysis sends exactly the same payload
#[test]
fn test_retry_after_failure_sends_identical_payload() {
    let service = ScriptedService::default()
        .reply(Err(TasteError::TransportError("502 Bad Gateway".into())))
        .reply(Ok(AnalysisResponse::single(87.0, "Impeccable")));
    let handle = start(service.clone());

    ready_single(&handle, "roasting");
    wait_for(&handle, |e| matches!(e, AppEvent::AnalysisFailed(_)));
    assert_eq!(
        handle.state().read().error.as_deref(),
        Some("Something went wrong. Please try again.")
    );

    handle.run_analysis().unwrap();
    wait_for(&handle, |e| *e == AppEvent::ResultReady);

    let requests = service.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);

    let snapshot = handle.state().snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot.loading.is_none());
    assert_eq!(
        snapshot.session.result,
        Some(AnalysisResult::Single {
            mode: Mode::Single,
            score: 87.0,
            analysis: "Impeccable".into(),
        })
    );
    handle.shutdown().unwrap();
}

/// Test that a reply arriving after "go back" does not resurrect the old session
#[test]
fn test_go_back_mid_flight_ignores_stale_reply() {
    let (service, gate) = ScriptedService::default()
        .reply(Ok(AnalysisResponse::single(50.0, "Late")))
        .gated();
    let handle = start(service.clone());

    ready_single(&handle, "sarcastic");
    wait_for(&handle, |e| matches!(e, AppEvent::AnalysisStarted(_)));
    assert!(handle.is_loading());

    handle.go_back().unwrap();
    wait_for(&handle, |e| *e == AppEvent::StateChanged);
    gate.send(()).unwrap();

    std::thread::sleep(Duration::from_millis(200));
    let snapshot = handle.state().snapshot();
    assert_eq!(snapshot.session.mode, None);
    assert!(snapshot.session.result.is_none());
    assert!(snapshot.loading.is_none());
    assert!(snapshot.error.is_none());
    handle.shutdown().unwrap();
}

/// Test that an abandoned request still in flight does not hold up the next session
#[test]
fn test_go_back_frees_the_next_session() {
    let (service, gate) = ScriptedService::default()
        .reply(Ok(AnalysisResponse::single(80.0, "Fresh")))
        .reply(Ok(AnalysisResponse::single(20.0, "Late")))
        .gated();
    let handle = start(service.clone());

    ready_single(&handle, "roasting");
    wait_for(&handle, |e| matches!(e, AppEvent::AnalysisStarted(_)));
    handle.go_back().unwrap();
    wait_for(&handle, |e| *e == AppEvent::StateChanged);

    ready_single(&handle, "sarcastic");
    wait_for(&handle, |e| *e == AppEvent::ResultReady);
    assert_eq!(service.requests().len(), 2);

    handle.login("dj@example.com", "hunter22").unwrap();
    wait_until(&handle, "login", |s| s.auth.user.authenticated);

    gate.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    let snapshot = handle.state().snapshot();
    assert!(snapshot.loading.is_none());
    assert_eq!(
        snapshot.session.result,
        Some(AnalysisResult::Single {
            mode: Mode::Single,
            score: 80.0,
            analysis: "Fresh".into(),
        })
    );
    handle.shutdown().unwrap();
}

/// Test that the loading status rotates while the request is in flight
#[test]
fn test_loading_status_rotates_while_waiting() {
    let (service, gate) = ScriptedService::default()
        .reply(Ok(AnalysisResponse::single(70.0, "Fine")))
        .gated();
    let handle = start(service);

    ready_single(&handle, "analytical");
    let event = wait_for(&handle, |e| matches!(e, AppEvent::LoadingStatus(_)));
    assert_eq!(event, AppEvent::LoadingStatus("Judging your taste...".into()));
    assert_eq!(
        handle.state().read().loading.as_ref().map(|l| l.headline),
        Some("Analyzing your taste...")
    );

    gate.send(()).unwrap();
    wait_for(&handle, |e| *e == AppEvent::ResultReady);
    assert!(handle.state().read().loading.is_none());
    handle.shutdown().unwrap();
}

/// Test battle payload defaults and the winner decided from the reply
#[test]
fn test_battle_second_contestant_wins() {
    let service =
        ScriptedService::default().reply(Ok(AnalysisResponse::battle(60.0, 80.0, "Close one")));
    let handle = start(service.clone());

    handle.select_mode(Mode::Battle).unwrap();
    handle
        .set_names(NameInputs {
            user_name: String::new(),
            name_a: "   ".into(),
            name_b: " Sam ".into(),
        })
        .unwrap();
    handle.submit_image(Mode::Battle, 1, png("b.png", b"bbb")).unwrap();
    handle.submit_image(Mode::Battle, 0, png("a.png", b"aaa")).unwrap();
    wait_for(&handle, |e| *e == AppEvent::ReadyForFeedback);
    handle.select_style("roasting".into()).unwrap();
    wait_for(&handle, |e| *e == AppEvent::ResultReady);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.name_a.as_deref(), Some("Person 1"));
    assert_eq!(request.name_b.as_deref(), Some("Sam"));
    assert!(request.user_name.is_none());
    assert_eq!(
        request.images.as_deref(),
        Some(&["YWFh".to_string(), "YmJi".to_string()][..])
    );

    let result = handle.state().result().unwrap();
    assert_eq!(result.outcome(), Some(BattleOutcome::SecondWins));
    assert_eq!(result.title(), "Battle Results");
    handle.shutdown().unwrap();
}

/// Test that evolution readiness follows populated slots
#[test]
fn test_evolution_readiness_follows_slots() {
    let handle = start(ScriptedService::default());

    handle.select_mode(Mode::Evolution).unwrap();
    handle.submit_image(Mode::Evolution, 0, png("2019.png", b"1")).unwrap();
    wait_for(&handle, |e| *e == AppEvent::StateChanged);
    assert!(!handle.is_ready());

    handle.submit_image(Mode::Evolution, 2, png("2024.png", b"2")).unwrap();
    wait_for(&handle, |e| *e == AppEvent::ReadyForFeedback);
    assert!(handle.is_ready());

    handle.clear_image(2).unwrap();
    wait_for(&handle, |e| *e == AppEvent::StateChanged);
    assert!(!handle.is_ready());

    handle.run_analysis().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!handle.is_loading());
    handle.shutdown().unwrap();
}

/// Test the manual questionnaire payload
#[test]
fn test_manual_answers_are_sent_trimmed() {
    let service = ScriptedService::default().reply(Ok(AnalysisResponse::single(42.0, "Eclectic")));
    let handle = start(service.clone());

    handle.select_mode(Mode::Manual).unwrap();
    handle
        .submit_answers([
            " Bjork ".into(),
            "Homogenic".into(),
            "Joga\n".into(),
            String::new(),
            "  ".into(),
            "electronic".into(),
        ])
        .unwrap();
    wait_for(&handle, |e| *e == AppEvent::ReadyForFeedback);
    handle.select_style("encouraging".into()).unwrap();
    wait_for(&handle, |e| *e == AppEvent::ResultReady);

    let request = service.requests().remove(0);
    assert_eq!(request.mode, Mode::Manual);
    assert!(request.images.is_none());
    assert_eq!(request.user_name.as_deref(), Some(""));
    let answers = request.answers.unwrap();
    assert_eq!(answers.favorite_artist, "Bjork");
    assert_eq!(answers.current_song, "Joga");
    assert_eq!(answers.guilty_pleasure, "");
    assert_eq!(answers.genres, "electronic");
    handle.shutdown().unwrap();
}

/// Test that missing mandatory answers are rejected without storing anything
#[test]
fn test_manual_answers_validation() {
    let handle = start(ScriptedService::default());

    handle.select_mode(Mode::Manual).unwrap();
    handle
        .submit_answers([
            "Bjork".into(),
            " ".into(),
            "Joga".into(),
            String::new(),
            String::new(),
            String::new(),
        ])
        .unwrap();
    let event = wait_for(&handle, |e| matches!(e, AppEvent::ValidationFailed(_)));
    assert_eq!(
        event,
        AppEvent::ValidationFailed("Please answer at least the first 3 questions".into())
    );
    assert!(handle.state().read().session.answers.is_none());
    handle.shutdown().unwrap();
}

/// Test that a podcast reply without audio quietly re-enables the trigger
#[test]
fn test_podcast_without_audio_is_silent() {
    let service = ScriptedService::default()
        .reply(Ok(AnalysisResponse::single(64.0, "Host A: welcome back")))
        .audio_reply(Ok(AudioResponse { audio: None }));
    let handle = start(service);

    ready_single(&handle, "podcast");
    wait_for(&handle, |e| *e == AppEvent::ResultReady);
    assert!(handle.state().read().session.offers_podcast());

    handle.generate_podcast().unwrap();
    wait_for(&handle, |e| *e == AppEvent::PodcastUnavailable);
    assert_eq!(handle.state().read().podcast, PodcastState::Idle);
    handle.shutdown().unwrap();
}

/// Test that podcast audio is decoded into the player state
#[test]
fn test_podcast_audio_ready() {
    let service = ScriptedService::default()
        .reply(Ok(AnalysisResponse::single(64.0, "Host A: welcome back")))
        .audio_reply(Ok(AudioResponse {
            audio: Some("SUQzBAA=".into()),
        }));
    let handle = start(service);

    ready_single(&handle, "podcast");
    wait_for(&handle, |e| *e == AppEvent::ResultReady);
    handle.generate_podcast().unwrap();
    wait_for(&handle, |e| *e == AppEvent::PodcastReady);

    match &handle.state().read().podcast {
        PodcastState::Ready(audio) => assert_eq!(audio.bytes(), b"ID3\x04\x00"),
        other => panic!("unexpected podcast state {:?}", other),
    }
    handle.shutdown().unwrap();
}

/// Test that podcast generation is not offered for other styles
#[test]
fn test_podcast_not_offered_for_other_styles() {
    let service =
        ScriptedService::default().reply(Ok(AnalysisResponse::single(64.0, "Solid")));
    let handle = start(service);

    ready_single(&handle, "roasting");
    wait_for(&handle, |e| *e == AppEvent::ResultReady);
    handle.generate_podcast().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.state().read().podcast, PodcastState::Idle);
    handle.shutdown().unwrap();
}

/// Test login, status refresh and logout
#[test]
fn test_login_and_logout() {
    let service = ScriptedService::default()
        .auth_reply(Ok(AuthReply::Rejected("Invalid email or password".into())));
    let handle = start(service);

    handle.login("dj@example.com", "wrongpass").unwrap();
    let event = wait_for(&handle, |e| matches!(e, AppEvent::AuthFailed(_)));
    assert_eq!(event, AppEvent::AuthFailed("Invalid email or password".into()));

    handle.login("dj@example.com", "rightpass").unwrap();
    wait_until(&handle, "login", |s| s.auth.user.authenticated);
    assert_eq!(
        handle.state().read().auth.user.email.as_deref(),
        Some("dj@example.com")
    );

    handle.logout().unwrap();
    wait_until(&handle, "logout", |s| s.auth.user.email.is_none());
    let auth = handle.state().read().auth.clone();
    assert!(!auth.user.authenticated);
    assert!(!auth.guest);
    assert!(auth.error.is_none());
    handle.shutdown().unwrap();
}
