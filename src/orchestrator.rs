//! Controller coordinating the TasteCheck flow
//!
//! The controller owns every session mutation. It runs on its own thread and
//! multiplexes:
//! - commands from the UI or the test runner
//! - replies from the API worker
//! - the short delay between choosing a style and starting the analysis
//!
//! Readers (UI, test runner) query `SharedAppState` snapshots and listen for
//! `AppEvent`s that tell them when to repaint.

use crate::api::{AnalysisRequest, AuthAction, AuthReply, Credentials, TasteService};
use crate::audio::PodcastAudio;
use crate::config::ClientConfig;
use crate::processor::{ApiCommand, ApiEvent, ApiWorker, LoadingRotation};
use crate::session::{
    AppCommand, AppEvent, FeedbackStyle, ImageBlob, LoadingState, Mode, NameInputs, Names,
    PodcastState, SharedAppState,
};
use crate::{Result, TasteError};
use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How long shutdown waits for the API worker
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle for controlling the controller from the UI or tests
///
/// This provides the public interface for:
/// - Sending commands
/// - Receiving events (for UI updates)
/// - Querying state (via SharedAppState)
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: Sender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    state: SharedAppState,
}

impl ControllerHandle {
    /// Send a command to the controller
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| TasteError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn select_mode(&self, mode: Mode) -> Result<()> {
        self.send_command(AppCommand::SelectMode(mode))
    }

    /// Enter a mode by its tag; unknown tags are ignored by the controller
    pub fn select_mode_tag(&self, tag: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::SelectModeTag(tag.into()))
    }

    /// Return to the mode picker with a fresh session
    pub fn go_back(&self) -> Result<()> {
        self.send_command(AppCommand::GoBack)
    }

    pub fn submit_image(&self, mode: Mode, slot: usize, blob: ImageBlob) -> Result<()> {
        self.send_command(AppCommand::SubmitImage { mode, slot, blob })
    }

    pub fn clear_image(&self, slot: usize) -> Result<()> {
        self.send_command(AppCommand::ClearImage(slot))
    }

    pub fn set_names(&self, names: NameInputs) -> Result<()> {
        self.send_command(AppCommand::SetNames(names))
    }

    pub fn submit_answers(&self, answers: [String; 6]) -> Result<()> {
        self.send_command(AppCommand::SubmitAnswers(answers))
    }

    /// Choose a feedback style; the analysis starts after the configured delay
    pub fn select_style(&self, style: FeedbackStyle) -> Result<()> {
        self.send_command(AppCommand::SelectStyle(style))
    }

    pub fn run_analysis(&self) -> Result<()> {
        self.send_command(AppCommand::RunAnalysis)
    }

    pub fn generate_podcast(&self) -> Result<()> {
        self.send_command(AppCommand::GeneratePodcast)
    }

    pub fn refresh_user_status(&self) -> Result<()> {
        self.send_command(AppCommand::RefreshUserStatus)
    }

    pub fn login(&self, email: impl Into<String>, password: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::Login {
            email: email.into(),
            password: password.into(),
        })
    }

    pub fn register(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Result<()> {
        self.send_command(AppCommand::Register {
            email: email.into(),
            password: password.into(),
            confirm: confirm.into(),
        })
    }

    pub fn logout(&self) -> Result<()> {
        self.send_command(AppCommand::Logout)
    }

    pub fn continue_as_guest(&self) -> Result<()> {
        self.send_command(AppCommand::ContinueAsGuest)
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> Result<AppEvent> {
        self.event_rx
            .recv()
            .map_err(|e| TasteError::ChannelError(format!("Failed to receive event: {}", e)))
    }

    /// Receive an event, giving up after `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<AppEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Get the shared application state
    pub fn state(&self) -> &SharedAppState {
        &self.state
    }

    // === Convenience state query methods ===

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}

/// Main controller owning the session flow
///
/// The controller manages the lifecycle of the API worker, routes its replies
/// into shared state and emits events for UI notifications.
pub struct Controller<S: TasteService> {
    config: ClientConfig,
    state: SharedAppState,
    command_rx: Receiver<AppCommand>,
    event_tx: Sender<AppEvent>,
    worker: Option<ApiWorker<S>>,
}

impl<S: TasteService> Controller<S> {
    /// Create a new controller with the given configuration and service
    ///
    /// Returns the controller and a handle for controlling it.
    /// The controller must be started with `start()` to begin processing.
    pub fn new(config: ClientConfig, service: S) -> Result<(Self, ControllerHandle)> {
        Self::with_state(config, service, SharedAppState::new())
    }

    /// Create a controller with an existing shared state
    ///
    /// This is useful when the state must be shared with components (e.g. a test
    /// runner) created before the controller.
    pub fn with_state(
        config: ClientConfig,
        service: S,
        state: SharedAppState,
    ) -> Result<(Self, ControllerHandle)> {
        config.validate()?;
        let buffer_size = config.channel_buffer_size;

        let (command_tx, command_rx) = bounded(buffer_size);
        let (event_tx, event_rx) = bounded(buffer_size);

        let handle = ControllerHandle {
            command_tx,
            event_rx,
            state: state.clone(),
        };

        let controller = Self {
            worker: Some(ApiWorker::new(service, buffer_size)),
            config,
            state,
            command_rx,
            event_tx,
        };

        Ok((controller, handle))
    }

    /// Start the API worker and the controller loop
    ///
    /// This consumes the controller and returns join handles for all threads.
    pub fn start(mut self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        let worker = self
            .worker
            .take()
            .ok_or_else(|| TasteError::ChannelError("API worker already taken".into()))?;
        let mut api = worker.start()?;
        if let Some(handle) = api.take_join_handle() {
            handles.push(handle);
        }
        info!("API worker started");

        let flow = FlowLoop {
            config: self.config,
            state: self.state,
            event_tx: self.event_tx,
            api_tx: api.command_tx.clone(),
            style_timer: never(),
            pending_analysis: None,
            rotation: None,
            pending_audio: None,
        };
        let command_rx = self.command_rx;
        let api_rx = api.event_rx.clone();

        let handle = thread::Builder::new()
            .name("tastecheck-controller".to_string())
            .spawn(move || flow.run(command_rx, api_rx))?;
        handles.push(handle);
        info!("Controller loop started");

        Ok(handles)
    }
}

/// Analysis awaiting a reply from the worker
struct PendingAnalysis {
    request_id: Uuid,
    mode: Mode,
    names: Names,
}

/// State private to the controller thread
struct FlowLoop {
    config: ClientConfig,
    state: SharedAppState,
    event_tx: Sender<AppEvent>,
    api_tx: Sender<ApiCommand>,
    /// Fires once after a style is chosen; `never()` when disarmed
    style_timer: Receiver<Instant>,
    pending_analysis: Option<PendingAnalysis>,
    rotation: Option<LoadingRotation>,
    pending_audio: Option<Uuid>,
}

impl FlowLoop {
    fn run(mut self, command_rx: Receiver<AppCommand>, api_rx: Receiver<ApiEvent>) {
        info!("Controller main loop starting");

        loop {
            let style_timer = self.style_timer.clone();
            select! {
                recv(command_rx) -> cmd => {
                    match cmd {
                        Ok(AppCommand::Shutdown) => {
                            self.shutdown(&api_rx);
                            return;
                        }
                        Ok(cmd) => self.handle_command(cmd),
                        Err(_) => {
                            warn!("Command channel disconnected");
                            break;
                        }
                    }
                }

                recv(api_rx) -> event => {
                    match event {
                        Ok(event) => self.handle_api_event(event),
                        Err(_) => {
                            warn!("API event channel disconnected");
                            break;
                        }
                    }
                }

                recv(style_timer) -> _ => {
                    self.style_timer = never();
                    debug!("Style delay elapsed");
                    self.start_analysis();
                }
            }
        }

        self.cancel_flows();
        let _ = self.api_tx.send(ApiCommand::Shutdown);
        info!("Controller main loop exiting");
    }

    fn emit(&self, event: AppEvent) {
        if self.event_tx.try_send(event).is_err() {
            debug!("Event channel full or closed, dropping event");
        }
    }

    fn send_api(&self, command: ApiCommand) -> Result<()> {
        self.api_tx
            .send(command)
            .map_err(|e| TasteError::ChannelError(format!("API worker unavailable: {}", e)))
    }

    fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::SelectMode(mode) => self.select_mode(mode),

            AppCommand::SelectModeTag(tag) => match tag.parse::<Mode>() {
                Ok(mode) => self.select_mode(mode),
                Err(e) => warn!("Ignoring mode selection: {}", e),
            },

            AppCommand::GoBack => {
                self.cancel_flows();
                self.state.write().go_back();
                debug!("Returned to mode selection");
                self.emit(AppEvent::StateChanged);
            }

            AppCommand::SubmitImage { mode, slot, blob } => {
                let result = self.state.write().session.submit_image(mode, slot, blob);
                self.after_input(result);
            }

            AppCommand::ClearImage(slot) => {
                self.state.write().session.clear_image(slot);
                self.emit(AppEvent::StateChanged);
            }

            AppCommand::SetNames(names) => {
                self.state.write().session.names = names;
                self.emit(AppEvent::StateChanged);
            }

            AppCommand::SubmitAnswers(raw) => {
                let raw = [
                    raw[0].as_str(),
                    raw[1].as_str(),
                    raw[2].as_str(),
                    raw[3].as_str(),
                    raw[4].as_str(),
                    raw[5].as_str(),
                ];
                let result = self.state.write().session.submit_answers(raw);
                self.after_input(result);
            }

            AppCommand::SelectStyle(style) => {
                if self.pending_analysis.is_some() {
                    warn!("Ignoring style change while an analysis is running");
                    return;
                }
                debug!("Feedback style selected: {}", style);
                self.state.write().session.feedback_style = Some(style);
                self.style_timer = after(self.config.style_select_delay());
                self.emit(AppEvent::StateChanged);
            }

            AppCommand::RunAnalysis => {
                self.style_timer = never();
                self.start_analysis();
            }

            AppCommand::GeneratePodcast => self.start_podcast(),

            AppCommand::RefreshUserStatus => {
                if let Err(e) = self.send_api(ApiCommand::UserStatus) {
                    error!("{}", e);
                }
            }

            AppCommand::Login { email, password } => {
                self.start_auth(AuthAction::Login, Ok(Credentials::new(email, password)));
            }

            AppCommand::Register {
                email,
                password,
                confirm,
            } => {
                let credentials = Credentials::for_registration(&email, &password, &confirm);
                self.start_auth(AuthAction::Register, credentials);
            }

            AppCommand::Logout => {
                if let Err(e) = self.send_api(ApiCommand::Logout) {
                    error!("{}", e);
                }
            }

            AppCommand::ContinueAsGuest => {
                {
                    let mut s = self.state.write();
                    s.auth.guest = true;
                    s.auth.error = None;
                }
                info!("Continuing as guest");
                self.emit(AppEvent::AuthChanged);
            }

            // Handled by the loop
            AppCommand::Shutdown => {}
        }
    }

    fn select_mode(&mut self, mode: Mode) {
        self.cancel_flows();
        {
            let mut s = self.state.write();
            s.go_back();
            s.session.select_mode(mode);
        }
        info!("Mode selected: {}", mode);
        self.emit(AppEvent::StateChanged);
    }

    /// Report the outcome of an image or answers submission
    fn after_input(&mut self, result: Result<bool>) {
        match result {
            Ok(became_ready) => {
                self.state.write().input_error = None;
                self.emit(AppEvent::StateChanged);
                if became_ready {
                    debug!("Inputs complete, offering feedback styles");
                    self.emit(AppEvent::ReadyForFeedback);
                }
            }
            Err(e) => {
                let message = e.user_message();
                debug!("Input rejected: {}", e);
                self.state.write().input_error = Some(message.clone());
                self.emit(AppEvent::ValidationFailed(message));
            }
        }
    }

    /// Send the analysis request if the session allows it; otherwise do nothing
    fn start_analysis(&mut self) {
        if self.pending_analysis.is_some() {
            debug!("Analysis already in flight");
            return;
        }

        let session = self.state.session();
        if !session.can_run_analysis() {
            debug!("Analysis requested before inputs and style are complete");
            return;
        }
        let mode = match session.mode {
            Some(mode) => mode,
            None => return,
        };

        let prepared = match AnalysisRequest::prepare(&session) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("Could not prepare analysis: {}", e);
                return;
            }
        };

        let request_id = Uuid::new_v4();
        {
            let mut s = self.state.write();
            s.clear_error();
            s.loading = Some(LoadingState {
                request_id,
                headline: mode.spec().loading_headline,
                status_index: 0,
            });
        }
        self.rotation = Some(LoadingRotation::start(
            self.state.clone(),
            request_id,
            self.config.loading_rotation_interval(),
            self.event_tx.clone(),
        ));
        self.pending_analysis = Some(PendingAnalysis {
            request_id,
            mode,
            names: prepared.names,
        });

        info!("Starting {} analysis {}", mode, request_id);
        self.emit(AppEvent::AnalysisStarted(request_id));

        if let Err(e) = self.send_api(ApiCommand::Analyze {
            request_id,
            request: prepared.request,
        }) {
            self.finish_analysis(request_id, Err(e));
        }
    }

    fn finish_analysis(
        &mut self,
        request_id: Uuid,
        outcome: Result<crate::api::AnalysisResponse>,
    ) {
        let pending = match self.pending_analysis.take() {
            Some(p) if p.request_id == request_id => p,
            other => {
                self.pending_analysis = other;
                debug!("Discarding stale analysis reply {}", request_id);
                return;
            }
        };

        if let Some(mut rotation) = self.rotation.take() {
            rotation.cancel();
        }

        let stored = outcome
            .and_then(|response| response.into_result(pending.mode, pending.names))
            .and_then(|result| {
                let mut s = self.state.write();
                s.loading = None;
                s.podcast = PodcastState::Idle;
                s.session.set_result(result)
            });

        match stored {
            Ok(()) => {
                info!("Analysis {} complete", request_id);
                self.emit(AppEvent::ResultReady);
            }
            Err(e) => {
                error!("Analysis {} failed: {}", request_id, e);
                let message = e.user_message();
                {
                    let mut s = self.state.write();
                    s.loading = None;
                    s.set_error(message.clone());
                }
                self.emit(AppEvent::AnalysisFailed(message));
            }
        }
    }

    fn start_podcast(&mut self) {
        let (offered, generating, dialogue) = {
            let s = self.state.read();
            (
                s.session.offers_podcast(),
                s.podcast.is_generating(),
                s.session
                    .result
                    .as_ref()
                    .map(|r| r.analysis().to_string()),
            )
        };
        let dialogue = match dialogue {
            Some(d) if offered && !generating => d,
            _ => {
                debug!("Podcast not available right now");
                return;
            }
        };

        let request_id = Uuid::new_v4();
        self.state.write().podcast = PodcastState::Generating { request_id };
        self.pending_audio = Some(request_id);
        self.emit(AppEvent::StateChanged);
        info!("[AUDIO] Requesting podcast audio {}", request_id);

        if let Err(e) = self.send_api(ApiCommand::GenerateAudio {
            request_id,
            dialogue,
        }) {
            self.finish_podcast(request_id, Err(e));
        }
    }

    fn finish_podcast(
        &mut self,
        request_id: Uuid,
        outcome: Result<crate::api::AudioResponse>,
    ) {
        if self.pending_audio != Some(request_id) {
            debug!("Discarding stale audio reply {}", request_id);
            return;
        }
        self.pending_audio = None;

        let decoded = outcome.and_then(|response| {
            response
                .audio
                .map(|encoded| PodcastAudio::from_base64(&encoded))
                .transpose()
        });

        let (podcast, event) = match decoded {
            Ok(Some(audio)) => (PodcastState::Ready(audio), AppEvent::PodcastReady),
            Ok(None) => {
                debug!("[AUDIO] Server returned no audio");
                (PodcastState::Idle, AppEvent::PodcastUnavailable)
            }
            Err(e) => {
                warn!("[AUDIO] Podcast generation failed: {}", e);
                let message = TasteError::AudioError(e.to_string()).user_message();
                (PodcastState::Failed, AppEvent::PodcastFailed(message))
            }
        };
        self.state.write().podcast = podcast;
        self.emit(event);
    }

    fn start_auth(&mut self, action: AuthAction, credentials: Result<Credentials>) {
        let credentials = match credentials {
            Ok(c) => c,
            Err(e) => {
                let message = e.user_message();
                self.state.write().auth.error = Some(message.clone());
                self.emit(AppEvent::AuthFailed(message));
                return;
            }
        };

        {
            let mut s = self.state.write();
            s.auth.pending = true;
            s.auth.error = None;
        }
        self.emit(AppEvent::StateChanged);

        if let Err(e) = self.send_api(ApiCommand::Authenticate {
            action,
            credentials,
        }) {
            self.finish_auth(action, Err(e));
        }
    }

    fn finish_auth(&mut self, action: AuthAction, outcome: Result<AuthReply>) {
        self.state.write().auth.pending = false;
        match outcome {
            Ok(AuthReply::Accepted) => {
                info!("{:?} accepted", action);
                if let Err(e) = self.send_api(ApiCommand::UserStatus) {
                    error!("{}", e);
                }
                self.emit(AppEvent::AuthChanged);
            }
            Ok(AuthReply::Rejected(message)) => {
                debug!("{:?} rejected: {}", action, message);
                self.state.write().auth.error = Some(message.clone());
                self.emit(AppEvent::AuthFailed(message));
            }
            Err(e) => {
                warn!("{:?} failed: {}", action, e);
                let message = e.user_message();
                self.state.write().auth.error = Some(message.clone());
                self.emit(AppEvent::AuthFailed(message));
            }
        }
    }

    fn handle_api_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::AnalysisDone { request_id, result } => {
                self.finish_analysis(request_id, result)
            }

            ApiEvent::AudioDone { request_id, result } => self.finish_podcast(request_id, result),

            ApiEvent::UserStatus(Ok(status)) => {
                debug!("User status: authenticated={}", status.authenticated);
                self.state.write().auth.user = status;
                self.emit(AppEvent::AuthChanged);
            }

            ApiEvent::UserStatus(Err(e)) => {
                warn!("Could not load user status: {}", e);
            }

            ApiEvent::AuthDone { action, result } => self.finish_auth(action, result),

            ApiEvent::LoggedOut(result) => {
                if let Err(e) = result {
                    warn!("Logout failed: {}", e);
                }
                {
                    let mut s = self.state.write();
                    s.auth = Default::default();
                }
                if let Err(e) = self.send_api(ApiCommand::UserStatus) {
                    error!("{}", e);
                }
                self.emit(AppEvent::AuthChanged);
            }

            ApiEvent::Shutdown => {
                warn!("API worker stopped unexpectedly");
            }
        }
    }

    /// Cancel timers and forget in-flight requests so late replies are ignored
    fn cancel_flows(&mut self) {
        self.style_timer = never();
        if let Some(mut rotation) = self.rotation.take() {
            rotation.cancel();
        }
        if let Some(pending) = self.pending_analysis.take() {
            debug!("Abandoning analysis {}", pending.request_id);
            let _ = self.api_tx.send(ApiCommand::Cancel(pending.request_id));
        }
        if let Some(request_id) = self.pending_audio.take() {
            let _ = self.api_tx.send(ApiCommand::Cancel(request_id));
        }
    }

    fn shutdown(&mut self, api_rx: &Receiver<ApiEvent>) {
        info!("Shutdown requested");
        self.cancel_flows();
        let _ = self.api_tx.send(ApiCommand::Shutdown);

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Shutdown timeout reached, forcing exit");
                break;
            }
            match api_rx.recv_timeout(remaining) {
                Ok(ApiEvent::Shutdown) => {
                    debug!("API worker shutdown confirmed");
                    break;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        let _ = self.event_tx.send(AppEvent::Shutdown);
        info!("Controller shutdown complete");
    }
}
