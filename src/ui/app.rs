//! Main application struct and eframe integration
//!
//! `TasteApp` projects controller snapshots into components, turns queued
//! `UiAction`s into controller commands and owns the window-bound side flows
//! (screenshot export, clipboard, audio playback, scripted test runs).

use crate::audio::PodcastPlayer;
use crate::config::ClientConfig;
use crate::orchestrator::ControllerHandle;
use crate::processor::AnimatedScore;
use crate::session::{AppCommand, AppEvent, AppStateSnapshot, ImageBlob, Mode, PodcastState};
use crate::share::{self, ShareCard, ShareStatus, SHARE_LINK};
use crate::testconfig::{AssertionResult, TestCommand, TestConfig, TestRunner};
use crate::ui::components::{
    label_widget, AuthPanel, Header, ImageUpload, LoadingPanel, ModePicker, Questionnaire,
    ResultsView, StylePicker,
};
use crate::ui::state::{UiAction, UiState};
use crate::ui::theme::Theme;
use egui::{CentralPanel, RichText, ScrollArea, TopBottomPanel, WidgetType};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often the window polls the controller while idle
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main TasteCheck application
pub struct TasteApp {
    /// Whether the app has been initialized
    initialized: bool,
    handle: ControllerHandle,
    config: ClientConfig,
    /// Presentation state
    ui_state: UiState,
    theme: Theme,
    /// Mode seen on the previous frame, used to notice resets
    last_mode: Option<Mode>,
    /// Opened on first playback
    player: Option<PodcastPlayer>,
    player_error: Option<String>,
    /// Test runner (if running automated tests)
    test_runner: Option<TestRunner>,
    /// Exit code requested by test (if any)
    pending_exit: Option<i32>,
}

impl TasteApp {
    /// Create the application from the eframe creation context
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        handle: ControllerHandle,
        config: ClientConfig,
        test_config: Option<TestConfig>,
    ) -> Self {
        Self::with_context(&cc.egui_ctx, handle, config, test_config)
    }

    /// Create the application for an existing egui context
    pub fn with_context(
        ctx: &egui::Context,
        handle: ControllerHandle,
        config: ClientConfig,
        test_config: Option<TestConfig>,
    ) -> Self {
        let theme = Theme::dark();
        theme.apply(ctx);

        Self {
            initialized: false,
            handle,
            config,
            ui_state: UiState::new(),
            theme,
            last_mode: None,
            player: None,
            player_error: None,
            test_runner: test_config.map(TestRunner::new),
            pending_exit: None,
        }
    }

    /// Presentation state, for inspection
    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }

    /// Initialize the application (called on first frame)
    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if let Err(e) = self.handle.refresh_user_status() {
            warn!("Could not request user status: {}", e);
        }
        if let Some(ref mut runner) = self.test_runner {
            runner.start();
        }

        info!("TasteCheck UI initialized");
    }

    /// Run one frame without an eframe `Frame`
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.initialize();
        self.drain_events();

        let snapshot = self.handle.state().snapshot();
        self.sync_with_session(ctx, &snapshot);
        self.process_share_capture(ctx);
        self.handle_dropped_files(ctx, &snapshot);
        self.process_test_commands(ctx);

        self.render(ctx, &snapshot);

        for action in self.ui_state.drain_actions() {
            self.execute(ctx, action, &snapshot);
        }

        if self.test_runner.is_some() || self.needs_animation_frames() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.handle.try_recv_event() {
            debug!("Controller event: {:?}", event);
            match event {
                AppEvent::AuthChanged => self.ui_state.auth.clear_passwords(),
                AppEvent::PodcastReady => self.player_error = None,
                AppEvent::PodcastUnavailable => {
                    self.ui_state.podcast_notice.mark_unavailable(Instant::now())
                }
                AppEvent::Shutdown => info!("Controller stopped"),
                _ => {}
            }
        }
    }

    /// Reset presentation state when the session was reset and keep counters in step
    fn sync_with_session(&mut self, ctx: &egui::Context, snapshot: &AppStateSnapshot) {
        let mode = snapshot.session.mode;
        if mode != self.last_mode {
            debug!("Mode changed from {:?} to {:?}", self.last_mode, mode);
            self.ui_state.reset();
            self.stop_player();
            self.last_mode = mode;
        }
        if snapshot.session.result.is_none() && self.player.is_some() {
            self.stop_player();
        }

        let config = &self.config;
        self.ui_state
            .sync_scores(snapshot.session.result.as_ref(), |target| {
                let ctx = ctx.clone();
                AnimatedScore::start(config.score_animation(target), move || {
                    ctx.request_repaint()
                })
            });

        self.ui_state.share_status.settle(Instant::now());
    }

    fn needs_animation_frames(&self) -> bool {
        self.ui_state.scores.iter().any(|s| !s.is_finished())
            || self.ui_state.podcast_notice.message(Instant::now()).is_some()
            || self.ui_state.share_status.is_busy()
            || matches!(self.ui_state.share_status, ShareStatus::Downloaded(_))
            || self.player.as_ref().is_some_and(PodcastPlayer::is_playing)
    }

    fn process_share_capture(&mut self, ctx: &egui::Context) {
        if let Some(outcome) = share::process_capture_events(ctx, &self.config.share_output_dir) {
            if let Ok(share::ShareOutcome::Saved(path)) = &outcome {
                info!("[SHARE] Downloaded {}", path.display());
            }
            self.ui_state.share_status = ShareStatus::from_outcome(&outcome, Instant::now());
        }
    }

    /// Files dropped on the window fill the first free slots of the mode
    fn handle_dropped_files(&mut self, ctx: &egui::Context, snapshot: &AppStateSnapshot) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        let Some(mode) = snapshot.session.mode.filter(|m| m.uses_images()) else {
            debug!("Ignoring {} dropped file(s) outside an image mode", dropped.len());
            return;
        };

        let capacity = mode.spec().slot_count;
        let mut free = (0..capacity).filter(|slot| snapshot.session.images.get(*slot).is_none());
        for file in dropped {
            let slot = free.next().unwrap_or(capacity - 1);
            let blob = match (&file.path, &file.bytes) {
                (Some(path), _) => ImageBlob::from_path(path),
                (None, Some(bytes)) if file.mime.is_empty() => {
                    Ok(ImageBlob::from_named_bytes(file.name.clone(), bytes.to_vec()))
                }
                (None, Some(bytes)) => Ok(ImageBlob::new(
                    file.name.clone(),
                    file.mime.clone(),
                    bytes.to_vec(),
                )),
                (None, None) => continue,
            };
            self.submit_blob(mode, slot, blob);
        }
    }

    /// Read an image from disk and hand it to the controller
    fn load_image(&mut self, slot: usize, path: &Path) -> bool {
        let Some(mode) = self.handle.state().mode() else {
            warn!("No mode selected, ignoring {}", path.display());
            return false;
        };
        self.submit_blob(mode, slot, ImageBlob::from_path(path))
    }

    fn submit_blob(&mut self, mode: Mode, slot: usize, blob: crate::Result<ImageBlob>) -> bool {
        match blob {
            Ok(blob) => {
                self.ui_state.file_error = None;
                if let Err(e) = self.handle.submit_image(mode, slot, blob) {
                    error!("Failed to submit image: {}", e);
                    return false;
                }
                true
            }
            Err(e) => {
                warn!("Could not read image for slot {}: {}", slot, e);
                self.ui_state.file_error = Some(format!("Could not read that file ({})", e));
                false
            }
        }
    }

    fn execute(&mut self, ctx: &egui::Context, action: UiAction, snapshot: &AppStateSnapshot) {
        match action {
            UiAction::Command(command) => {
                if let Err(e) = self.handle.send_command(command) {
                    error!("Failed to send command: {}", e);
                }
            }
            UiAction::LoadImage { slot, path } => {
                self.load_image(slot, &path);
            }
            UiAction::Share => {
                let (Some(result), Some(rect)) =
                    (snapshot.session.result.as_ref(), self.ui_state.share_card_rect)
                else {
                    return;
                };
                let card = ShareCard::from_result(result);
                self.ui_state.share_status = ShareStatus::Capturing;
                share::request_capture(ctx, &card.file_name(), rect);
            }
            UiAction::CopyLink => {
                ctx.copy_text(SHARE_LINK.to_string());
                self.ui_state.link_status.mark_copied(Instant::now());
                info!("[SHARE] Copied {} to the clipboard", SHARE_LINK);
            }
            UiAction::PlayPodcast => {
                if let PodcastState::Ready(audio) = &snapshot.podcast {
                    let played = match self.player.as_mut() {
                        Some(player) => player.play(audio),
                        None => PodcastPlayer::new().and_then(|mut player| {
                            player.play(audio)?;
                            self.player = Some(player);
                            Ok(())
                        }),
                    };
                    if let Err(e) = played {
                        error!("[AUDIO] Playback failed: {}", e);
                        self.player_error = Some(e.user_message());
                    }
                }
            }
            UiAction::TogglePodcast => {
                if let Some(player) = self.player.as_mut() {
                    player.toggle_pause();
                }
            }
        }
    }

    fn stop_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.stop();
        }
        self.player_error = None;
    }

    /// Process test runner commands
    fn process_test_commands(&mut self, ctx: &egui::Context) {
        let mut pending_steps = Vec::new();
        if let Some(ref mut runner) = self.test_runner {
            while let Some(step) = runner.poll() {
                pending_steps.push(step);
            }
        }

        for step in pending_steps {
            if let Some(ref assertion) = step.assertion {
                let snapshot = self.handle.state().snapshot();
                if let Some(ref mut runner) = self.test_runner {
                    let result = runner.check_assertion(assertion, &snapshot);
                    if matches!(result, AssertionResult::Failed(_)) && self.pending_exit == Some(0)
                    {
                        self.pending_exit = Some(1);
                    }
                }
            }

            match step.command {
                Some(TestCommand::Send(command)) => {
                    info!("[TEST] Executing: {:?}", command);
                    if let Err(e) = self.handle.send_command(command) {
                        self.fail_test(&format!("command not delivered: {}", e));
                    }
                }
                Some(TestCommand::UploadImage { slot, path }) => {
                    info!("[TEST] Executing: UploadImage {} -> slot {}", path.display(), slot);
                    if !self.load_image(slot, &path) {
                        self.fail_test(&format!("could not upload {}", path.display()));
                    }
                }
                Some(TestCommand::Exit { code }) => {
                    info!("[TEST] Executing: Exit with code {}", code);
                    self.pending_exit = Some(code);
                }
                None => {}
            }
        }

        if let Some(ref runner) = self.test_runner {
            if runner.is_completed() {
                info!("{}", runner.summary());

                if let Some(code) = self.pending_exit.take() {
                    let final_code = if runner.test_passed() { code } else { 1 };
                    info!("[TEST] Exiting with code {}", final_code);
                    if let Err(e) = self.handle.shutdown() {
                        warn!("[TEST] Shutdown failed: {}", e);
                    }
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    std::process::exit(final_code);
                }
            }
        }
    }

    fn fail_test(&mut self, reason: &str) {
        if let Some(ref mut runner) = self.test_runner {
            runner.fail(reason);
        }
    }

    fn render(&mut self, ctx: &egui::Context, snapshot: &AppStateSnapshot) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                Header::new(&mut self.ui_state, &self.theme).show(ui, snapshot);
            });

        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing_lg),
            )
            .show(ctx, |ui| {
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.show_content(ui, snapshot));
            });
    }

    fn show_content(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        if !snapshot.auth.can_use_app() {
            ui.vertical_centered(|ui| {
                ui.add_space(self.theme.spacing_lg);
                AuthPanel::new(&mut self.ui_state, &self.theme).show(ui, snapshot);
            });
            return;
        }

        let Some(mode) = snapshot.session.mode else {
            ModePicker::new(&mut self.ui_state, &self.theme).show(ui);
            return;
        };

        ui.horizontal(|ui| {
            let back = ui.button("← Back");
            label_widget(&back, WidgetType::Button, true, "Go back");
            if back.clicked() {
                self.ui_state.command(AppCommand::GoBack);
            }
            ui.label(
                RichText::new(mode.spec().label)
                    .size(20.0)
                    .strong()
                    .color(self.theme.text_primary),
            );
        });
        ui.add_space(self.theme.spacing);

        if let Some(error) = &snapshot.error {
            self.show_error_banner(ui, error, snapshot);
            ui.add_space(self.theme.spacing);
        }

        if let Some(loading) = &snapshot.loading {
            LoadingPanel::new(loading, &self.theme).show(ui);
        } else if snapshot.session.result.is_some() {
            let playing = self.player.as_ref().is_some_and(PodcastPlayer::is_playing);
            let loaded = self.player.as_ref().is_some_and(PodcastPlayer::is_loaded);
            ResultsView::new(&mut self.ui_state, &self.theme)
                .with_playback(playing, loaded)
                .show(ui, snapshot);
            if let Some(error) = &self.player_error {
                ui.label(RichText::new(error).color(self.theme.error));
            }
        } else {
            match mode {
                Mode::Manual => Questionnaire::new(&mut self.ui_state, &self.theme).show(ui, snapshot),
                mode => ImageUpload::new(&mut self.ui_state, &self.theme, mode).show(ui, snapshot),
            }

            if snapshot.ready {
                ui.add_space(self.theme.spacing);
                StylePicker::new(&mut self.ui_state, &self.theme).show(ui, snapshot);
            }
        }
    }

    fn show_error_banner(&mut self, ui: &mut egui::Ui, error: &str, snapshot: &AppStateSnapshot) {
        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.2))
            .rounding(self.theme.button_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let label = ui.label(RichText::new(error).color(self.theme.error));
                    label_widget(&label, WidgetType::Label, true, &format!("Error: {}", error));

                    let can_retry = snapshot.session.can_run_analysis();
                    let retry = ui.add_enabled(can_retry, egui::Button::new("Try Again"));
                    label_widget(&retry, WidgetType::Button, can_retry, "Try again");
                    if retry.clicked() {
                        self.ui_state.command(AppCommand::RunAnalysis);
                    }
                });
            });
    }
}

impl eframe::App for TasteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.stop_player();
        if let Err(e) = self.handle.shutdown() {
            warn!("Controller shutdown failed: {}", e);
        }
        info!("TasteCheck shutting down");
    }
}
