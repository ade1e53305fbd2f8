//! Test runner for executing test configurations
//!
//! The runner schedules actions at their specified times and turns them into
//! commands for the app. Assertions are checked against a state snapshot.

use super::{ActionType, Assertion, TestConfig};
use crate::session::{
    AnalysisResult, AppCommand, AppStateSnapshot, BattleOutcome, FeedbackStyle, NameInputs,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Commands that the test runner asks the app to execute
#[derive(Debug, Clone)]
pub enum TestCommand {
    /// Forward to the controller as-is
    Send(AppCommand),
    /// Read a file and submit it for the current mode
    UploadImage { slot: usize, path: PathBuf },
    /// Exit the application
    Exit { code: i32 },
}

/// One due action
#[derive(Debug, Clone)]
pub struct TestStep {
    /// `None` for actions handled by the runner itself (logging)
    pub command: Option<TestCommand>,
    /// Check before running the command
    pub assertion: Option<Assertion>,
}

/// Result of an assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed(String),
}

/// Test runner that schedules and executes test actions
pub struct TestRunner {
    config: TestConfig,
    start_time: Option<Instant>,
    current_action_index: usize,
    completed: bool,
    test_passed: bool,
}

impl TestRunner {
    /// Create a new test runner from a configuration
    pub fn new(config: TestConfig) -> Self {
        info!("[TEST] Loaded test configuration: {}", config.test.name);
        if !config.test.description.is_empty() {
            info!("[TEST] Description: {}", config.test.description);
        }
        info!("[TEST] Total actions: {}", config.actions.len());

        Self {
            config,
            start_time: None,
            current_action_index: 0,
            completed: false,
            test_passed: true,
        }
    }

    /// Start the test (call this on the first frame)
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
            info!("[TEST] Test started: {}", self.config.test.name);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Check if the test passed (only meaningful after completion)
    pub fn test_passed(&self) -> bool {
        self.test_passed
    }

    /// Mark the run as failed from outside an assertion (e.g. an unreadable fixture)
    pub fn fail(&mut self, reason: &str) {
        error!("[TEST] FAIL: {}", reason);
        self.test_passed = false;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Poll for the next due action
    ///
    /// Returns `None` while the next action is not due yet.
    pub fn poll(&mut self) -> Option<TestStep> {
        if self.completed {
            return None;
        }

        let elapsed = self.start_time?.elapsed();
        let action = match self.config.actions.get(self.current_action_index) {
            Some(action) => action,
            None => {
                self.completed = true;
                return None;
            }
        };

        if elapsed < action.delay() {
            return None;
        }

        debug!(
            "[TEST] Executing action at {}ms: {:?}",
            action.time_ms, action.action
        );
        let step = TestStep {
            command: action_to_command(&action.action),
            assertion: action.assert.clone(),
        };

        self.current_action_index += 1;
        if self.current_action_index >= self.config.actions.len() {
            self.completed = true;
        }
        Some(step)
    }

    /// Check an assertion against the current state
    pub fn check_assertion(
        &mut self,
        assertion: &Assertion,
        state: &AppStateSnapshot,
    ) -> AssertionResult {
        let result = evaluate(assertion, state);

        match &result {
            AssertionResult::Passed => {
                info!("[TEST] PASS: Assertion {:?}", assertion);
            }
            AssertionResult::Failed(reason) => {
                error!("[TEST] FAIL: Assertion {:?} - {}", assertion, reason);
                self.test_passed = false;
            }
        }

        result
    }

    /// Get a summary of the test result
    pub fn summary(&self) -> String {
        let status = if self.test_passed { "PASSED" } else { "FAILED" };
        format!(
            "[TEST] Test '{}' {}: Executed {} actions in {:?}",
            self.config.test.name,
            status,
            self.current_action_index,
            self.elapsed()
        )
    }
}

fn action_to_command(action: &ActionType) -> Option<TestCommand> {
    let command = match action {
        ActionType::SelectMode { mode } => AppCommand::SelectModeTag(mode.clone()),
        ActionType::UploadImage { slot, path } => {
            return Some(TestCommand::UploadImage {
                slot: *slot,
                path: PathBuf::from(path),
            })
        }
        ActionType::ClearImage { slot } => AppCommand::ClearImage(*slot),
        ActionType::SetNames {
            user_name,
            name_a,
            name_b,
        } => AppCommand::SetNames(NameInputs {
            user_name: user_name.clone(),
            name_a: name_a.clone(),
            name_b: name_b.clone(),
        }),
        ActionType::SubmitAnswers { answers } => {
            let mut raw: [String; 6] = Default::default();
            for (slot, answer) in raw.iter_mut().zip(answers) {
                *slot = answer.clone();
            }
            AppCommand::SubmitAnswers(raw)
        }
        ActionType::SelectStyle { style } => {
            AppCommand::SelectStyle(FeedbackStyle::new(style.as_str()))
        }
        ActionType::RunAnalysis => AppCommand::RunAnalysis,
        ActionType::GeneratePodcast => AppCommand::GeneratePodcast,
        ActionType::GoBack => AppCommand::GoBack,
        ActionType::ContinueAsGuest => AppCommand::ContinueAsGuest,
        ActionType::Log { message } => {
            info!("[TEST] Log: {}", message);
            return None;
        }
        ActionType::Exit { code } => return Some(TestCommand::Exit { code: *code }),
    };
    Some(TestCommand::Send(command))
}

fn check(condition: bool, failure: impl FnOnce() -> String) -> AssertionResult {
    if condition {
        AssertionResult::Passed
    } else {
        AssertionResult::Failed(failure())
    }
}

fn evaluate(assertion: &Assertion, state: &AppStateSnapshot) -> AssertionResult {
    let session = &state.session;
    match assertion {
        Assertion::ModeIs { mode } => {
            let actual = session
                .mode
                .map(|m| m.spec().wire_tag)
                .unwrap_or("none");
            check(actual == mode.as_str(), || {
                format!("Expected mode '{}', got '{}'", mode, actual)
            })
        }
        Assertion::IsReady => check(state.ready, || "Expected inputs to be ready".to_string()),
        Assertion::NotReady => check(!state.ready, || {
            "Expected inputs to be incomplete".to_string()
        }),
        Assertion::IsLoading => check(state.loading.is_some(), || {
            "Expected an analysis to be in flight".to_string()
        }),
        Assertion::NotLoading => check(state.loading.is_none(), || {
            "Expected no analysis in flight".to_string()
        }),
        Assertion::HasResult => check(session.result.is_some(), || {
            "Expected a result".to_string()
        }),
        Assertion::WinnerIs { name } => {
            let winner = session.result.as_ref().and_then(|r| match r {
                AnalysisResult::Battle { name_a, name_b, .. } => {
                    r.outcome().map(|outcome| match outcome {
                        BattleOutcome::FirstWins => name_a.clone(),
                        BattleOutcome::SecondWins => name_b.clone(),
                        BattleOutcome::Tie => "tie".to_string(),
                    })
                }
                _ => None,
            });
            match winner {
                Some(winner) => check(winner == *name, || {
                    format!("Expected winner '{}', got '{}'", name, winner)
                }),
                None => AssertionResult::Failed("Expected a battle result".to_string()),
            }
        }
        Assertion::ImageCount { count } => {
            let actual = session.images.populated_count();
            check(actual == *count, || {
                format!("Expected {} images, got {}", count, actual)
            })
        }
        Assertion::ErrorShown => check(state.error.is_some(), || {
            "Expected an error message".to_string()
        }),
        Assertion::InputErrorShown => check(state.input_error.is_some(), || {
            "Expected a validation message".to_string()
        }),
        Assertion::IsAuthenticated => check(state.auth.user.authenticated, || {
            "Expected an authenticated user".to_string()
        }),
    }
}
