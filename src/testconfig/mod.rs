//! Scripted scenarios for automated UI runs
//!
//! A scenario is a TOML file of timed actions, each optionally carrying an
//! assertion about the shared state. The app runs one with `--test-config <file>`.

mod runner;

pub use runner::{AssertionResult, TestCommand, TestRunner, TestStep};

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A test configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    /// Test metadata
    pub test: TestMetadata,
    /// List of timed actions to execute
    pub actions: Vec<TestAction>,
}

/// Metadata about the test
#[derive(Debug, Clone, Deserialize)]
pub struct TestMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single test action with timing
#[derive(Debug, Clone, Deserialize)]
pub struct TestAction {
    /// Time in milliseconds after test start to execute this action
    pub time_ms: u64,
    /// The action to perform
    pub action: ActionType,
    /// Checked when the action comes due, before its command is sent
    #[serde(default)]
    pub assert: Option<Assertion>,
}

/// Types of actions that can be performed during a test
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionType {
    /// Enter a mode by wire tag ("single", "evolution", "battle", "manual")
    SelectMode { mode: String },
    /// Load an image file into a slot of the current mode
    UploadImage { slot: usize, path: String },
    ClearImage { slot: usize },
    SetNames {
        #[serde(default)]
        user_name: String,
        #[serde(default)]
        name_a: String,
        #[serde(default)]
        name_b: String,
    },
    /// Six questionnaire answers; missing trailing answers are blank
    SubmitAnswers { answers: Vec<String> },
    SelectStyle { style: String },
    RunAnalysis,
    GeneratePodcast,
    GoBack,
    ContinueAsGuest,
    /// Log a message for debugging
    Log { message: String },
    /// Exit the application
    Exit {
        #[serde(default)]
        code: i32,
    },
}

/// Assertions about the shared state
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Active mode has this wire tag, or "none" on the picker
    ModeIs { mode: String },
    IsReady,
    NotReady,
    IsLoading,
    NotLoading,
    HasResult,
    /// Battle winner's name, or "tie"
    WinnerIs { name: String },
    ImageCount { count: usize },
    /// A generic analysis error is on screen
    ErrorShown,
    /// An inline validation message is on screen
    InputErrorShown,
    IsAuthenticated,
}

impl TestConfig {
    /// Load a test configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TestConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TestConfigError::IoError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let config: TestConfig =
            toml::from_str(&content).map_err(|e| TestConfigError::ParseError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the test configuration
    fn validate(&self) -> Result<(), TestConfigError> {
        if self.actions.is_empty() {
            return Err(TestConfigError::ValidationError(
                "Test configuration must have at least one action".to_string(),
            ));
        }

        let mut last_time = 0;
        for action in &self.actions {
            if action.time_ms < last_time {
                return Err(TestConfigError::ValidationError(format!(
                    "Actions must be ordered by time. Found action at {}ms after action at {}ms",
                    action.time_ms, last_time
                )));
            }
            last_time = action.time_ms;

            if let ActionType::SubmitAnswers { answers } = &action.action {
                if answers.len() > 6 {
                    return Err(TestConfigError::ValidationError(format!(
                        "submit_answers takes at most 6 answers, got {}",
                        answers.len()
                    )));
                }
            }
        }

        let has_exit = self
            .actions
            .iter()
            .any(|a| matches!(a.action, ActionType::Exit { .. }));
        if !has_exit {
            return Err(TestConfigError::ValidationError(
                "Test configuration must have an Exit action".to_string(),
            ));
        }

        Ok(())
    }
}

impl TestAction {
    /// Get the duration from test start for this action
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}

/// Errors that can occur when loading or validating test configurations
#[derive(Debug, Clone)]
pub enum TestConfigError {
    IoError { path: String, error: String },
    ParseError { path: String, error: String },
    ValidationError(String),
}

impl std::fmt::Display for TestConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestConfigError::IoError { path, error } => {
                write!(f, "Failed to read test config '{}': {}", path, error)
            }
            TestConfigError::ParseError { path, error } => {
                write!(f, "Failed to parse test config '{}': {}", path, error)
            }
            TestConfigError::ValidationError(msg) => {
                write!(f, "Invalid test config: {}", msg)
            }
        }
    }
}

impl std::error::Error for TestConfigError {}
