//! UI components and application module
//!
//! This module provides the egui/eframe-based user interface for TasteCheck.

mod app;
pub mod components;
mod state;
mod theme;

pub use app::TasteApp;
pub use state::{AuthForm, AuthTab, PodcastNotice, UiAction, UiState};
pub use theme::Theme;
