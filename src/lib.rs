//! TasteCheck desktop client
//!
//! Collects screenshots or questionnaire answers, sends one analysis request to the
//! TasteCheck service and renders the scored result, with share-card export and
//! podcast audio as optional follow-ups.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod processor;
pub mod session;
pub mod share;
pub mod testconfig;
pub mod ui;

pub use error::{Result, TasteError};
