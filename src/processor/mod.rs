//! Background processing for the client
//!
//! - `worker`: API calls on a dedicated thread with a tokio runtime
//! - `ticker`: cancellable periodic tasks
//! - `loading`: loading status rotation
//! - `animation`: score counter

pub mod animation;
pub mod loading;
pub mod ticker;
pub mod worker;

pub use animation::{AnimatedScore, ScoreAnimation};
pub use loading::{status_message, LoadingRotation, STATUS_MESSAGES};
pub use ticker::{PeriodicTask, TickControl};
pub use worker::{ApiCommand, ApiEvent, ApiHandle, ApiWorker};
