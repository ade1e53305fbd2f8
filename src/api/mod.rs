//! Remote service contract
//!
//! - `payload`: request assembly and response decoding for analysis and audio
//! - `auth`: login/register/status contract
//! - `client`: the `TasteService` seam and its reqwest implementation

pub mod auth;
pub mod client;
pub mod payload;

pub use auth::{AuthAction, AuthReply, Credentials, UserStatus};
pub use client::{HttpTasteService, TasteService};
pub use payload::{AnalysisRequest, AnalysisResponse, AudioResponse, PreparedAnalysis};
