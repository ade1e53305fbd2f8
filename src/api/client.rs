//! HTTP client for the TasteCheck service
//!
//! `TasteService` is the seam between the controller and the network. The
//! production implementation uses reqwest; tests substitute an in-memory service.

use crate::api::auth::{AuthAction, AuthErrorBody, AuthReply, Credentials, UserStatus};
use crate::api::payload::{AnalysisRequest, AnalysisResponse, AudioRequest, AudioResponse};
use crate::config::ClientConfig;
use crate::{Result, TasteError};
use std::future::Future;
use tracing::{debug, warn};

/// Remote operations the client depends on
pub trait TasteService: Send + Sync + 'static {
    /// `POST /analyze`; any non-success status is a transport error
    fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<AnalysisResponse>> + Send;

    /// `POST /generate_audio`
    fn generate_audio(&self, dialogue: &str) -> impl Future<Output = Result<AudioResponse>> + Send;

    /// `GET /user/status`
    fn user_status(&self) -> impl Future<Output = Result<UserStatus>> + Send;

    /// `POST /login` or `POST /register`
    fn authenticate(
        &self,
        action: AuthAction,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthReply>> + Send;

    /// `POST /logout`
    fn logout(&self) -> impl Future<Output = Result<()>> + Send;
}

/// reqwest-backed service talking to the configured server
#[derive(Clone, Debug)]
pub struct HttpTasteService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTasteService {
    /// Create a client for the configured server
    ///
    /// Only the connect phase has a deadline; an accepted request may take as long
    /// as the server needs.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| TasteError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a non-success status into a transport error
fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!("Request to {} failed with status {}", response.url(), status);
        Err(TasteError::TransportError(format!(
            "server returned {}",
            status
        )))
    }
}

impl TasteService for HttpTasteService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        debug!(
            "POST /analyze mode={} style={} images={}",
            request.mode,
            request.style,
            request.images.as_ref().map_or(0, Vec::len)
        );
        let response = self
            .client
            .post(self.url("/analyze"))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json::<AnalysisResponse>().await?)
    }

    async fn generate_audio(&self, dialogue: &str) -> Result<AudioResponse> {
        debug!("POST /generate_audio ({} chars)", dialogue.len());
        let body = AudioRequest {
            dialogue: dialogue.to_string(),
        };
        let response = self
            .client
            .post(self.url("/generate_audio"))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json::<AudioResponse>().await?)
    }

    async fn user_status(&self) -> Result<UserStatus> {
        let response = self.client.get(self.url("/user/status")).send().await?;
        let response = ensure_success(response)?;
        Ok(response.json::<UserStatus>().await?)
    }

    async fn authenticate(&self, action: AuthAction, credentials: &Credentials) -> Result<AuthReply> {
        let path = match action {
            AuthAction::Login => "/login",
            AuthAction::Register => "/register",
        };
        let response = self
            .client
            .post(self.url(path))
            .json(credentials)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(AuthReply::Accepted);
        }
        // Rejections carry an optional `error` field; an unreadable body falls back
        let body = response.json::<AuthErrorBody>().await.unwrap_or_default();
        Ok(AuthReply::rejected(action, body))
    }

    async fn logout(&self) -> Result<()> {
        let response = self.client.post(self.url("/logout")).send().await?;
        ensure_success(response)?;
        Ok(())
    }
}
