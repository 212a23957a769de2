//! Client for the MusicOnTheGo practice endpoints

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;

const GENERIC_SAVE_ERROR: &str = "Failed to save practice session";

/// Body of a practice-session submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionRequest {
    pub minutes: u64,
    pub focus: String,
    pub notes: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Subset of the practice stats the timer cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
    #[serde(default)]
    pub weekly_goal: Option<u32>,
}

/// Remote operations the timer depends on
pub trait PracticeApi: Send + Sync {
    fn fetch_stats(&self) -> BoxFuture<'_, Result<PracticeStats, ApiError>>;

    fn submit_session(
        &self,
        session: PracticeSessionRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, ApiError>>;
}

/// HTTP implementation of [`PracticeApi`].
///
/// Created once by the application root; the bearer token is injected and
/// can be swapped when the user signs in or out.
#[derive(Debug)]
pub struct HttpPracticeApi {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpPracticeApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            token: RwLock::new(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Use `token` for subsequent requests
    pub fn connect(&self, token: String) {
        if let Ok(mut current) = self.token.write() {
            *current = Some(token);
            info!("Practice API token updated");
        }
    }

    /// Drop the current token
    pub fn disconnect(&self) {
        if let Ok(mut current) = self.token.write() {
            *current = None;
            info!("Practice API token cleared");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().ok().and_then(|t| t.clone()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_stats(&self) -> Result<PracticeStats, ApiError> {
        let url = self.url("/practice-sessions/stats");
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = check_status(response, "Failed to load practice stats").await?;
        Ok(response.json::<PracticeStats>().await?)
    }

    async fn post_session(&self, session: PracticeSessionRequest) -> Result<serde_json::Value, ApiError> {
        let url = self.url("/practice-sessions");
        debug!("POST {} ({} min, focus={})", url, session.minutes, session.focus);

        let response = self
            .authorize(self.client.post(&url))
            .json(&session)
            .send()
            .await?;
        let response = check_status(response, GENERIC_SAVE_ERROR).await?;

        // The created session is not needed by the timer
        let created = response.json().await.unwrap_or(serde_json::Value::Null);
        info!("Practice session saved: {} min", session.minutes);
        Ok(created)
    }
}

impl PracticeApi for HttpPracticeApi {
    fn fetch_stats(&self) -> BoxFuture<'_, Result<PracticeStats, ApiError>> {
        Box::pin(self.get_stats())
    }

    fn submit_session(
        &self,
        session: PracticeSessionRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, ApiError>> {
        Box::pin(self.post_session(session))
    }
}

/// Turn a non-success response into [`ApiError::Server`] carrying the
/// server-provided message when there is one.
async fn check_status(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = server_message(&body).unwrap_or_else(|| fallback.to_string());
    warn!("Practice API returned {}: {}", status, message);

    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Extract `message` or `error` from a JSON error body
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
