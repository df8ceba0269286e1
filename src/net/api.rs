//! REST client for the math assistant backend.
//!
//! DESIGN
//! ======
//! `MathApi` is the seam between the conversation controller and the
//! network so tests can substitute a scripted backend. `HttpMathApi` is the
//! reqwest implementation. Every call is fire-and-await: no retries, and no
//! timeout beyond the transport default unless the config sets one.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    ApiError, FeedbackRequest, FeedbackResponse, QueryRequest, QueryResponse, RecentConversation,
    RecentConversationsResponse, StatsResponse, TopicTitleResponse,
};
use crate::config::ClientConfig;

pub const RECENT_PATH: &str = "/api/conversations/recent";
pub const TOPIC_TITLE_PATH: &str = "/api/topic-title";
pub const QUERY_PATH: &str = "/api/query";
pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const STATS_PATH: &str = "/api/stats";
pub const HEALTH_PATH: &str = "/api/health";

// =============================================================================
// TRAIT
// =============================================================================

/// Backend operations used by the chat client. Enables mocking in tests.
#[async_trait::async_trait]
pub trait MathApi: Send + Sync {
    /// Fetch up to `limit` persisted question/answer pairs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a
    /// malformed body.
    async fn recent_conversations(&self, limit: usize) -> Result<Vec<RecentConversation>, ApiError>;

    /// Ask the backend for a short topic title for `query`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on any failure, including an empty title.
    async fn topic_title(&self, query: &str) -> Result<String, ApiError>;

    /// Submit a question and wait for the answer.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a
    /// malformed body.
    async fn query(&self, query: &str) -> Result<QueryResponse, ApiError>;

    /// Record a rating (and optional correction) for an answer.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackResponse, ApiError>;

    /// Fetch aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a
    /// malformed body.
    async fn stats(&self) -> Result<StatsResponse, ApiError>;

    /// Fetch the backend health report as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    async fn health(&self) -> Result<serde_json::Value, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpMathApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMathApi {
    /// Build a client for `base_url`. Timeouts left as `None` use the
    /// transport defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if reqwest rejects the settings.
    pub fn new(
        base_url: &str,
        request_timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// Build a client from the resolved client config.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if reqwest rejects the settings.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.timeouts.request, config.timeouts.connect)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, path);
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl MathApi for HttpMathApi {
    async fn recent_conversations(&self, limit: usize) -> Result<Vec<RecentConversation>, ApiError> {
        let body: RecentConversationsResponse = self.get_json(&recent_path(limit)).await?;
        Ok(body.conversations)
    }

    async fn topic_title(&self, query: &str) -> Result<String, ApiError> {
        let body: TopicTitleResponse = self
            .post_json(TOPIC_TITLE_PATH, &QueryRequest { query: query.to_owned() })
            .await?;
        non_empty_title(body)
    }

    async fn query(&self, query: &str) -> Result<QueryResponse, ApiError> {
        self.post_json(QUERY_PATH, &QueryRequest { query: query.to_owned() })
            .await
    }

    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackResponse, ApiError> {
        self.post_json(FEEDBACK_PATH, request).await
    }

    async fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.get_json(STATS_PATH).await
    }

    async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json(HEALTH_PATH).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn recent_path(limit: usize) -> String {
    format!("{RECENT_PATH}?limit={limit}")
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::Response { status: status.as_u16(), body: text });
    }
    parse_body(&text)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn non_empty_title(body: TopicTitleResponse) -> Result<String, ApiError> {
    match body.title {
        Some(title) if !title.trim().is_empty() => Ok(title),
        _ => Err(ApiError::Parse("topic title missing or empty".to_owned())),
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
