//! Wire types for the math assistant HTTP API.
//!
//! Field names follow the backend's JSON exactly; nothing here is
//! renamed. Domain conversion happens in `state` and `app`.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend client operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("API request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// HISTORY
// =============================================================================

/// One persisted question/answer pair from `GET /api/conversations/recent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentConversation {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub query: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A `null` or missing text field reads as an empty string, so one damaged
/// row does not sink the whole history response.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope returned by the history endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<RecentConversation>,
}

// =============================================================================
// TITLE / QUERY
// =============================================================================

/// Body for both `POST /api/topic-title` and `POST /api/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicTitleResponse {
    #[serde(default)]
    pub title: Option<String>,
}

/// Answer returned by `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub kb_matches: Option<u32>,
}

// =============================================================================
// FEEDBACK
// =============================================================================

/// Body for `POST /api/feedback`. `correction` and `notes` serialize as
/// explicit `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub query: String,
    pub answer: String,
    pub rating: u8,
    pub is_correct: bool,
    pub correction: Option<String>,
    pub notes: Option<String>,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub feedback_id: Option<i64>,
}

// =============================================================================
// STATS / HEALTH
// =============================================================================

/// Aggregate numbers from `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_conversations: u64,
    pub total_feedback: u64,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub source_distribution: HashMap<String, u64>,
    #[serde(default)]
    pub avg_confidence_by_source: HashMap<String, f64>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
