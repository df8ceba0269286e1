//! Scripted `MathApi` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::net::MathApi;
use crate::net::types::{ApiError, FeedbackRequest, FeedbackResponse, QueryResponse, RecentConversation, StatsResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Recent(usize),
    Title(String),
    Query(String),
    Feedback(FeedbackRequest),
    Stats,
    Health,
}

/// Each endpoint pops the next scripted result; an empty script fails
/// like an unreachable backend.
#[derive(Default)]
pub struct MockApi {
    recent: Mutex<VecDeque<Result<Vec<RecentConversation>, ApiError>>>,
    titles: Mutex<VecDeque<Result<String, ApiError>>>,
    answers: Mutex<VecDeque<Result<QueryResponse, ApiError>>>,
    feedback: Mutex<VecDeque<Result<FeedbackResponse, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

fn unreachable_backend<T>() -> Result<T, ApiError> {
    Err(ApiError::Request("connection refused".into()))
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recent(self, result: Result<Vec<RecentConversation>, ApiError>) -> Self {
        self.recent.lock().unwrap().push_back(result);
        self
    }

    pub fn with_title(self, result: Result<String, ApiError>) -> Self {
        self.titles.lock().unwrap().push_back(result);
        self
    }

    pub fn with_answer(self, result: Result<QueryResponse, ApiError>) -> Self {
        self.answers.lock().unwrap().push_back(result);
        self
    }

    pub fn with_feedback(self, result: Result<FeedbackResponse, ApiError>) -> Self {
        self.feedback.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn title_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Title(_)))
            .count()
    }

    pub fn feedback_requests(&self) -> Vec<FeedbackRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Feedback(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn query_response(answer: &str, source: &str, confidence: f64, id: i64) -> QueryResponse {
    QueryResponse {
        answer: answer.into(),
        source: Some(source.into()),
        confidence_score: Some(confidence),
        conversation_id: Some(id),
        query: None,
        kb_matches: None,
    }
}

pub fn feedback_ok() -> FeedbackResponse {
    FeedbackResponse { status: "success".into(), message: "Feedback saved".into(), feedback_id: Some(1) }
}

#[async_trait::async_trait]
impl MathApi for MockApi {
    async fn recent_conversations(&self, limit: usize) -> Result<Vec<RecentConversation>, ApiError> {
        self.record(Call::Recent(limit));
        self.recent
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unreachable_backend)
    }

    async fn topic_title(&self, query: &str) -> Result<String, ApiError> {
        self.record(Call::Title(query.to_owned()));
        self.titles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unreachable_backend)
    }

    async fn query(&self, query: &str) -> Result<QueryResponse, ApiError> {
        self.record(Call::Query(query.to_owned()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unreachable_backend)
    }

    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackResponse, ApiError> {
        self.record(Call::Feedback(request.clone()));
        self.feedback
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(unreachable_backend)
    }

    async fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.record(Call::Stats);
        unreachable_backend()
    }

    async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.record(Call::Health);
        Ok(serde_json::json!({ "status": "healthy" }))
    }
}
