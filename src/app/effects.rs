//! Command execution: turns reducer commands into backend calls and folds
//! each outcome back into an [`Action`].
//!
//! ERROR HANDLING
//! ==============
//! No failure escapes this module. A title failure becomes the fallback
//! title. A query failure becomes an error message. Feedback and history
//! failures are logged and reported as no-op actions.

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::net::MathApi;
use crate::net::types::{FeedbackRequest, QueryResponse, RecentConversation};
use crate::state::conversation::{fallback_title, parse_timestamp};
use crate::state::{Action, Answer, Command, FeedbackSubmission, HistoryEntry, Source};

#[cfg(test)]
#[path = "effects_test.rs"]
mod effects_test;

/// Run one command against the backend.
pub async fn perform(api: &dyn MathApi, command: Command) -> Action {
    match command {
        Command::LoadHistory { limit } => match api.recent_conversations(limit).await {
            Ok(rows) => {
                info!(count = rows.len(), limit, "loaded conversation history");
                let now = OffsetDateTime::now_utc();
                Action::HistoryLoaded(rows.into_iter().map(|row| history_entry(row, now)).collect())
            }
            Err(e) => {
                warn!(error = %e, "failed to load conversation history");
                Action::HistoryFailed
            }
        },
        Command::FetchTitle { conversation, query } => {
            let title = match api.topic_title(&query).await {
                Ok(title) => title,
                Err(e) => {
                    debug!(error = %e, %conversation, "topic title unavailable; using fallback");
                    fallback_title(&query)
                }
            };
            Action::TitleResolved { conversation, title }
        }
        Command::FetchAnswer { conversation, prompt, query } => {
            let result = api.query(&query).await;
            let at = OffsetDateTime::now_utc();
            match result {
                Ok(response) => Action::AnswerReceived { conversation, prompt, answer: answer(response), at },
                Err(e) => {
                    warn!(error = %e, %conversation, "query failed");
                    Action::AnswerFailed { conversation, at }
                }
            }
        }
        Command::SubmitFeedback { message, submission } => {
            match api.submit_feedback(&feedback_request(submission)).await {
                Ok(response) => {
                    info!(%message, feedback_id = ?response.feedback_id, status = %response.status, "feedback submitted");
                    debug!(message = %response.message, "feedback response");
                    Action::FeedbackSent { message }
                }
                Err(e) => {
                    warn!(error = %e, %message, "feedback submission failed");
                    Action::FeedbackFailed { message }
                }
            }
        }
    }
}

/// Convert a history row. Rows with a missing or unreadable `created_at`
/// are stamped with `fallback`.
pub(crate) fn history_entry(row: RecentConversation, fallback: OffsetDateTime) -> HistoryEntry {
    let created_at = match row.created_at.as_deref().map(parse_timestamp) {
        Some(Some(at)) => at,
        Some(None) => {
            debug!(id = row.id, raw = ?row.created_at, "unreadable history timestamp");
            fallback
        }
        None => fallback,
    };
    HistoryEntry {
        backend_id: row.id,
        query: row.query,
        answer: row.answer,
        source: row.source.as_deref().map(Source::parse),
        confidence: row.confidence_score,
        created_at,
    }
}

pub(crate) fn answer(response: QueryResponse) -> Answer {
    Answer {
        content: response.answer,
        source: response.source.as_deref().map(Source::parse),
        confidence: response.confidence_score,
        backend_id: response.conversation_id,
    }
}

pub(crate) fn feedback_request(submission: FeedbackSubmission) -> FeedbackRequest {
    let is_correct = submission.is_correct();
    FeedbackRequest {
        query: submission.query,
        answer: submission.answer,
        rating: submission.rating,
        is_correct,
        correction: submission.correction,
        notes: None,
        conversation_id: submission.conversation_id,
    }
}
