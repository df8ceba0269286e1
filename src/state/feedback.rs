//! Feedback panel state.

use super::conversation::{ConversationId, MessageId};

#[cfg(test)]
#[path = "feedback_test.rs"]
mod feedback_test;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Ratings at or above this count as "correct".
const CORRECT_THRESHOLD: u8 = 4;

/// An open feedback panel for one assistant message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub conversation: ConversationId,
    pub message: MessageId,
    pub rating: Option<u8>,
    pub correction: String,
    pub submitting: bool,
}

impl FeedbackDraft {
    #[must_use]
    pub fn new(conversation: ConversationId, message: MessageId) -> Self {
        Self { conversation, message, rating: None, correction: String::new(), submitting: false }
    }
}

/// Everything needed to post feedback for one answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub query: String,
    pub answer: String,
    pub rating: u8,
    pub correction: Option<String>,
    pub conversation_id: Option<i64>,
}

impl FeedbackSubmission {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.rating >= CORRECT_THRESHOLD
    }
}

#[must_use]
pub fn valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Blank corrections are sent as `null`.
#[must_use]
pub fn normalize_correction(raw: &str) -> Option<String> {
    if raw.trim().is_empty() { None } else { Some(raw.to_owned()) }
}
