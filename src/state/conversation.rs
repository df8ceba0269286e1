//! Conversation and message records.
//!
//! DESIGN
//! ======
//! Identifiers come from the store's monotonic counter, never from the
//! wall clock, so two messages created in the same instant cannot collide.
//! Assistant messages remember the id of the user message that prompted
//! them; feedback pairing does not depend on sequence position.

use std::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[cfg(test)]
#[path = "conversation_test.rs"]
mod conversation_test;

pub const NEW_CONVERSATION_TITLE: &str = "New conversation";
pub const PENDING_TITLE: &str = "Loading...";
pub const ANSWER_FAILED_TEXT: &str = "Failed to get response. Please check if the backend is running.";

const FALLBACK_TITLE_WORDS: usize = 7;
const HISTORY_TITLE_CHARS: usize = 50;
const ELLIPSIS: &str = "...";

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Conversation key. `Local` ids are allocated in-session; `Remote` ids are
/// the backend's persisted record ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationId {
    Local(u64),
    Remote(i64),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(n) => write!(f, "local-{n}"),
            Self::Remote(n) => write!(f, "remote-{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

// =============================================================================
// MESSAGE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// Provenance tag on an assistant answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    KnowledgeBase,
    WebSearch,
    Other(String),
}

impl Source {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "knowledge_base" => Self::KnowledgeBase,
            "web_search" => Self::WebSearch,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Wire spelling, as the backend sent it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::WebSearch => "web_search",
            Self::Other(raw) => raw,
        }
    }
}

/// Answer payload folded into the store when a query succeeds.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub content: String,
    pub source: Option<Source>,
    pub confidence: Option<f64>,
    pub backend_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: OffsetDateTime,
    pub source: Option<Source>,
    pub confidence: Option<f64>,
    /// Backend record id; set on assistant messages only.
    pub backend_id: Option<i64>,
    /// The user message this answer responds to.
    pub prompt: Option<MessageId>,
}

impl Message {
    #[must_use]
    pub fn user(id: MessageId, content: String, timestamp: OffsetDateTime) -> Self {
        Self {
            id,
            role: Role::User,
            content,
            timestamp,
            source: None,
            confidence: None,
            backend_id: None,
            prompt: None,
        }
    }

    #[must_use]
    pub fn assistant(id: MessageId, answer: Answer, prompt: MessageId, timestamp: OffsetDateTime) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: answer.content,
            timestamp,
            source: answer.source,
            confidence: answer.confidence,
            backend_id: answer.backend_id,
            prompt: Some(prompt),
        }
    }

    #[must_use]
    pub fn error(id: MessageId, timestamp: OffsetDateTime) -> Self {
        Self {
            id,
            role: Role::Error,
            content: ANSWER_FAILED_TEXT.to_owned(),
            timestamp,
            source: None,
            confidence: None,
            backend_id: None,
            prompt: None,
        }
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub created_at: OffsetDateTime,
    pub messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new(id: ConversationId, title: &str, created_at: OffsetDateTime) -> Self {
        Self { id, title: title.to_owned(), created_at, messages: Vec::new() }
    }

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// One persisted question/answer pair, already converted from wire form.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub backend_id: i64,
    pub query: String,
    pub answer: String,
    pub source: Option<Source>,
    pub confidence: Option<f64>,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// TITLES
// =============================================================================

/// Title used when the backend cannot supply one: the first seven
/// whitespace-separated words joined by single spaces, then `...`.
#[must_use]
pub fn fallback_title(question: &str) -> String {
    let words: Vec<&str> = question.split_whitespace().take(FALLBACK_TITLE_WORDS).collect();
    format!("{}{ELLIPSIS}", words.join(" "))
}

/// Title for a conversation seeded from history: the query cut to 50
/// characters, with `...` only when something was cut.
#[must_use]
pub fn history_title(query: &str) -> String {
    let mut chars = query.chars();
    let head: String = chars.by_ref().take(HISTORY_TITLE_CHARS).collect();
    if chars.next().is_some() { format!("{head}{ELLIPSIS}") } else { head }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Parse a backend timestamp. Accepts RFC 3339 as well as the offset-less
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS[.ffffff]` forms, which are
/// taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    let naive = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ];
    naive
        .iter()
        .find_map(|fmt| time::PrimitiveDateTime::parse(raw, *fmt).ok())
        .map(time::PrimitiveDateTime::assume_utc)
}
