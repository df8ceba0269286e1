//! Plain-text rendering of store state for the terminal front end.
//!
//! Every function returns a `String`; nothing here writes to stdout, so the
//! output can be asserted on directly.

use std::fmt::Write as _;

use time::OffsetDateTime;

use crate::net::types::StatsResponse;
use crate::state::{ChatState, Conversation, FeedbackDraft, Message, Role, Source};

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

pub const EMPTY_LIST: &str = "No conversations yet.";
pub const EMPTY_TRANSCRIPT: &str = "Ask a math question to get started.";
pub const NO_ACTIVE: &str = "No conversation selected. Type a question or /new.";
pub const THINKING: &str = "Thinking...";

/// Label for answers whose source is missing or unrecognised.
pub const DEFAULT_SOURCE_LABEL: &str = "AI Generated";

/// Human label for an answer's provenance.
#[must_use]
pub fn source_label(source: &Source) -> &'static str {
    match source {
        Source::KnowledgeBase => "Knowledge Base",
        Source::WebSearch => "Web Search",
        Source::Other(_) => DEFAULT_SOURCE_LABEL,
    }
}

/// `"95% confidence"`, or nothing for a missing or non-positive score.
/// Halves round up.
#[must_use]
pub fn confidence_label(confidence: Option<f64>) -> Option<String> {
    confidence
        .filter(|c| *c > 0.0)
        .map(|c| format!("{:.0}% confidence", (c * 100.0).round()))
}

/// `YYYY-MM-DD`.
#[must_use]
pub fn date(at: OffsetDateTime) -> String {
    format!("{:04}-{:02}-{:02}", at.year(), u8::from(at.month()), at.day())
}

/// `HH:MM`.
#[must_use]
pub fn clock(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

/// Numbered conversation list, newest first. The active one is starred.
#[must_use]
pub fn conversation_list(state: &ChatState) -> String {
    let list = state.sorted_conversations();
    if list.is_empty() {
        return EMPTY_LIST.to_owned();
    }
    let mut out = String::new();
    for (i, conv) in list.iter().enumerate() {
        let marker = if state.active == Some(conv.id) { '*' } else { ' ' };
        let _ = writeln!(out, "{marker}{:>3}. {}  ({})", i + 1, conv.title, date(conv.created_at));
    }
    out
}

/// Header plus numbered messages. Numbers are the 1-based positions used by
/// `/rm` and `/feedback`.
#[must_use]
pub fn transcript(conv: &Conversation, loading: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", conv.title);
    if conv.messages.is_empty() && !loading {
        let _ = writeln!(out, "{EMPTY_TRANSCRIPT}");
        return out;
    }
    for (i, message) in conv.messages.iter().enumerate() {
        out.push_str(&message_block(i + 1, message));
    }
    if loading {
        let _ = writeln!(out, "{THINKING}");
    }
    out
}

/// One message, numbered by its 1-based position in the conversation.
#[must_use]
pub fn message_block(number: usize, message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::Error => "Error",
    };
    let mut out = format!("[{number}] {speaker} ({})\n", clock(message.timestamp));
    for line in message.content.lines() {
        let _ = writeln!(out, "    {line}");
    }
    if message.role == Role::Assistant {
        let label = message
            .source
            .as_ref()
            .map_or(DEFAULT_SOURCE_LABEL, source_label);
        match confidence_label(message.confidence) {
            Some(confidence) => {
                let _ = writeln!(out, "    -- {label} | {confidence}");
            }
            None => {
                let _ = writeln!(out, "    -- {label}");
            }
        }
    }
    out
}

/// One-line summary of an open feedback panel.
#[must_use]
pub fn feedback_panel(draft: &FeedbackDraft) -> String {
    let stars = draft.rating.map_or_else(|| "unrated".to_owned(), |r| {
        let filled = usize::from(r);
        format!("{}{}", "*".repeat(filled), ".".repeat(5usize.saturating_sub(filled)))
    });
    let mut out = format!("Feedback for {}: {stars}", draft.message);
    if !draft.correction.trim().is_empty() {
        let _ = write!(out, " | correction: {}", draft.correction);
    }
    if draft.submitting {
        out.push_str(" (submitting)");
    }
    out
}

/// Backend statistics report. Map-valued sections are sorted by key.
#[must_use]
pub fn stats_report(stats: &StatsResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Conversations: {}", stats.total_conversations);
    let _ = writeln!(out, "Feedback:      {}", stats.total_feedback);
    match stats.avg_rating {
        Some(avg) => {
            let _ = writeln!(out, "Avg rating:    {avg:.2}");
        }
        None => {
            let _ = writeln!(out, "Avg rating:    n/a");
        }
    }

    if !stats.source_distribution.is_empty() {
        let _ = writeln!(out, "Sources:");
        let mut rows: Vec<_> = stats.source_distribution.iter().collect();
        rows.sort();
        for (source, count) in rows {
            let label = source_label(&Source::parse(source));
            let confidence = stats
                .avg_confidence_by_source
                .get(source)
                .and_then(|c| confidence_label(Some(*c)))
                .map(|c| format!(", avg {c}"))
                .unwrap_or_default();
            let _ = writeln!(out, "  {label}: {count}{confidence}");
        }
    }
    out
}

/// Pretty-printed health payload.
#[must_use]
pub fn health_report(body: &serde_json::Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
