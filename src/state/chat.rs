//! Conversation store and its reducer.
//!
//! DESIGN
//! ======
//! `ChatState` is a plain value. Every change goes through
//! [`ChatState::reduce`], which consumes the old snapshot and returns the
//! next one plus the network [`Command`]s the change calls for. The reducer
//! never touches the network or the clock: timestamps arrive inside the
//! action and ids come from the state's own counter, so the same action
//! sequence always produces the same state.
//!
//! Results that arrive for a conversation deleted in the meantime are
//! dropped, but still release their pending slot.

use std::collections::HashMap;

use time::OffsetDateTime;

use super::conversation::{
    Answer, Conversation, ConversationId, HistoryEntry, Message, MessageId, NEW_CONVERSATION_TITLE,
    PENDING_TITLE, Role, history_title,
};
use super::feedback::{FeedbackDraft, FeedbackSubmission, normalize_correction, valid_rating};

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

// =============================================================================
// ACTIONS / COMMANDS
// =============================================================================

/// Everything that can change the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Merge persisted history; one conversation per backend id.
    HistoryLoaded(Vec<HistoryEntry>),
    /// History could not be fetched; the store is left as it was.
    HistoryFailed,
    NewConversation { at: OffsetDateTime },
    Select(ConversationId),
    DeleteConversation(ConversationId),
    DeleteMessage { conversation: ConversationId, message: MessageId },
    ClearAll,
    Rename { conversation: ConversationId, title: String },
    Send { text: String, at: OffsetDateTime },
    TitleResolved { conversation: ConversationId, title: String },
    AnswerReceived { conversation: ConversationId, prompt: MessageId, answer: Answer, at: OffsetDateTime },
    AnswerFailed { conversation: ConversationId, at: OffsetDateTime },
    OpenFeedback { conversation: ConversationId, message: MessageId },
    SetRating(u8),
    SetCorrection(String),
    CancelFeedback,
    SubmitFeedback,
    FeedbackSent { message: MessageId },
    FeedbackFailed { message: MessageId },
}

/// Network effects requested by the reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    LoadHistory { limit: usize },
    FetchTitle { conversation: ConversationId, query: String },
    FetchAnswer { conversation: ConversationId, prompt: MessageId, query: String },
    SubmitFeedback { message: MessageId, submission: FeedbackSubmission },
}

// =============================================================================
// STATE
// =============================================================================

/// The whole client-side chat state.
#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub conversations: HashMap<ConversationId, Conversation>,
    /// May name a conversation that no longer exists; readers treat that as
    /// "nothing active".
    pub active: Option<ConversationId>,
    /// Answer requests in flight.
    pub pending: usize,
    pub feedback: Option<FeedbackDraft>,
    next_id: u64,
}

impl ChatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    #[must_use]
    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.get(&id)
    }

    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.conversations.get(&id))
    }

    /// Conversations newest first; ties broken by id so the order is stable.
    #[must_use]
    pub fn sorted_conversations(&self) -> Vec<&Conversation> {
        let mut list: Vec<&Conversation> = self.conversations.values().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        list
    }

    /// Find the conversation holding `message`.
    #[must_use]
    pub fn locate_message(&self, message: MessageId) -> Option<(ConversationId, &Message)> {
        self.conversations
            .values()
            .find_map(|c| c.message(message).map(|m| (c.id, m)))
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Apply one action, returning the next state and the commands to run.
    #[must_use]
    pub fn reduce(mut self, action: Action) -> (Self, Vec<Command>) {
        let commands = match action {
            Action::HistoryLoaded(entries) => {
                self.merge_history(entries);
                Vec::new()
            }
            Action::HistoryFailed => Vec::new(),
            Action::NewConversation { at } => {
                let id = ConversationId::Local(self.allocate());
                self.conversations
                    .insert(id, Conversation::new(id, NEW_CONVERSATION_TITLE, at));
                self.active = Some(id);
                Vec::new()
            }
            Action::Select(id) => {
                self.active = Some(id);
                Vec::new()
            }
            Action::DeleteConversation(id) => {
                self.conversations.remove(&id);
                if self.active == Some(id) {
                    self.active = None;
                }
                if self.feedback.as_ref().is_some_and(|d| d.conversation == id) {
                    self.feedback = None;
                }
                Vec::new()
            }
            Action::DeleteMessage { conversation, message } => {
                if let Some(thread) = self.conversations.get_mut(&conversation) {
                    thread.messages.retain(|m| m.id != message);
                }
                if self.feedback.as_ref().is_some_and(|d| d.message == message) {
                    self.feedback = None;
                }
                Vec::new()
            }
            Action::ClearAll => {
                self.conversations.clear();
                self.active = None;
                self.feedback = None;
                Vec::new()
            }
            Action::Rename { conversation, title } => {
                if let Some(thread) = self.conversations.get_mut(&conversation) {
                    thread.title = title;
                }
                Vec::new()
            }
            Action::Send { text, at } => self.send(text, at),
            Action::TitleResolved { conversation, title } => {
                if let Some(thread) = self.conversations.get_mut(&conversation) {
                    thread.title = title;
                }
                Vec::new()
            }
            Action::AnswerReceived { conversation, prompt, answer, at } => {
                self.pending = self.pending.saturating_sub(1);
                let id = MessageId(self.allocate());
                if let Some(thread) = self.conversations.get_mut(&conversation) {
                    thread.messages.push(Message::assistant(id, answer, prompt, at));
                }
                Vec::new()
            }
            Action::AnswerFailed { conversation, at } => {
                self.pending = self.pending.saturating_sub(1);
                let id = MessageId(self.allocate());
                if let Some(thread) = self.conversations.get_mut(&conversation) {
                    thread.messages.push(Message::error(id, at));
                }
                Vec::new()
            }
            Action::OpenFeedback { conversation, message } => {
                let is_answer = self
                    .conversation(conversation)
                    .and_then(|c| c.message(message))
                    .is_some_and(|m| m.role == Role::Assistant);
                if is_answer {
                    self.feedback = Some(FeedbackDraft::new(conversation, message));
                }
                Vec::new()
            }
            Action::SetRating(rating) => {
                if let Some(draft) = self.feedback.as_mut().filter(|_| valid_rating(rating)) {
                    draft.rating = Some(rating);
                }
                Vec::new()
            }
            Action::SetCorrection(text) => {
                if let Some(draft) = self.feedback.as_mut() {
                    draft.correction = text;
                }
                Vec::new()
            }
            Action::CancelFeedback => {
                self.feedback = None;
                Vec::new()
            }
            Action::SubmitFeedback => self.submit_feedback(),
            Action::FeedbackSent { message } => {
                if self.feedback.as_ref().is_some_and(|d| d.message == message) {
                    self.feedback = None;
                }
                Vec::new()
            }
            Action::FeedbackFailed { message } => {
                if let Some(draft) = self.feedback.as_mut().filter(|d| d.message == message) {
                    draft.submitting = false;
                }
                Vec::new()
            }
        };
        (self, commands)
    }

    fn merge_history(&mut self, entries: Vec<HistoryEntry>) {
        for entry in entries {
            let id = ConversationId::Remote(entry.backend_id);
            let question = MessageId(self.allocate());
            let answer_id = MessageId(self.allocate());
            let mut thread = Conversation::new(id, &history_title(&entry.query), entry.created_at);
            thread
                .messages
                .push(Message::user(question, entry.query, entry.created_at));
            let answer = Answer {
                content: entry.answer,
                source: entry.source,
                confidence: entry.confidence,
                backend_id: Some(entry.backend_id),
            };
            thread
                .messages
                .push(Message::assistant(answer_id, answer, question, entry.created_at));
            self.conversations.insert(id, thread);
        }
    }

    fn send(&mut self, text: String, at: OffsetDateTime) -> Vec<Command> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let existing = self
            .active
            .filter(|id| self.conversations.contains_key(id));
        let conversation = match existing {
            Some(id) => id,
            None => ConversationId::Local(self.allocate()),
        };
        let prompt = MessageId(self.allocate());

        let thread = self
            .conversations
            .entry(conversation)
            .or_insert_with(|| Conversation::new(conversation, PENDING_TITLE, at));
        let first_message = thread.messages.is_empty();
        thread
            .messages
            .push(Message::user(prompt, text.clone(), at));

        self.active = Some(conversation);
        self.pending += 1;

        let mut commands = Vec::with_capacity(2);
        if first_message {
            commands.push(Command::FetchTitle { conversation, query: text.clone() });
        }
        commands.push(Command::FetchAnswer { conversation, prompt, query: text });
        commands
    }

    fn submit_feedback(&mut self) -> Vec<Command> {
        let Some(draft) = self.feedback.as_ref() else {
            return Vec::new();
        };
        let Some(rating) = draft.rating.filter(|_| !draft.submitting) else {
            return Vec::new();
        };
        let Some(thread) = self.conversations.get(&draft.conversation) else {
            return Vec::new();
        };
        let Some(answer) = thread
            .message(draft.message)
            .filter(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let query = answer
            .prompt
            .and_then(|id| thread.message(id))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let submission = FeedbackSubmission {
            query,
            answer: answer.content.clone(),
            rating,
            correction: normalize_correction(&draft.correction),
            conversation_id: answer.backend_id,
        };
        let message = draft.message;

        if let Some(draft) = self.feedback.as_mut() {
            draft.submitting = true;
        }
        vec![Command::SubmitFeedback { message, submission }]
    }
}
