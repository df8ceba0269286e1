//! Chat controller: owns the store and runs its commands.
//!
//! DESIGN
//! ======
//! The presentation layer talks only to `ChatController`. Every intent
//! becomes an [`Action`] for the reducer; the [`Command`]s it returns run
//! concurrently against the backend, and each result is folded back as soon
//! as it arrives. A slow title request therefore never holds back the
//! answer.
//!
//! Destructive intents go through a [`Confirm`] gate first. A declined
//! prompt leaves the state untouched.

pub mod effects;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use time::OffsetDateTime;
use tracing::debug;

use crate::net::MathApi;
use crate::state::{Action, ChatState, Command, ConversationId, MessageId};


pub const CONFIRM_DELETE_CONVERSATION: &str = "Delete this conversation?";
pub const CONFIRM_DELETE_MESSAGE: &str = "Delete this message?";
pub const CONFIRM_CLEAR_ALL: &str = "Delete all conversations? This cannot be undone.";

/// Blocking yes/no prompt for destructive actions.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct ChatController {
    state: ChatState,
    api: Arc<dyn MathApi>,
    recent_limit: usize,
}

impl ChatController {
    #[must_use]
    pub fn new(api: Arc<dyn MathApi>, recent_limit: usize) -> Self {
        Self { state: ChatState::new(), api, recent_limit }
    }

    #[must_use]
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Feed one action through the reducer.
    pub fn dispatch(&mut self, action: Action) -> Vec<Command> {
        if let Action::AnswerReceived { conversation, .. } | Action::AnswerFailed { conversation, .. } = &action {
            if self.state.conversation(*conversation).is_none() {
                debug!(%conversation, "answer arrived for a deleted conversation; dropping");
            }
        }
        let state = std::mem::take(&mut self.state);
        let (next, commands) = state.reduce(action);
        self.state = next;
        commands
    }

    /// Execute one command without touching the store.
    pub async fn perform(&self, command: Command) -> Action {
        effects::perform(self.api.as_ref(), command).await
    }

    /// Execute commands concurrently, folding each result in as it lands,
    /// until nothing is left in flight.
    pub async fn run(&mut self, commands: Vec<Command>) {
        let api = Arc::clone(&self.api);
        let mut in_flight: FuturesUnordered<_> = commands
            .into_iter()
            .map(|command| effects::perform(api.as_ref(), command))
            .collect();
        while let Some(action) = in_flight.next().await {
            for command in self.dispatch(action) {
                in_flight.push(effects::perform(api.as_ref(), command));
            }
        }
    }

    // =========================================================================
    // CONVERSATIONS
    // =========================================================================

    /// Merge the backend's recent history into the store.
    pub async fn load_recent(&mut self) {
        self.run(vec![Command::LoadHistory { limit: self.recent_limit }])
            .await;
    }

    /// Start an empty conversation and make it active.
    pub fn new_conversation(&mut self) -> Option<ConversationId> {
        self.dispatch(Action::NewConversation { at: OffsetDateTime::now_utc() });
        self.state.active
    }

    pub fn select(&mut self, conversation: ConversationId) {
        self.dispatch(Action::Select(conversation));
    }

    pub fn rename(&mut self, conversation: ConversationId, title: &str) {
        self.dispatch(Action::Rename { conversation, title: title.to_owned() });
    }

    /// Returns `true` if the conversation was deleted.
    pub fn delete_conversation(&mut self, conversation: ConversationId, confirm: &mut impl Confirm) -> bool {
        if !confirm.confirm(CONFIRM_DELETE_CONVERSATION) {
            return false;
        }
        self.dispatch(Action::DeleteConversation(conversation));
        true
    }

    /// Returns `true` if the message was deleted.
    pub fn delete_message(
        &mut self,
        conversation: ConversationId,
        message: MessageId,
        confirm: &mut impl Confirm,
    ) -> bool {
        if !confirm.confirm(CONFIRM_DELETE_MESSAGE) {
            return false;
        }
        self.dispatch(Action::DeleteMessage { conversation, message });
        true
    }

    /// Returns `true` if the store was cleared.
    pub fn clear_all(&mut self, confirm: &mut impl Confirm) -> bool {
        if !confirm.confirm(CONFIRM_CLEAR_ALL) {
            return false;
        }
        self.dispatch(Action::ClearAll);
        true
    }

    // =========================================================================
    // SEND
    // =========================================================================

    /// Append the user message and return the requests it needs, without
    /// running them. Lets callers keep several sends in flight.
    pub fn begin_send(&mut self, text: &str) -> Vec<Command> {
        self.dispatch(Action::Send { text: text.to_owned(), at: OffsetDateTime::now_utc() })
    }

    /// Send a question and wait for the title and answer to settle. Never
    /// fails: backend errors end up in the transcript.
    pub async fn send_message(&mut self, text: &str) {
        let commands = self.begin_send(text);
        self.run(commands).await;
    }

    // =========================================================================
    // FEEDBACK
    // =========================================================================

    /// Open the feedback panel for an assistant message. Returns `false` if
    /// no such answer exists.
    pub fn open_feedback(&mut self, message: MessageId) -> bool {
        let Some((conversation, _)) = self.state.locate_message(message) else {
            return false;
        };
        self.dispatch(Action::OpenFeedback { conversation, message });
        self.state
            .feedback
            .as_ref()
            .is_some_and(|d| d.message == message)
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.dispatch(Action::SetRating(rating));
    }

    pub fn set_correction(&mut self, correction: &str) {
        self.dispatch(Action::SetCorrection(correction.to_owned()));
    }

    pub fn cancel_feedback(&mut self) {
        self.dispatch(Action::CancelFeedback);
    }

    /// Submit the open feedback panel. Returns `true` once the backend has
    /// accepted it and the panel is closed; on failure the panel stays open.
    pub async fn submit_feedback(&mut self) -> bool {
        let Some(message) = self.state.feedback.as_ref().map(|d| d.message) else {
            return false;
        };
        let commands = self.dispatch(Action::SubmitFeedback);
        if commands.is_empty() {
            return false;
        }
        self.run(commands).await;
        !self
            .state
            .feedback
            .as_ref()
            .is_some_and(|d| d.message == message)
    }

    /// Rate an answer in one step: open, fill in, and submit the panel.
    pub async fn rate(&mut self, message: MessageId, rating: u8, correction: Option<&str>) -> bool {
        if !self.open_feedback(message) {
            return false;
        }
        self.set_rating(rating);
        self.set_correction(correction.unwrap_or_default());
        self.submit_feedback().await
    }
}
