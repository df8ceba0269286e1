//! Client-side conversation state.
//!
//! DESIGN
//! ======
//! `conversation` holds the records, `feedback` the rating panel, and
//! `chat` the store plus its reducer. None of these modules touch the
//! network; effects leave the reducer as `Command` values.

pub mod chat;
pub mod conversation;
pub mod feedback;

pub use chat::{Action, ChatState, Command};
pub use conversation::{Answer, Conversation, ConversationId, HistoryEntry, Message, MessageId, Role, Source};
pub use feedback::{FeedbackDraft, FeedbackSubmission};
