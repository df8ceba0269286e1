//! Line-oriented interactive session.
//!
//! DESIGN
//! ======
//! Each input line is either a slash command or a question. Commands map
//! one-to-one onto `ChatController` intents; list numbers are the 1-based
//! positions printed by `render`, so `/open 2` means "the second row of the
//! last `/list`" and `/rm 3` means "message [3] of the open conversation".
//!
//! Confirmation prompts read from the same input as commands, so a scripted
//! session can answer them in-line.

use std::io::{self, BufRead, Write};

use crate::app::{ChatController, Confirm};
use crate::render;
use crate::state::{ConversationId, MessageId, Role};
use crate::state::feedback::valid_rating;

#[cfg(test)]
#[path = "repl_test.rs"]
mod repl_test;

pub const HELP: &str = "\
Type a question to ask it. Commands:
  /new                           start a new conversation
  /list                          list conversations
  /open N                        open conversation N from /list
  /delete N                      delete conversation N from /list
  /rename TITLE                  rename the open conversation
  /rm N                          delete message N of the open conversation
  /clear                         delete all conversations
  /feedback N RATING [CORRECTION] rate answer N (1-5)
  /help                          show this help
  /quit                          exit";

// =============================================================================
// PARSING
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    New,
    List,
    Open(usize),
    Delete(usize),
    Rename(String),
    RemoveMessage(usize),
    Clear,
    Feedback { number: usize, rating: u8, correction: Option<String> },
    Help,
    Quit,
    Empty,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `/{0}`; try /help")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),
    #[error("rating must be between 1 and 5")]
    InvalidRating,
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ReplCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Ask(line.to_owned()));
    };
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => Ok(ReplCommand::New),
        "list" | "ls" => Ok(ReplCommand::List),
        "open" => position(args, "conversation number").map(ReplCommand::Open),
        "delete" => position(args, "conversation number").map(ReplCommand::Delete),
        "rename" => Ok(ReplCommand::Rename(args.to_owned())),
        "rm" => position(args, "message number").map(ReplCommand::RemoveMessage),
        "clear" => Ok(ReplCommand::Clear),
        "feedback" => parse_feedback(args),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        other => Err(ParseError::UnknownCommand(other.to_owned())),
    }
}

fn position(raw: &str, what: &'static str) -> Result<usize, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::MissingArgument(what));
    }
    raw.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ParseError::InvalidNumber(raw.to_owned()))
}

fn parse_feedback(args: &str) -> Result<ReplCommand, ParseError> {
    let (raw_number, rest) = next_word(args);
    let number = position(raw_number, "message number")?;
    let (raw_rating, rest) = next_word(rest);
    if raw_rating.is_empty() {
        return Err(ParseError::MissingArgument("rating"));
    }
    let rating = raw_rating
        .parse::<u8>()
        .map_err(|_| ParseError::InvalidNumber(raw_rating.to_owned()))?;
    if !valid_rating(rating) {
        return Err(ParseError::InvalidRating);
    }
    let correction = Some(rest.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_owned);
    Ok(ReplCommand::Feedback { number, rating, correction })
}

fn next_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

// =============================================================================
// CONFIRMATION
// =============================================================================

/// `[y/N]` prompt over a line reader. End of input counts as "no".
pub struct LinePrompt<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> LinePrompt<'a, R, W> {
    #[must_use]
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LinePrompt<'_, R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ").and_then(|()| self.output.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes" | "Yes" | "YES"),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Repl<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read commands until `/quit` or end of input.
    pub async fn run(&mut self, controller: &mut ChatController) -> io::Result<()> {
        writeln!(self.output, "{HELP}")?;
        if !controller.state().conversations.is_empty() {
            write!(self.output, "{}", render::conversation_list(controller.state()))?;
        }
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            match parse_line(&line) {
                Ok(ReplCommand::Quit) => break,
                Ok(command) => self.execute(controller, command).await?,
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
        Ok(())
    }

    async fn execute(&mut self, controller: &mut ChatController, command: ReplCommand) -> io::Result<()> {
        match command {
            ReplCommand::Empty | ReplCommand::Quit => {}
            ReplCommand::Help => writeln!(self.output, "{HELP}")?,
            ReplCommand::Ask(text) => self.ask(controller, &text).await?,
            ReplCommand::New => {
                controller.new_conversation();
                self.show_active(controller)?;
            }
            ReplCommand::List => {
                let list = render::conversation_list(controller.state());
                writeln!(self.output, "{}", list.trim_end())?;
            }
            ReplCommand::Open(n) => match listed(controller, n) {
                Some(id) => {
                    controller.select(id);
                    self.show_active(controller)?;
                }
                None => writeln!(self.output, "No conversation {n}.")?,
            },
            ReplCommand::Delete(n) => match listed(controller, n) {
                Some(id) => {
                    let mut prompt = LinePrompt::new(&mut self.input, &mut self.output);
                    if controller.delete_conversation(id, &mut prompt) {
                        writeln!(self.output, "Deleted.")?;
                    }
                }
                None => writeln!(self.output, "No conversation {n}.")?,
            },
            ReplCommand::Rename(title) => match controller.state().active_conversation().map(|c| c.id) {
                Some(id) => controller.rename(id, &title),
                None => writeln!(self.output, "{}", render::NO_ACTIVE)?,
            },
            ReplCommand::RemoveMessage(n) => match numbered_message(controller, n) {
                Some((conversation, message)) => {
                    let mut prompt = LinePrompt::new(&mut self.input, &mut self.output);
                    if controller.delete_message(conversation, message, &mut prompt) {
                        writeln!(self.output, "Deleted.")?;
                    }
                }
                None => writeln!(self.output, "No message {n}.")?,
            },
            ReplCommand::Clear => {
                let mut prompt = LinePrompt::new(&mut self.input, &mut self.output);
                if controller.clear_all(&mut prompt) {
                    writeln!(self.output, "All conversations deleted.")?;
                }
            }
            ReplCommand::Feedback { number, rating, correction } => {
                self.feedback(controller, number, rating, correction.as_deref())
                    .await?;
            }
        }
        Ok(())
    }

    async fn ask(&mut self, controller: &mut ChatController, text: &str) -> io::Result<()> {
        let before = controller.state().active_conversation().map(|c| (c.id, c.messages.len()));
        let commands = controller.begin_send(text);
        if commands.is_empty() {
            return Ok(());
        }
        writeln!(self.output, "{}", render::THINKING)?;
        self.output.flush()?;
        controller.run(commands).await;

        let Some(conv) = controller.state().active_conversation() else {
            return Ok(());
        };
        let start = match before {
            Some((id, len)) if id == conv.id => len,
            _ => {
                writeln!(self.output, "== {} ==", conv.title)?;
                0
            }
        };
        for (i, message) in conv.messages.iter().enumerate().skip(start) {
            write!(self.output, "{}", render::message_block(i + 1, message))?;
        }
        Ok(())
    }

    async fn feedback(
        &mut self,
        controller: &mut ChatController,
        number: usize,
        rating: u8,
        correction: Option<&str>,
    ) -> io::Result<()> {
        let target = numbered_message(controller, number).filter(|(conversation, message)| {
            controller
                .state()
                .conversation(*conversation)
                .and_then(|c| c.message(*message))
                .is_some_and(|m| m.role == Role::Assistant)
        });
        let Some((_, message)) = target else {
            return writeln!(self.output, "Message {number} is not an answer.");
        };
        if controller.rate(message, rating, correction).await {
            writeln!(self.output, "Thanks for your feedback.")
        } else {
            if let Some(draft) = controller.state().feedback.as_ref() {
                writeln!(self.output, "{}", render::feedback_panel(draft))?;
            }
            writeln!(self.output, "Feedback could not be submitted; try again.")
        }
    }

    fn show_active(&mut self, controller: &ChatController) -> io::Result<()> {
        let state = controller.state();
        match state.active_conversation() {
            Some(conv) => write!(self.output, "{}", render::transcript(conv, state.is_loading())),
            None => writeln!(self.output, "{}", render::NO_ACTIVE),
        }
    }
}

/// Conversation at 1-based position `n` of the sorted list.
fn listed(controller: &ChatController, n: usize) -> Option<ConversationId> {
    controller
        .state()
        .sorted_conversations()
        .get(n.checked_sub(1)?)
        .map(|c| c.id)
}

/// Message at 1-based position `n` of the active conversation.
fn numbered_message(controller: &ChatController, n: usize) -> Option<(ConversationId, MessageId)> {
    let conv = controller.state().active_conversation()?;
    conv.messages
        .get(n.checked_sub(1)?)
        .map(|m| (conv.id, m.id))
}
