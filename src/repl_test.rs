use std::io::Cursor;
use std::sync::Arc;

use super::*;
use crate::app::mock::{MockApi, feedback_ok, query_response};
use crate::net::MathApi;

// =============================================================================
// parse_line
// =============================================================================

#[test]
fn plain_text_is_a_question() {
    assert_eq!(parse_line("  What is 2+2?\n"), Ok(ReplCommand::Ask("What is 2+2?".into())));
    assert_eq!(parse_line("   \n"), Ok(ReplCommand::Empty));
}

#[test]
fn simple_commands() {
    assert_eq!(parse_line("/new"), Ok(ReplCommand::New));
    assert_eq!(parse_line("/list"), Ok(ReplCommand::List));
    assert_eq!(parse_line("/clear"), Ok(ReplCommand::Clear));
    assert_eq!(parse_line("/help"), Ok(ReplCommand::Help));
    assert_eq!(parse_line("/quit"), Ok(ReplCommand::Quit));
    assert_eq!(parse_line("/open 2"), Ok(ReplCommand::Open(2)));
    assert_eq!(parse_line("/delete 1"), Ok(ReplCommand::Delete(1)));
    assert_eq!(parse_line("/rm 3"), Ok(ReplCommand::RemoveMessage(3)));
}

#[test]
fn rename_keeps_spaces_and_allows_empty() {
    assert_eq!(parse_line("/rename Linear  equations "), Ok(ReplCommand::Rename("Linear  equations".into())));
    assert_eq!(parse_line("/rename"), Ok(ReplCommand::Rename(String::new())));
}

#[test]
fn positions_must_be_positive_numbers() {
    assert_eq!(parse_line("/open"), Err(ParseError::MissingArgument("conversation number")));
    assert_eq!(parse_line("/open 0"), Err(ParseError::InvalidNumber("0".into())));
    assert_eq!(parse_line("/rm two"), Err(ParseError::InvalidNumber("two".into())));
}

#[test]
fn feedback_arguments() {
    assert_eq!(
        parse_line("/feedback 2 5"),
        Ok(ReplCommand::Feedback { number: 2, rating: 5, correction: None })
    );
    assert_eq!(
        parse_line("/feedback 2  1   x = 5, not 6 "),
        Ok(ReplCommand::Feedback { number: 2, rating: 1, correction: Some("x = 5, not 6".into()) })
    );
    assert_eq!(parse_line("/feedback 2"), Err(ParseError::MissingArgument("rating")));
    assert_eq!(parse_line("/feedback 2 6"), Err(ParseError::InvalidRating));
    assert_eq!(parse_line("/feedback 2 0"), Err(ParseError::InvalidRating));
    assert_eq!(parse_line("/feedback 2 great"), Err(ParseError::InvalidNumber("great".into())));
}

#[test]
fn unknown_command() {
    assert_eq!(parse_line("/frobnicate now"), Err(ParseError::UnknownCommand("frobnicate".into())));
}

// =============================================================================
// session
// =============================================================================

async fn session(api: MockApi, script: &str) -> (ChatController, Arc<MockApi>, String) {
    let api = Arc::new(api);
    let dyn_api: Arc<dyn MathApi> = api.clone();
    let mut controller = ChatController::new(dyn_api, 50);
    let mut repl = Repl::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
    repl.run(&mut controller).await.expect("in-memory io");
    let out = String::from_utf8(repl.into_output()).expect("utf8 output");
    (controller, api, out)
}

#[tokio::test]
async fn ask_prints_title_and_answer() {
    let api = MockApi::new()
        .with_title(Ok("Linear equations".into()))
        .with_answer(Ok(query_response("x = 5", "knowledge_base", 0.95, 42)));
    let (controller, _api, out) = session(api, "Solve: 2x + 5 = 15\n/quit\n").await;

    assert!(out.contains("== Linear equations =="));
    assert!(out.contains("[1] You"));
    assert!(out.contains("[2] Assistant"));
    assert!(out.contains("-- Knowledge Base | 95% confidence"));
    assert_eq!(controller.state().conversations.len(), 1);
}

#[tokio::test]
async fn delete_reads_confirmation_from_input() {
    let (controller, _api, out) = session(MockApi::new(), "/new\n/delete 1\nn\n/delete 1\ny\n").await;
    assert_eq!(out.matches("Delete this conversation? [y/N]").count(), 2);
    assert_eq!(out.matches("Deleted.").count(), 1);
    assert!(controller.state().conversations.is_empty());
}

#[tokio::test]
async fn clear_declined_at_end_of_input() {
    let (controller, _api, out) = session(MockApi::new(), "/new\n/clear\n").await;
    assert!(out.contains("Delete all conversations? This cannot be undone. [y/N]"));
    assert_eq!(controller.state().conversations.len(), 1);
}

#[tokio::test]
async fn feedback_on_answer_is_submitted() {
    let api = MockApi::new()
        .with_title(Ok("Arithmetic".into()))
        .with_answer(Ok(query_response("4", "knowledge_base", 0.9, 7)))
        .with_feedback(Ok(feedback_ok()));
    let (_controller, api, out) = session(api, "What is 2+2?\n/feedback 1 5\n/feedback 2 5\n").await;

    assert!(out.contains("Message 1 is not an answer."));
    assert!(out.contains("Thanks for your feedback."));
    let sent = api.feedback_requests();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_correct);
}

#[tokio::test]
async fn parse_errors_are_reported_and_session_continues() {
    let (controller, _api, out) = session(MockApi::new(), "/bogus\n/new\n").await;
    assert!(out.contains("unknown command `/bogus`"));
    assert_eq!(controller.state().conversations.len(), 1);
}
