use super::*;

fn submission(rating: u8) -> FeedbackSubmission {
    FeedbackSubmission {
        query: "q".into(),
        answer: "a".into(),
        rating,
        correction: None,
        conversation_id: None,
    }
}

#[test]
fn is_correct_from_four_up() {
    assert!(!submission(1).is_correct());
    assert!(!submission(3).is_correct());
    assert!(submission(4).is_correct());
    assert!(submission(5).is_correct());
}

#[test]
fn valid_rating_bounds() {
    assert!(!valid_rating(0));
    assert!(valid_rating(1));
    assert!(valid_rating(5));
    assert!(!valid_rating(6));
}

#[test]
fn normalize_correction_blank_is_none() {
    assert_eq!(normalize_correction(""), None);
    assert_eq!(normalize_correction("  \n"), None);
    assert_eq!(normalize_correction("x = 4, not 5"), Some("x = 4, not 5".into()));
}

#[test]
fn new_draft_is_empty() {
    let draft = FeedbackDraft::new(ConversationId::Local(1), MessageId(3));
    assert!(draft.rating.is_none());
    assert!(draft.correction.is_empty());
    assert!(!draft.submitting);
}
