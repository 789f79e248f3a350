//! Property-based tests for session state
//!
//! These tests verify the transcript and guard invariants across arbitrary
//! operation sequences.

use super::*;
use crate::llm::ChatModel;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Append(Role, String),
    Acquire,
    Release,
    Feedback(String),
    Rating(u8),
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::Assistant),
        Just(Role::System),
        Just(Role::Rating),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_role(), "[a-zA-Z .]{0,30}").prop_map(|(r, c)| Op::Append(r, c)),
        Just(Op::Acquire),
        Just(Op::Release),
        "[a-z ]{0,10}".prop_map(Op::Feedback),
        any::<u8>().prop_map(Op::Rating),
    ]
}

fn controller() -> Arc<SessionController> {
    Arc::new(SessionController::new(
        Credentials::default(),
        ChatModel::default(),
    ))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Appends land in call order with non-decreasing timestamps
    #[test]
    fn prop_transcript_order(ops in proptest::collection::vec(arb_op(), 0..60)) {
        let controller = controller();
        let mut expected = Vec::new();

        for op in &ops {
            if let Op::Append(role, content) = op {
                controller.append_message(*role, content);
                expected.push((*role, content.clone()));
            }
        }

        let transcript = controller.transcript();
        prop_assert_eq!(transcript.len(), expected.len());
        for (message, (role, content)) in transcript.iter().zip(&expected) {
            prop_assert_eq!(message.role, *role);
            prop_assert_eq!(&message.content, content);
        }
        for pair in transcript.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    /// The guard behaves like a single-slot lock under any op sequence
    #[test]
    fn prop_guard_is_exclusive(ops in proptest::collection::vec(arb_op(), 0..60)) {
        let controller = controller();
        let mut permit: Option<PipelinePermit> = None;

        for op in ops {
            match op {
                Op::Acquire => {
                    let acquired = controller.acquire_permit();
                    prop_assert_eq!(acquired.is_some(), permit.is_none());
                    if acquired.is_some() {
                        permit = acquired;
                    }
                }
                Op::Release => {
                    permit = None;
                }
                Op::Feedback(text) => {
                    let before = controller.feedback_log().len();
                    let result = controller.submit_feedback(&text);
                    let after = controller.feedback_log().len();
                    prop_assert_eq!(result.is_ok(), !text.trim().is_empty());
                    prop_assert_eq!(after, before + usize::from(result.is_ok()));
                }
                Op::Rating(value) => {
                    let previous = controller.rating();
                    match controller.submit_rating(value) {
                        Ok(()) => prop_assert_eq!(controller.rating(), Some(value)),
                        Err(_) => prop_assert_eq!(controller.rating(), previous),
                    }
                }
                Op::Append(..) => {}
            }
            prop_assert_eq!(controller.is_response_in_progress(), permit.is_some());
        }
    }
}
