//! Mock alternative-path provider for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use adaptest_core::traits::{AlternativePathProvider, AlternativeRequest};
use adaptest_core::tree::{AlternativePath, Condition, Position};

use crate::error::ProviderError;

/// A provider that answers from memory, optionally failing for chosen
/// questions.
///
/// Each request gets one branch at the current answer's tier, with the
/// condition opposite to what actually happened.
pub struct MockAlternativeProvider {
    fail_on: HashSet<u32>,
    call_count: AtomicU32,
    last_request: Mutex<Option<AlternativeRequest>>,
}

impl MockAlternativeProvider {
    pub fn new() -> Self {
        Self::failing_on([])
    }

    /// Fail every request whose current question is in `question_ids`.
    pub fn failing_on(question_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            fail_on: question_ids.into_iter().collect(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<AlternativeRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockAlternativeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlternativePathProvider for MockAlternativeProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn alternatives(&self, request: &AlternativeRequest) -> anyhow::Result<Vec<AlternativePath>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(request.clone());

        let id = request.current_question_id;
        if self.fail_on.contains(&id) {
            return Err(ProviderError::ApiError {
                status: 503,
                message: format!("mock failure for question {id}"),
            }
            .into());
        }

        let Some(current) = request.current() else {
            return Ok(Vec::new());
        };
        Ok(vec![AlternativePath {
            question_id: Some(1_000 + id),
            question_text: format!("Mock alternative for question {id}"),
            difficulty: current.difficulty,
            topic: "Mock".into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: 0,
            condition: if current.is_correct {
                Condition::IfIncorrect
            } else {
                Condition::IfCorrect
            },
            explanation: "mock".into(),
            would_lead_to: "mock path".into(),
            position: Position::default(),
        }])
    }
}
