//! Collaborator trait definitions.
//!
//! The engine talks to the outside world only through these async traits.
//! Implementations live in `adaptest-providers` (HTTP backend, bank-backed
//! alternatives) and in [`crate::repository`] (result storage).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{AdaptiveAnswer, Question, ResultRecord};
use crate::tree::AlternativePath;

// ---------------------------------------------------------------------------
// Alternative paths
// ---------------------------------------------------------------------------

/// Source of counterfactual branches for a diagnostic tree.
#[async_trait]
pub trait AlternativePathProvider: Send + Sync {
    /// Human-readable provider name (e.g. "http").
    fn name(&self) -> &str;

    /// Alternatives for the last question of `request.answers`.
    async fn alternatives(&self, request: &AlternativeRequest) -> anyhow::Result<Vec<AlternativePath>>;
}

/// Request for the branches that would have followed a different outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeRequest {
    /// Answer history up to and including the current question.
    pub answers: Vec<AdaptiveAnswer>,
    /// The question the alternatives branch from.
    pub current_question_id: u32,
}

impl AlternativeRequest {
    /// The answer to the current question, if present in the history.
    pub fn current(&self) -> Option<&AdaptiveAnswer> {
        self.answers
            .iter()
            .rev()
            .find(|a| a.question_id == self.current_question_id)
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Source of the question catalog.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn questions(&self) -> anyhow::Result<Vec<Question>>;
}

/// Storage for scored sessions.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Persist a scored session. Saving the same session twice overwrites it.
    async fn save(&self, record: &ResultRecord) -> anyhow::Result<()>;

    /// All saved results for a user, oldest first.
    async fn history(&self, user_id: &str) -> anyhow::Result<Vec<ResultRecord>>;
}
