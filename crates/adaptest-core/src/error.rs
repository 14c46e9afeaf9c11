//! Engine error types.
//!
//! `EngineError` covers contract violations of the session, scoring and tree
//! operations. `BankError` covers malformed question catalogs and is raised
//! when a `QuestionBank` is constructed.

use thiserror::Error;

/// Errors raised by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A session was started without a user identity.
    #[error("invalid user: a non-empty user id is required")]
    InvalidUser,

    /// An answer was submitted after the session terminated.
    #[error("session {session_id} is already completed")]
    SessionAlreadyCompleted { session_id: String },

    /// Scoring was attempted on a session with no answers.
    #[error("cannot score an empty answer set")]
    EmptyAnswerSet,

    /// The alternative-path provider failed while building a tree.
    ///
    /// Recovered locally by the fallback generator; only ever logged.
    #[error("alternative path provider unavailable: {0}")]
    AlternativeProviderUnavailable(String),

    /// An operation needed a live session but none was started.
    #[error("no active evaluation session")]
    NoActiveSession,

    /// An answer or review referred to a question the bank does not hold.
    #[error("unknown question id {0}")]
    UnknownQuestion(u32),

    /// The selected option index is outside the question's options.
    #[error("option {selected} is out of range for question {question_id}")]
    InvalidOption { question_id: u32, selected: usize },

    /// The question was already answered in this session.
    #[error("question {0} was already answered in this session")]
    DuplicateAnswer(u32),

    /// A response arrived for a session that has since been replaced.
    #[error("session {session_id} was replaced before the response arrived")]
    StaleSession { session_id: String },
}

/// Errors raised while building a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("question bank has no questions")]
    Empty,

    #[error("duplicate question id {0}")]
    DuplicateId(u32),

    #[error("question {id} has {found} options, expected {expected}")]
    OptionCount {
        id: u32,
        found: usize,
        expected: usize,
    },

    #[error("question {id} marks option {index} correct but has only {len} options")]
    CorrectOutOfRange { id: u32, index: usize, len: usize },

    #[error("question {id} has an empty {field}")]
    EmptyField { id: u32, field: &'static str },
}

impl EngineError {
    /// Returns `true` if the caller can recover by retrying with different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidUser
                | EngineError::AlternativeProviderUnavailable(_)
                | EngineError::StaleSession { .. }
        )
    }
}
