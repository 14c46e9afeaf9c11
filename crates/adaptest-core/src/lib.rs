//! adaptest-core — Adaptive diagnostic evaluation engine.
//!
//! This crate defines the quiz data model, the adaptive question selector,
//! the session state machine, result scoring, and the diagnostic tree
//! builder that the rest of adaptest builds on.

pub mod bank;
pub mod engine;
pub mod error;
pub mod model;
pub mod repository;
pub mod scoring;
pub mod selector;
pub mod session;
pub mod traits;
pub mod tree;

pub use bank::QuestionBank;
pub use engine::EvaluationEngine;
pub use error::{BankError, EngineError};
pub use model::{Difficulty, EvaluationResult, EvaluationSession, Question, UserAnswer};
pub use session::SessionManager;
pub use tree::{DiagnosticTree, TreeBuilder};
