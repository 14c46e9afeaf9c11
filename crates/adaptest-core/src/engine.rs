//! Evaluation engine facade.
//!
//! Ties the session manager, scoring, tree builder and result repository
//! together behind one object the application layer can share. The single
//! live session sits behind a mutex that is only held for synchronous work;
//! every await happens with the lock released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::bank::QuestionBank;
use crate::error::EngineError;
use crate::model::{AnswerReviewItem, EvaluationResult, EvaluationSession, Question, ResultRecord, UserAnswer};
use crate::scoring;
use crate::session::{SessionManager, SubmitOutcome};
use crate::traits::ResultRepository;
use crate::tree::{DiagnosticTree, TreeBuilder};

/// The in-process evaluation backend.
pub struct EvaluationEngine {
    sessions: Mutex<SessionManager>,
    trees: TreeBuilder,
    results: Arc<dyn ResultRepository>,
}

impl EvaluationEngine {
    pub fn new(bank: Arc<QuestionBank>, trees: TreeBuilder, results: Arc<dyn ResultRepository>) -> Self {
        Self {
            sessions: Mutex::new(SessionManager::new(bank)),
            trees,
            results,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, SessionManager> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session for `user_id`, replacing any current one.
    pub fn start(&self, user_id: &str) -> Result<EvaluationSession, EngineError> {
        self.sessions().start(user_id).cloned()
    }

    /// Snapshot of the current session.
    pub fn current_session(&self) -> Option<EvaluationSession> {
        self.sessions().current_session().cloned()
    }

    /// The first question to show in the current session.
    pub fn first_question(&self) -> Result<Option<Question>, EngineError> {
        let sessions = self.sessions();
        if sessions.current_session().is_none() {
            return Err(EngineError::NoActiveSession);
        }
        Ok(sessions.first_question().cloned())
    }

    pub fn submit(&self, answer: UserAnswer) -> Result<SubmitOutcome, EngineError> {
        self.sessions().record_answer(answer)
    }

    /// Score the current session's answers.
    pub fn calculate_results(&self) -> Result<EvaluationResult, EngineError> {
        let sessions = self.sessions();
        let session = sessions.current_session().ok_or(EngineError::NoActiveSession)?;
        scoring::score(session.answers(), sessions.bank())
    }

    /// The current session's answers joined with their questions.
    pub fn answer_review(&self) -> Result<Vec<AnswerReviewItem>, EngineError> {
        let sessions = self.sessions();
        let session = sessions.current_session().ok_or(EngineError::NoActiveSession)?;
        session.review(sessions.bank())
    }

    /// Persist `result` against the current session.
    pub async fn save_results(&self, result: &EvaluationResult) -> anyhow::Result<ResultRecord> {
        let record = {
            let sessions = self.sessions();
            let session = sessions.current_session().ok_or(EngineError::NoActiveSession)?;
            ResultRecord {
                session_id: session.session_id().to_string(),
                user_id: session.user_id().to_string(),
                result: result.clone(),
                completed_at: Utc::now(),
            }
        };
        self.results.save(&record).await?;
        tracing::info!(
            session_id = %record.session_id,
            score = record.result.score,
            "results saved"
        );
        Ok(record)
    }

    pub async fn history(&self, user_id: &str) -> anyhow::Result<Vec<ResultRecord>> {
        self.results.history(user_id).await
    }

    /// Build the diagnostic tree for the current session.
    ///
    /// Fails with [`EngineError::StaleSession`] when the session was replaced
    /// while alternatives were being fetched.
    pub async fn build_tree(&self) -> Result<DiagnosticTree, EngineError> {
        let (session_id, review) = {
            let sessions = self.sessions();
            let session = sessions.current_session().ok_or(EngineError::NoActiveSession)?;
            (session.session_id().to_string(), session.review(sessions.bank())?)
        };

        let tree = self.trees.build(&review).await;

        let current = self.current_session().map(|s| s.session_id().to_string());
        if current.as_deref() != Some(session_id.as_str()) {
            tracing::warn!(session_id, "discarding diagnostic tree for replaced session");
            return Err(EngineError::StaleSession { session_id });
        }
        Ok(tree)
    }
}
