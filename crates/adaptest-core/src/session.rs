//! Evaluation session state machine.
//!
//! `SessionManager` holds at most one live session, validates and records
//! answers, and decides when the quiz ends:
//!
//! - never before [`MIN_QUESTIONS`] answers,
//! - always at [`MAX_QUESTIONS`] answers,
//! - otherwise when the last [`STABILITY_WINDOW`] answers are all correct or
//!   all incorrect,
//! - or when the bank has no unanswered question left.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::error::EngineError;
use crate::model::{EvaluationSession, Question, TerminationReason, UserAnswer};
use crate::selector::select_next;

/// Answers required before the stability rule applies.
pub const MIN_QUESTIONS: usize = 3;
/// Hard cap on answers per session.
pub const MAX_QUESTIONS: usize = 10;
/// Number of trailing answers the stability rule inspects.
pub const STABILITY_WINDOW: usize = 3;

/// Result of recording one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Question to present next; `None` once the session is completed.
    pub next_question: Option<Question>,
    pub is_completed: bool,
    #[serde(default)]
    pub termination: Option<TerminationReason>,
}

/// Termination policy evaluated after each answer.
pub fn termination(answers: &[UserAnswer], bank: &QuestionBank) -> Option<TerminationReason> {
    if answers.len() >= MAX_QUESTIONS {
        return Some(TerminationReason::MaxQuestions);
    }
    if answers.len() < MIN_QUESTIONS {
        return None;
    }

    let recent = &answers[answers.len() - STABILITY_WINDOW..];
    let correct = recent.iter().filter(|a| bank.is_correct(a)).count();
    if correct == STABILITY_WINDOW {
        Some(TerminationReason::StableCorrect)
    } else if correct == 0 {
        Some(TerminationReason::StableIncorrect)
    } else {
        None
    }
}

/// Owner of the single live evaluation session.
pub struct SessionManager {
    bank: Arc<QuestionBank>,
    current: Option<EvaluationSession>,
}

impl SessionManager {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            current: None,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Start a new session for `user_id`, abandoning any current one.
    pub fn start(&mut self, user_id: &str) -> Result<&EvaluationSession, EngineError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::InvalidUser);
        }

        if let Some(old) = self.current.take() {
            if !old.is_completed() {
                tracing::info!(
                    session_id = old.session_id(),
                    answers = old.answers().len(),
                    "abandoning unfinished session"
                );
            }
        }

        let session = EvaluationSession::new(user_id);
        tracing::info!(session_id = session.session_id(), user_id, "evaluation session started");
        Ok(&*self.current.insert(session))
    }

    /// The session currently held, completed or not.
    pub fn current_session(&self) -> Option<&EvaluationSession> {
        self.current.as_ref()
    }

    /// The question to present first in a fresh session.
    pub fn first_question(&self) -> Option<&Question> {
        let history = self
            .current
            .as_ref()
            .map(|s| s.answers())
            .unwrap_or_default();
        select_next(history, &self.bank)
    }

    /// Record `answer` on the current session and pick the next question.
    pub fn record_answer(&mut self, answer: UserAnswer) -> Result<SubmitOutcome, EngineError> {
        let session = self.current.as_mut().ok_or(EngineError::NoActiveSession)?;
        record(session, answer, &self.bank)
    }

    /// Drop the current session and hand it back to the caller.
    pub fn abandon(&mut self) -> Option<EvaluationSession> {
        self.current.take()
    }
}

fn record(
    session: &mut EvaluationSession,
    answer: UserAnswer,
    bank: &QuestionBank,
) -> Result<SubmitOutcome, EngineError> {
    if session.is_completed() {
        return Err(EngineError::SessionAlreadyCompleted {
            session_id: session.session_id().to_string(),
        });
    }

    let question = bank
        .get(answer.question_id)
        .ok_or(EngineError::UnknownQuestion(answer.question_id))?;
    if answer.selected_option >= question.options.len() {
        return Err(EngineError::InvalidOption {
            question_id: question.id,
            selected: answer.selected_option,
        });
    }
    if session
        .answers()
        .iter()
        .any(|a| a.question_id == answer.question_id)
    {
        return Err(EngineError::DuplicateAnswer(answer.question_id));
    }

    tracing::debug!(
        session_id = session.session_id(),
        question_id = answer.question_id,
        correct = question.is_correct(answer.selected_option),
        "answer recorded"
    );
    session.push_answer(answer);

    let next = match termination(session.answers(), bank) {
        Some(reason) => {
            finish(session, reason);
            None
        }
        None => match select_next(session.answers(), bank) {
            Some(q) => Some(q.clone()),
            None => {
                finish(session, TerminationReason::PoolExhausted);
                None
            }
        },
    };

    Ok(SubmitOutcome {
        is_completed: session.is_completed(),
        termination: session.termination(),
        next_question: next,
    })
}

fn finish(session: &mut EvaluationSession, reason: TerminationReason) {
    session.complete(reason);
    tracing::info!(
        session_id = session.session_id(),
        answers = session.answers().len(),
        reason = ?reason,
        "evaluation session completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Question};

    /// Twelve questions, four per tier, so the cap is reachable.
    fn large_bank() -> Arc<QuestionBank> {
        let questions = (1..=12)
            .map(|id| Question {
                id,
                text: format!("Question {id}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option: 0,
                difficulty: Difficulty::ALL[((id - 1) / 4) as usize],
                topic: format!("Topic {}", id % 3),
            })
            .collect();
        Arc::new(QuestionBank::new(questions).unwrap())
    }

    fn answer_to(q: &Question, correct: bool) -> UserAnswer {
        let selected = if correct {
            q.correct_option
        } else {
            (q.correct_option + 1) % q.options.len()
        };
        UserAnswer::new(q, selected, 2_000)
    }

    /// Drive a session, answering with the given pattern (cycled).
    fn drive(manager: &mut SessionManager, pattern: &[bool]) -> Vec<SubmitOutcome> {
        let mut outcomes = Vec::new();
        let mut next = manager.first_question().cloned();
        let mut i = 0;
        while let Some(q) = next {
            let outcome = manager
                .record_answer(answer_to(&q, pattern[i % pattern.len()]))
                .unwrap();
            next = outcome.next_question.clone();
            outcomes.push(outcome);
            i += 1;
        }
        outcomes
    }

    #[test]
    fn start_requires_user() {
        let mut manager = SessionManager::new(Arc::new(QuestionBank::builtin()));
        assert_eq!(manager.start("  ").unwrap_err(), EngineError::InvalidUser);
        assert!(manager.current_session().is_none());

        let session = manager.start("learner-1").unwrap();
        assert_eq!(session.user_id(), "learner-1");
        assert!(session.answers().is_empty());
        assert!(!session.is_completed());
    }

    #[test]
    fn answers_without_session_are_rejected() {
        let mut manager = SessionManager::new(Arc::new(QuestionBank::builtin()));
        let q = manager.bank().get(1).unwrap().clone();
        assert_eq!(
            manager.record_answer(answer_to(&q, true)).unwrap_err(),
            EngineError::NoActiveSession
        );
    }

    #[test]
    fn never_completes_before_three_answers() {
        for pattern in [[true, true], [false, false], [true, false]] {
            let mut manager = SessionManager::new(large_bank());
            manager.start("learner").unwrap();
            let mut next = manager.first_question().cloned();
            for &correct in &pattern {
                let q = next.unwrap();
                let outcome = manager.record_answer(answer_to(&q, correct)).unwrap();
                assert!(!outcome.is_completed);
                next = outcome.next_question;
            }
        }
    }

    #[test]
    fn three_correct_in_a_row_completes() {
        let mut manager = SessionManager::new(large_bank());
        manager.start("learner").unwrap();
        let outcomes = drive(&mut manager, &[true]);
        assert_eq!(outcomes.len(), 3);
        let last = outcomes.last().unwrap();
        assert!(last.is_completed);
        assert!(last.next_question.is_none());
        assert_eq!(last.termination, Some(TerminationReason::StableCorrect));
    }

    #[test]
    fn three_incorrect_in_a_row_completes() {
        let mut manager = SessionManager::new(large_bank());
        manager.start("learner").unwrap();
        let outcomes = drive(&mut manager, &[false]);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            manager.current_session().unwrap().termination(),
            Some(TerminationReason::StableIncorrect)
        );
    }

    #[test]
    fn alternating_answers_hit_the_cap() {
        let mut manager = SessionManager::new(large_bank());
        manager.start("learner").unwrap();
        let outcomes = drive(&mut manager, &[true, false]);
        assert_eq!(outcomes.len(), MAX_QUESTIONS);
        assert!(outcomes[..MAX_QUESTIONS - 1].iter().all(|o| !o.is_completed));

        let session = manager.current_session().unwrap();
        assert_eq!(session.answers().len(), MAX_QUESTIONS);
        assert!(session.is_completed());
        assert_eq!(session.termination(), Some(TerminationReason::MaxQuestions));
    }

    #[test]
    fn exhausted_pool_completes_the_session() {
        let mut manager = SessionManager::new(Arc::new(QuestionBank::builtin()));
        manager.start("learner").unwrap();
        let outcomes = drive(&mut manager, &[true, false]);
        assert_eq!(outcomes.len(), 6);
        assert_eq!(
            outcomes.last().unwrap().termination,
            Some(TerminationReason::PoolExhausted)
        );
    }

    #[test]
    fn completed_session_rejects_answers() {
        let mut manager = SessionManager::new(large_bank());
        manager.start("learner").unwrap();
        drive(&mut manager, &[true]);

        let q = manager.bank().get(12).unwrap().clone();
        let err = manager.record_answer(answer_to(&q, true)).unwrap_err();
        assert!(matches!(err, EngineError::SessionAlreadyCompleted { .. }));
        assert_eq!(manager.current_session().unwrap().answers().len(), 3);
    }

    #[test]
    fn invalid_answers_leave_session_unchanged() {
        let mut manager = SessionManager::new(Arc::new(QuestionBank::builtin()));
        manager.start("learner").unwrap();
        let q = manager.first_question().unwrap().clone();

        let mut bad = answer_to(&q, true);
        bad.selected_option = 4;
        assert!(matches!(
            manager.record_answer(bad).unwrap_err(),
            EngineError::InvalidOption { selected: 4, .. }
        ));

        let mut ghost = answer_to(&q, true);
        ghost.question_id = 77;
        assert_eq!(
            manager.record_answer(ghost).unwrap_err(),
            EngineError::UnknownQuestion(77)
        );

        manager.record_answer(answer_to(&q, true)).unwrap();
        assert_eq!(
            manager.record_answer(answer_to(&q, false)).unwrap_err(),
            EngineError::DuplicateAnswer(q.id)
        );
        assert_eq!(manager.current_session().unwrap().answers().len(), 1);
    }

    #[test]
    fn restart_replaces_the_session() {
        let mut manager = SessionManager::new(large_bank());
        let first = manager.start("learner").unwrap().session_id().to_string();
        let q = manager.first_question().unwrap().clone();
        manager.record_answer(answer_to(&q, true)).unwrap();

        let second = manager.start("learner").unwrap().session_id().to_string();
        assert_ne!(first, second);
        assert!(manager.current_session().unwrap().answers().is_empty());
        assert!(manager.abandon().is_some());
        assert!(manager.current_session().is_none());
    }

    #[test]
    fn termination_policy_windows() {
        let bank = large_bank();
        let q = |id| bank.get(id).unwrap().clone();
        let answers = vec![
            answer_to(&q(1), true),
            answer_to(&q(2), false),
            answer_to(&q(3), true),
        ];
        assert_eq!(termination(&answers, &bank), None);
        assert_eq!(termination(&answers[..2], &bank), None);

        let mut stable = answers.clone();
        stable.push(answer_to(&q(4), true));
        stable.push(answer_to(&q(5), true));
        assert_eq!(
            termination(&stable, &bank),
            Some(TerminationReason::StableCorrect)
        );
    }
}
