//! Core data model types for adaptest.
//!
//! Questions, answers, sessions and results. Field names on the wire follow
//! the diagnostic backend (`question`, `correct_answer`, `time_spent`).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::error::EngineError;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Difficulty tier of a question: `basic < intermediate < advanced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All tiers, lowest first.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Basic,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    /// One tier harder, saturating at `Advanced`.
    pub fn step_up(self) -> Self {
        match self {
            Difficulty::Basic => Difficulty::Intermediate,
            Difficulty::Intermediate | Difficulty::Advanced => Difficulty::Advanced,
        }
    }

    /// One tier easier, saturating at `Basic`.
    pub fn step_down(self) -> Self {
        match self {
            Difficulty::Advanced => Difficulty::Intermediate,
            Difficulty::Intermediate | Difficulty::Basic => Difficulty::Basic,
        }
    }

    /// Horizontal lane of the tier in a diagnostic tree, counted from the top.
    pub fn lane(self) -> u32 {
        match self {
            Difficulty::Advanced => 1,
            Difficulty::Intermediate => 2,
            Difficulty::Basic => 3,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Basic => write!(f, "basic"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Difficulty::Basic),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A multiple-choice question from the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within a bank.
    pub id: u32,
    /// The question text.
    #[serde(rename = "question")]
    pub text: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    #[serde(rename = "correct_answer")]
    pub correct_option: usize,
    pub difficulty: Difficulty,
    pub topic: String,
}

impl Question {
    pub fn is_correct(&self, selected_option: usize) -> bool {
        selected_option == self.correct_option
    }
}

/// A learner's answer to one presented question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: u32,
    pub selected_option: usize,
    /// Time spent on the question in milliseconds.
    #[serde(rename = "time_spent")]
    pub time_spent_ms: u64,
    pub difficulty: Difficulty,
}

impl UserAnswer {
    /// Answer `question` with the given option.
    pub fn new(question: &Question, selected_option: usize, time_spent_ms: u64) -> Self {
        Self {
            question_id: question.id,
            selected_option,
            time_spent_ms,
            difficulty: question.difficulty,
        }
    }
}

/// Why a session stopped accepting answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The hard cap on questions was reached.
    MaxQuestions,
    /// The last answers were all correct.
    StableCorrect,
    /// The last answers were all incorrect.
    StableIncorrect,
    /// No unanswered question was left in the bank.
    PoolExhausted,
}

/// One run of the adaptive quiz for one learner.
///
/// Only [`SessionManager`](crate::session::SessionManager) mutates a session;
/// everything else reads it through the accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSession {
    session_id: String,
    user_id: String,
    start_time: DateTime<Utc>,
    answers: Vec<UserAnswer>,
    is_completed: bool,
    #[serde(default)]
    termination: Option<TerminationReason>,
}

impl EvaluationSession {
    pub(crate) fn new(user_id: &str) -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            session_id: format!("eval_{}_{}", now.timestamp(), &suffix[..8]),
            user_id: user_id.to_string(),
            start_time: now,
            answers: Vec::new(),
            is_completed: false,
            termination: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Answers in submission order.
    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub(crate) fn push_answer(&mut self, answer: UserAnswer) {
        self.answers.push(answer);
    }

    pub(crate) fn complete(&mut self, reason: TerminationReason) {
        self.is_completed = true;
        self.termination = Some(reason);
    }

    /// Join each answer with its question for post-session review.
    pub fn review(&self, bank: &QuestionBank) -> Result<Vec<AnswerReviewItem>, EngineError> {
        self.answers
            .iter()
            .map(|answer| AnswerReviewItem::from_answer(answer, bank))
            .collect()
    }
}

/// How the learner approaches questions, inferred from answer timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearningStyle {
    Reflective,
    Practical,
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningStyle::Reflective => write!(f, "Reflective"),
            LearningStyle::Practical => write!(f, "Practical"),
        }
    }
}

/// Skill profile derived from a session's answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub level: Difficulty,
    /// Overall percentage of correct answers, 0..=100.
    pub score: u8,
    /// Percentage of correct answers per topic.
    pub topics: BTreeMap<String, u8>,
    pub learning_style: LearningStyle,
    pub recommendations: Vec<String>,
}

/// A scored session as persisted by a result repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub session_id: String,
    pub user_id: String,
    pub result: EvaluationResult,
    pub completed_at: DateTime<Utc>,
}

/// An answer joined with its question, built once the session is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReviewItem {
    pub question: Question,
    pub selected_answer: usize,
    pub is_correct: bool,
    /// Time taken in milliseconds.
    pub time_taken_ms: u64,
}

impl AnswerReviewItem {
    pub fn from_answer(answer: &UserAnswer, bank: &QuestionBank) -> Result<Self, EngineError> {
        let question = bank
            .get(answer.question_id)
            .ok_or(EngineError::UnknownQuestion(answer.question_id))?;
        Ok(Self {
            question: question.clone(),
            selected_answer: answer.selected_option,
            is_correct: question.is_correct(answer.selected_option),
            time_taken_ms: answer.time_spent_ms,
        })
    }
}

/// Answer history entry as exchanged with an alternative-path provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveAnswer {
    pub question_id: u32,
    pub selected_option: usize,
    pub is_correct: bool,
    pub difficulty: Difficulty,
    #[serde(rename = "time_spent")]
    pub time_spent_ms: u64,
}

impl From<&AnswerReviewItem> for AdaptiveAnswer {
    fn from(item: &AnswerReviewItem) -> Self {
        Self {
            question_id: item.question.id,
            selected_option: item.selected_answer,
            is_correct: item.is_correct,
            difficulty: item.question.difficulty,
            time_spent_ms: item.time_taken_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
        assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert_eq!(" basic ".parse::<Difficulty>(), Ok(Difficulty::Basic));
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_steps_saturate() {
        assert_eq!(Difficulty::Basic.step_up(), Difficulty::Intermediate);
        assert_eq!(Difficulty::Intermediate.step_up(), Difficulty::Advanced);
        assert_eq!(Difficulty::Advanced.step_up(), Difficulty::Advanced);
        assert_eq!(Difficulty::Advanced.step_down(), Difficulty::Intermediate);
        assert_eq!(Difficulty::Basic.step_down(), Difficulty::Basic);
    }

    #[test]
    fn lanes_put_advanced_on_top() {
        assert!(Difficulty::Advanced.lane() < Difficulty::Intermediate.lane());
        assert!(Difficulty::Intermediate.lane() < Difficulty::Basic.lane());
    }

    #[test]
    fn question_uses_backend_field_names() {
        let json = serde_json::json!({
            "id": 6,
            "question": "Which design pattern ensures a class has only one instance?",
            "options": ["Factory", "Observer", "Singleton", "Strategy"],
            "correct_answer": 2,
            "difficulty": "advanced",
            "topic": "Design Patterns"
        });
        let question: Question = serde_json::from_value(json).unwrap();
        assert_eq!(question.correct_option, 2);
        assert_eq!(question.difficulty, Difficulty::Advanced);
        assert!(question.is_correct(2));
        assert!(!question.is_correct(0));
    }

    #[test]
    fn session_ids_are_unique_and_prefixed() {
        let a = EvaluationSession::new("learner");
        let b = EvaluationSession::new("learner");
        assert!(a.session_id().starts_with("eval_"));
        assert_ne!(a.session_id(), b.session_id());
        assert!(!a.is_completed());
        assert!(a.answers().is_empty());
    }

    #[test]
    fn result_record_survives_json() {
        let record = ResultRecord {
            session_id: "eval_1_abcdef01".into(),
            user_id: "learner".into(),
            result: EvaluationResult {
                level: Difficulty::Intermediate,
                score: 67,
                topics: BTreeMap::from([("Loops".to_string(), 50), ("Variables".to_string(), 100)]),
                learning_style: LearningStyle::Reflective,
                recommendations: vec!["Focus on control structures and loops".into()],
            },
            completed_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"learning_style\":\"Reflective\""));
        let back: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
