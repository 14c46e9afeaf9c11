//! Offline alternative-path provider backed by the local question bank.
//!
//! Replays the selector with the current answer's outcome flipped and
//! reports the question it would have picked instead. Once every question
//! has been answered there is nothing left to offer and it returns no branches.

use std::sync::Arc;

use async_trait::async_trait;

use adaptest_core::model::Question;
use adaptest_core::selector::{pick_unanswered, target_difficulty, Outcome};
use adaptest_core::traits::{AlternativePathProvider, AlternativeRequest};
use adaptest_core::tree::{AlternativePath, Condition, Position};
use adaptest_core::QuestionBank;

use crate::error::ProviderError;

pub struct BankAlternativeProvider {
    bank: Arc<QuestionBank>,
}

impl BankAlternativeProvider {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self { bank }
    }
}

#[async_trait]
impl AlternativePathProvider for BankAlternativeProvider {
    fn name(&self) -> &str {
        "bank"
    }

    async fn alternatives(&self, request: &AlternativeRequest) -> anyhow::Result<Vec<AlternativePath>> {
        let current = request
            .answers
            .iter()
            .rposition(|a| a.question_id == request.current_question_id)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "question {} is not in the answer history",
                    request.current_question_id
                ))
            })?;

        let mut outcomes: Vec<Outcome> = request.answers[..=current]
            .iter()
            .map(|a| Outcome {
                difficulty: a.difficulty,
                correct: a.is_correct,
            })
            .collect();
        let flipped = !outcomes[current].correct;
        outcomes[current].correct = flipped;

        let answered: Vec<u32> = request.answers.iter().map(|a| a.question_id).collect();
        let target = target_difficulty(&outcomes);
        let Some(question) = pick_unanswered(&self.bank, &answered, target) else {
            tracing::debug!(question_id = request.current_question_id, "no unanswered question left for alternative");
            return Ok(Vec::new());
        };

        let condition = if flipped {
            Condition::IfCorrect
        } else {
            Condition::IfIncorrect
        };
        Ok(vec![to_alternative(question, condition)])
    }
}

fn to_alternative(question: &Question, condition: Condition) -> AlternativePath {
    let outcome = match condition {
        Condition::IfCorrect => "correctly",
        Condition::IfIncorrect => "incorrectly",
    };
    AlternativePath {
        question_id: Some(question.id),
        question_text: question.text.clone(),
        difficulty: question.difficulty,
        topic: question.topic.clone(),
        options: question.options.clone(),
        correct_answer: question.correct_option,
        condition,
        explanation: format!(
            "If you had answered {outcome}, the next question would have been this {} {} question.",
            question.difficulty, question.topic
        ),
        would_lead_to: format!("{} path", question.topic),
        position: Position::default(),
    }
}
