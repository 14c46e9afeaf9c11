//! Adaptive next-question selection.
//!
//! The selector walks the difficulty tiers based on the outcome of the last
//! two answers: two correct steps up, two incorrect steps down, anything
//! else stays on the most recent tier.

use crate::bank::QuestionBank;
use crate::model::{Difficulty, Question, UserAnswer};

/// Answers needed before the selector starts adapting.
pub const ADAPT_WINDOW: usize = 2;

/// Outcome of one answered question, as seen by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub difficulty: Difficulty,
    pub correct: bool,
}

impl Outcome {
    /// Resolve an answer against the bank. Unknown questions count as
    /// incorrect at the tier recorded on the answer.
    pub fn of(answer: &UserAnswer, bank: &QuestionBank) -> Self {
        match bank.get(answer.question_id) {
            Some(q) => Self {
                difficulty: q.difficulty,
                correct: q.is_correct(answer.selected_option),
            },
            None => Self {
                difficulty: answer.difficulty,
                correct: false,
            },
        }
    }
}

/// Tier the next question should come from, given outcomes in answer order.
pub fn target_difficulty(outcomes: &[Outcome]) -> Difficulty {
    if outcomes.len() < ADAPT_WINDOW {
        return Difficulty::Basic;
    }

    let recent = &outcomes[outcomes.len() - ADAPT_WINDOW..];
    let last = recent[ADAPT_WINDOW - 1].difficulty;
    let correct = recent.iter().filter(|o| o.correct).count();

    if correct == ADAPT_WINDOW {
        last.step_up()
    } else if correct == 0 {
        last.step_down()
    } else {
        last
    }
}

/// Pick the next question from `bank` that is not in `answered`.
///
/// Prefers the first unanswered question on `target`, then the first
/// unanswered question of any tier. Returns `None` when the pool is empty.
pub fn pick_unanswered<'a>(
    bank: &'a QuestionBank,
    answered: &[u32],
    target: Difficulty,
) -> Option<&'a Question> {
    let remaining = bank
        .questions()
        .iter()
        .filter(|q| !answered.contains(&q.id));

    let mut first_any = None;
    for q in remaining {
        if q.difficulty == target {
            return Some(q);
        }
        first_any.get_or_insert(q);
    }
    first_any
}

/// Select the question to present after `history`.
pub fn select_next<'a>(history: &[UserAnswer], bank: &'a QuestionBank) -> Option<&'a Question> {
    let outcomes: Vec<Outcome> = history.iter().map(|a| Outcome::of(a, bank)).collect();
    let target = target_difficulty(&outcomes);
    let answered: Vec<u32> = history.iter().map(|a| a.question_id).collect();

    let next = pick_unanswered(bank, &answered, target);
    match next {
        Some(q) => tracing::debug!(
            target_tier = %target,
            question_id = q.id,
            tier = %q.difficulty,
            "selected next question"
        ),
        None => tracing::debug!(target_tier = %target, "question pool exhausted"),
    }
    next
}
