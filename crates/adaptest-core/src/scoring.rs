//! Session scoring and skill classification.
//!
//! Turns a list of answers into an [`EvaluationResult`]: overall and
//! per-topic percentages, a level, a learning style, and an ordered list of
//! recommendations. Everything here is a pure function of the answers and
//! the bank.

use std::collections::BTreeMap;

use crate::bank::QuestionBank;
use crate::error::EngineError;
use crate::model::{Difficulty, EvaluationResult, LearningStyle, UserAnswer};

/// Average time per answer above which a learner is classed as reflective.
pub const REFLECTIVE_THRESHOLD_MS: u64 = 30_000;
/// Topics scoring below this percentage get their own recommendation.
pub const WEAK_TOPIC_THRESHOLD: u8 = 60;

/// Correct answers counted per difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierTally {
    pub basic: u32,
    pub intermediate: u32,
    pub advanced: u32,
}

impl TierTally {
    pub fn get(&self, tier: Difficulty) -> u32 {
        match tier {
            Difficulty::Basic => self.basic,
            Difficulty::Intermediate => self.intermediate,
            Difficulty::Advanced => self.advanced,
        }
    }

    fn add(&mut self, tier: Difficulty) {
        match tier {
            Difficulty::Basic => self.basic += 1,
            Difficulty::Intermediate => self.intermediate += 1,
            Difficulty::Advanced => self.advanced += 1,
        }
    }
}

/// Correct/total counts for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTally {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
}

/// Raw counts behind a result, topics in first-encountered order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakdown {
    pub correct: u32,
    pub total: u32,
    pub topics: Vec<TopicTally>,
    pub tiers: TierTally,
    pub total_time_ms: u64,
}

/// Count correct answers overall, per topic and per tier.
pub fn tally(answers: &[UserAnswer], bank: &QuestionBank) -> Result<Breakdown, EngineError> {
    if answers.is_empty() {
        return Err(EngineError::EmptyAnswerSet);
    }

    let mut breakdown = Breakdown {
        correct: 0,
        total: 0,
        topics: Vec::new(),
        tiers: TierTally::default(),
        total_time_ms: 0,
    };

    for answer in answers {
        let question = bank
            .get(answer.question_id)
            .ok_or(EngineError::UnknownQuestion(answer.question_id))?;
        let correct = question.is_correct(answer.selected_option);

        breakdown.total += 1;
        breakdown.total_time_ms += answer.time_spent_ms;

        let pos = match breakdown.topics.iter().position(|t| t.topic == question.topic) {
            Some(pos) => pos,
            None => {
                breakdown.topics.push(TopicTally {
                    topic: question.topic.clone(),
                    correct: 0,
                    total: 0,
                });
                breakdown.topics.len() - 1
            }
        };
        let topic = &mut breakdown.topics[pos];
        topic.total += 1;

        if correct {
            breakdown.correct += 1;
            topic.correct += 1;
            breakdown.tiers.add(question.difficulty);
        }
    }

    Ok(breakdown)
}

/// `round(correct / total * 100)`, halves rounding up.
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (correct, total) = (u64::from(correct), u64::from(total));
    // integer form of floor(x + 0.5) keeps results bit-identical across runs
    ((correct * 200 + total) / (total * 2)).min(100) as u8
}

/// Level classification, checked from the top tier down.
pub fn classify_level(tiers: &TierTally, score: u8) -> Difficulty {
    if tiers.advanced >= 2 && score >= 75 {
        Difficulty::Advanced
    } else if tiers.intermediate >= 2 && score >= 60 {
        Difficulty::Intermediate
    } else {
        Difficulty::Basic
    }
}

/// Reflective when the mean time per answer exceeds the threshold.
pub fn learning_style(total_time_ms: u64, answers: u32) -> LearningStyle {
    if answers > 0 && total_time_ms > REFLECTIVE_THRESHOLD_MS * u64::from(answers) {
        LearningStyle::Reflective
    } else {
        LearningStyle::Practical
    }
}

/// Level suggestions, then weak topics in order, then the style suggestion.
pub fn recommendations<'a>(
    level: Difficulty,
    weak_topics: impl IntoIterator<Item = &'a str>,
    style: LearningStyle,
) -> Vec<String> {
    let level_pair: [&str; 2] = match level {
        Difficulty::Basic => [
            "Start with basic Java syntax exercises",
            "Practice declaring and using variables",
        ],
        Difficulty::Intermediate => [
            "Focus on control structures and loops",
            "Practice with arrays and methods",
        ],
        Difficulty::Advanced => [
            "Study design patterns and software architecture",
            "Practice advanced complexity algorithms",
        ],
    };

    let mut out: Vec<String> = level_pair.iter().map(|s| s.to_string()).collect();
    out.extend(
        weak_topics
            .into_iter()
            .map(|topic| format!("Strengthen your knowledge in {topic}")),
    );
    out.push(
        match style {
            LearningStyle::Reflective => "Spend time reading documentation before practicing",
            LearningStyle::Practical => "You learn better by practicing directly with code",
        }
        .to_string(),
    );
    out
}

/// Score a completed session's answers.
pub fn score(answers: &[UserAnswer], bank: &QuestionBank) -> Result<EvaluationResult, EngineError> {
    let breakdown = tally(answers, bank)?;

    let score = percentage(breakdown.correct, breakdown.total);
    let level = classify_level(&breakdown.tiers, score);
    let style = learning_style(breakdown.total_time_ms, breakdown.total);

    let topic_scores: Vec<(&str, u8)> = breakdown
        .topics
        .iter()
        .map(|t| (t.topic.as_str(), percentage(t.correct, t.total)))
        .collect();

    let weak = topic_scores
        .iter()
        .filter(|(_, pct)| *pct < WEAK_TOPIC_THRESHOLD)
        .map(|(topic, _)| *topic);
    let recommendations = recommendations(level, weak, style);

    let topics: BTreeMap<String, u8> = topic_scores
        .iter()
        .map(|(topic, pct)| (topic.to_string(), *pct))
        .collect();

    tracing::debug!(score, level = %level, style = %style, "session scored");

    Ok(EvaluationResult {
        level,
        score,
        topics,
        learning_style: style,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn answer(bank: &QuestionBank, id: u32, correct: bool, time_ms: u64) -> UserAnswer {
        let q: &Question = bank.get(id).unwrap();
        let selected = if correct {
            q.correct_option
        } else {
            (q.correct_option + 1) % q.options.len()
        };
        UserAnswer::new(q, selected, time_ms)
    }

    #[test]
    fn empty_answers_fail() {
        let bank = QuestionBank::builtin();
        assert_eq!(score(&[], &bank).unwrap_err(), EngineError::EmptyAnswerSet);
    }

    #[test]
    fn unknown_question_fails() {
        let bank = QuestionBank::builtin();
        let ghost = UserAnswer {
            question_id: 404,
            selected_option: 0,
            time_spent_ms: 0,
            difficulty: Difficulty::Basic,
        };
        assert_eq!(
            score(&[ghost], &bank).unwrap_err(),
            EngineError::UnknownQuestion(404)
        );
    }

    #[test]
    fn three_correct_basics() {
        let bank = QuestionBank::builtin();
        let answers = vec![
            answer(&bank, 1, true, 4_000),
            answer(&bank, 2, true, 6_000),
            answer(&bank, 3, true, 5_000),
        ];
        let result = score(&answers, &bank).unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.level, Difficulty::Basic);
        assert_eq!(result.learning_style, LearningStyle::Practical);
        assert_eq!(result.topics["Variables"], 100);
        assert_eq!(result.topics["Loops"], 100);
        assert_eq!(
            result.recommendations,
            vec![
                "Start with basic Java syntax exercises",
                "Practice declaring and using variables",
                "You learn better by practicing directly with code",
            ]
        );
    }

    #[test]
    fn advanced_requires_two_advanced_correct_and_75() {
        let bank = QuestionBank::builtin();
        let answers = vec![
            answer(&bank, 1, true, 1_000),
            answer(&bank, 5, true, 1_000),
            answer(&bank, 6, true, 1_000),
            answer(&bank, 3, false, 1_000),
        ];
        let result = score(&answers, &bank).unwrap();
        assert_eq!(result.score, 75);
        assert_eq!(result.level, Difficulty::Advanced);

        let weaker = vec![
            answer(&bank, 5, true, 1_000),
            answer(&bank, 6, true, 1_000),
            answer(&bank, 3, false, 1_000),
        ];
        let result = score(&weaker, &bank).unwrap();
        assert_eq!(result.score, 67);
        assert_eq!(result.level, Difficulty::Basic);
    }

    #[test]
    fn intermediate_level_and_weak_topics_in_order() {
        let bank = QuestionBank::builtin();
        let answers = vec![
            answer(&bank, 5, false, 40_000),
            answer(&bank, 3, true, 40_000),
            answer(&bank, 4, true, 40_000),
            answer(&bank, 1, false, 40_000),
            answer(&bank, 2, true, 40_000),
        ];
        let result = score(&answers, &bank).unwrap();
        assert_eq!(result.score, 60);
        assert_eq!(result.level, Difficulty::Intermediate);
        assert_eq!(result.learning_style, LearningStyle::Reflective);
        assert_eq!(result.topics["Algorithms"], 0);
        assert_eq!(result.topics["Variables"], 50);
        assert_eq!(
            result.recommendations,
            vec![
                "Focus on control structures and loops",
                "Practice with arrays and methods",
                "Strengthen your knowledge in Algorithms",
                "Strengthen your knowledge in Variables",
                "Spend time reading documentation before practicing",
            ]
        );
    }

    #[test]
    fn scoring_is_deterministic() {
        let bank = QuestionBank::builtin();
        let answers = vec![
            answer(&bank, 1, true, 12_345),
            answer(&bank, 3, false, 31_000),
            answer(&bank, 4, true, 9_000),
        ];
        assert_eq!(score(&answers, &bank), score(&answers, &bank));
    }

    #[test]
    fn topic_totals_cover_every_answer() {
        let bank = QuestionBank::builtin();
        let answers = vec![
            answer(&bank, 1, true, 1),
            answer(&bank, 2, false, 1),
            answer(&bank, 4, true, 1),
            answer(&bank, 6, false, 1),
        ];
        let breakdown = tally(&answers, &bank).unwrap();
        let correct: u32 = breakdown.topics.iter().map(|t| t.correct).sum();
        let total: u32 = breakdown.topics.iter().map(|t| t.total).sum();
        assert!(correct <= total);
        assert_eq!(total as usize, answers.len());
        assert_eq!(breakdown.tiers.get(Difficulty::Intermediate), 1);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn style_threshold_is_strict() {
        assert_eq!(learning_style(90_000, 3), LearningStyle::Practical);
        assert_eq!(learning_style(90_001, 3), LearningStyle::Reflective);
    }
}
