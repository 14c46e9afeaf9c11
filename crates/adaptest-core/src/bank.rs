//! Immutable question catalog.
//!
//! A `QuestionBank` is validated once at construction and then only read.
//! Banks load from TOML files of `[[questions]]` tables or from any
//! [`QuestionRepository`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BankError;
use crate::model::{Difficulty, Question, UserAnswer, OPTION_COUNT};
use crate::traits::QuestionRepository;

/// Read-only catalog of quiz questions, kept in insertion order.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: HashMap<u32, usize>,
}

impl QuestionBank {
    /// Build a bank, rejecting malformed questions.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        let mut index = HashMap::with_capacity(questions.len());
        for (pos, question) in questions.iter().enumerate() {
            check_question(question)?;
            if index.insert(question.id, pos).is_some() {
                return Err(BankError::DuplicateId(question.id));
            }
        }
        Ok(Self { questions, index })
    }

    /// The default Java-fundamentals diagnostic: two questions per tier.
    pub fn builtin() -> Self {
        let questions = vec![
            question(
                1,
                "What is a variable in programming?",
                [
                    "A value that never changes",
                    "A memory space to store data",
                    "A mathematical function",
                    "A type of loop",
                ],
                1,
                Difficulty::Basic,
                "Variables",
            ),
            question(
                2,
                "What is the correct syntax to declare a variable in Java?",
                ["var x = 5;", "int x = 5;", "variable x = 5;", "declare int x = 5;"],
                1,
                Difficulty::Basic,
                "Variables",
            ),
            question(
                3,
                "What is a 'for' loop in programming?",
                [
                    "A data structure",
                    "A control structure that repeats code",
                    "A mathematical function",
                    "A type of variable",
                ],
                1,
                Difficulty::Intermediate,
                "Loops",
            ),
            question(
                4,
                "What is the difference between '==' and '.equals()' in Java?",
                [
                    "There is no difference",
                    "== compares references, .equals() compares content",
                    "== is faster than .equals()",
                    ".equals() only works with numbers",
                ],
                1,
                Difficulty::Intermediate,
                "Operators",
            ),
            question(
                5,
                "What is time complexity O(n²) in algorithms?",
                [
                    "The algorithm takes constant time",
                    "The time grows quadratically with input size",
                    "The algorithm is linear",
                    "The time cannot be determined",
                ],
                1,
                Difficulty::Advanced,
                "Algorithms",
            ),
            question(
                6,
                "Which design pattern ensures a class has only one instance?",
                ["Factory", "Observer", "Singleton", "Strategy"],
                2,
                Difficulty::Advanced,
                "Design Patterns",
            ),
        ];
        let index = questions
            .iter()
            .enumerate()
            .map(|(pos, q)| (q.id, pos))
            .collect();
        Self { questions, index }
    }

    /// Fetch the catalog from a repository and validate it.
    pub async fn from_repository(repo: &dyn QuestionRepository) -> Result<Self> {
        let questions = repo
            .questions()
            .await
            .context("failed to fetch questions")?;
        Ok(Self::new(questions)?)
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        self.index.get(&id).map(|&pos| &self.questions[pos])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// All questions in bank order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Whether `answer` picks the correct option. Unknown questions count as wrong.
    pub fn is_correct(&self, answer: &UserAnswer) -> bool {
        self.get(answer.question_id)
            .is_some_and(|q| q.is_correct(answer.selected_option))
    }

    /// Number of questions per tier.
    pub fn tier_counts(&self) -> HashMap<Difficulty, usize> {
        let mut counts: HashMap<Difficulty, usize> =
            Difficulty::ALL.iter().map(|&d| (d, 0)).collect();
        for q in &self.questions {
            *counts.entry(q.difficulty).or_default() += 1;
        }
        counts
    }
}

fn question(
    id: u32,
    text: &str,
    options: [&str; OPTION_COUNT],
    correct_option: usize,
    difficulty: Difficulty,
    topic: &str,
) -> Question {
    Question {
        id,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_option,
        difficulty,
        topic: topic.to_string(),
    }
}

fn check_question(q: &Question) -> Result<(), BankError> {
    if q.text.trim().is_empty() {
        return Err(BankError::EmptyField {
            id: q.id,
            field: "text",
        });
    }
    if q.topic.trim().is_empty() {
        return Err(BankError::EmptyField {
            id: q.id,
            field: "topic",
        });
    }
    if q.options.len() != OPTION_COUNT {
        return Err(BankError::OptionCount {
            id: q.id,
            found: q.options.len(),
            expected: OPTION_COUNT,
        });
    }
    if q.correct_option >= q.options.len() {
        return Err(BankError::CorrectOutOfRange {
            id: q.id,
            index: q.correct_option,
            len: q.options.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TOML loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    difficulty: String,
    topic: String,
}

/// Parse a question bank TOML file.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse question bank TOML from a string (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let difficulty: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            Ok(Question {
                id: q.id,
                text: q.question,
                options: q.options,
                correct_option: q.correct_answer,
                difficulty,
                topic: q.topic,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    QuestionBank::new(questions)
        .with_context(|| format!("invalid question bank: {}", source_path.display()))
}

/// A non-fatal issue found while validating a bank.
#[derive(Debug, Clone)]
pub struct BankWarning {
    pub question_id: Option<u32>,
    pub message: String,
}

/// Minimum bank size that lets a session reach the question cap.
pub const RECOMMENDED_BANK_SIZE: usize = 10;

/// Check a bank for problems that do not prevent a quiz from running.
pub fn validate_bank(bank: &QuestionBank) -> Vec<BankWarning> {
    let mut warnings = Vec::new();

    let counts = bank.tier_counts();
    for tier in Difficulty::ALL {
        if counts.get(&tier).copied().unwrap_or(0) == 0 {
            warnings.push(BankWarning {
                question_id: None,
                message: format!("no {tier} questions; the selector will fall back to other tiers"),
            });
        }
    }

    if bank.len() < RECOMMENDED_BANK_SIZE {
        warnings.push(BankWarning {
            question_id: None,
            message: format!(
                "only {} questions; sessions may end by exhausting the pool",
                bank.len()
            ),
        });
    }

    let mut seen = HashSet::new();
    for q in bank.questions() {
        if !seen.insert(q.text.trim().to_lowercase()) {
            warnings.push(BankWarning {
                question_id: Some(q.id),
                message: "duplicate question text".into(),
            });
        }
    }

    warnings
}
