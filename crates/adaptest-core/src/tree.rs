//! Diagnostic tree construction.
//!
//! A diagnostic tree lays out the questions a learner actually answered as a
//! left-to-right path, one node per answer, with each node sitting in the
//! horizontal lane of its difficulty tier. Every node carries one or more
//! counterfactual branches: the question the learner would have received had
//! the answer gone the other way.
//!
//! Branches come from an [`AlternativePathProvider`]. All per-node requests
//! are issued together and joined; if any of them fails the whole tree is
//! built from the local fallback generator instead, so a tree never mixes
//! provider and fallback branches. A provider that returns no branches for
//! a node counts as failed.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;
use crate::model::{AdaptiveAnswer, AnswerReviewItem, Difficulty};
use crate::traits::{AlternativePathProvider, AlternativeRequest};

/// A point on the tree canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Outcome under which an alternative branch would have been taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    IfCorrect,
    IfIncorrect,
}

/// A hypothetical branch hanging off a tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativePath {
    /// Bank id of the alternative question; `None` for synthesized branches.
    /// Backends mark those with a negative id, which reads as `None`.
    #[serde(default, deserialize_with = "synthesized_as_none")]
    pub question_id: Option<u32>,
    pub question_text: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub condition: Condition,
    pub explanation: String,
    pub would_lead_to: String,
    #[serde(default)]
    pub position: Position,
}

fn synthesized_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<i64>::deserialize(deserializer)? {
        Some(id) if id >= 0 => u32::try_from(id).map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// One answered question on the taken path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTreeNode {
    /// `q1`, `q2`, ... in answer order.
    pub id: String,
    pub question_id: u32,
    pub question_text: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub user_answer: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub time_taken_ms: u64,
    pub position: Position,
    pub alternative_paths: Vec<AlternativePath>,
    /// Answers given before this node.
    pub previous_answers: Vec<AdaptiveAnswer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Taken,
    Alternative,
}

/// Endpoint of a connection, by index into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionTarget {
    Node { node: usize },
    Alternative { node: usize, index: usize },
}

/// An edge between a node and the next node or one of its branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConnection {
    /// Index of the source node.
    pub from: usize,
    pub to: ConnectionTarget,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub is_correct_path: bool,
}

/// Where a tree's branches came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeSource {
    Provider,
    Fallback,
}

/// Geometry constants for laying out a tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeLayout {
    pub node_radius: f64,
    pub level_height: f64,
    pub node_spacing: f64,
    pub padding: f64,
    /// Horizontal offset of branches, as a fraction of `node_spacing`.
    pub alternative_offset: f64,
    /// Radius of branch markers, as a fraction of `node_radius`.
    pub alternative_scale: f64,
    pub min_width: f64,
    pub height: f64,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            node_radius: 30.0,
            level_height: 120.0,
            node_spacing: 180.0,
            padding: 60.0,
            alternative_offset: 0.7,
            alternative_scale: 0.8,
            min_width: 1200.0,
            height: 500.0,
        }
    }
}

impl TreeLayout {
    pub fn lane_y(&self, difficulty: Difficulty) -> f64 {
        self.padding + f64::from(difficulty.lane()) * self.level_height
    }

    pub fn node_position(&self, index: usize, difficulty: Difficulty) -> Position {
        Position {
            x: self.padding + self.node_radius + index as f64 * self.node_spacing,
            y: self.lane_y(difficulty),
        }
    }

    pub fn alternative_position(&self, node_x: f64, difficulty: Difficulty) -> Position {
        Position {
            x: node_x + self.alternative_offset * self.node_spacing,
            y: self.lane_y(difficulty),
        }
    }
}

/// Result of a pointer hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeHit<'a> {
    Node(&'a DiagnosticTreeNode),
    Alternative {
        node: &'a DiagnosticTreeNode,
        path: &'a AlternativePath,
    },
}

/// The taken path plus counterfactual branches, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTree {
    pub nodes: Vec<DiagnosticTreeNode>,
    pub connections: Vec<TreeConnection>,
    pub source: AlternativeSource,
    pub layout: TreeLayout,
}

impl DiagnosticTree {
    pub fn taken_connections(&self) -> usize {
        self.count(ConnectionKind::Taken)
    }

    pub fn alternative_connections(&self) -> usize {
        self.count(ConnectionKind::Alternative)
    }

    fn count(&self, kind: ConnectionKind) -> usize {
        self.connections.iter().filter(|c| c.kind == kind).count()
    }

    /// Find the node or branch under `(x, y)`. Main nodes win over branches.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<TreeHit<'_>> {
        let within = |p: Position, r: f64| (x - p.x).hypot(y - p.y) <= r;

        if let Some(node) = self
            .nodes
            .iter()
            .find(|n| within(n.position, self.layout.node_radius))
        {
            return Some(TreeHit::Node(node));
        }

        let alt_radius = self.layout.node_radius * self.layout.alternative_scale;
        self.nodes.iter().find_map(|node| {
            node.alternative_paths
                .iter()
                .find(|p| within(p.position, alt_radius))
                .map(|path| TreeHit::Alternative { node, path })
        })
    }

    /// Canvas size needed to show every node and branch.
    pub fn canvas_size(&self) -> (f64, f64) {
        let max_x = self
            .nodes
            .iter()
            .flat_map(|n| {
                std::iter::once(n.position.x).chain(n.alternative_paths.iter().map(|p| p.position.x))
            })
            .fold(0.0_f64, f64::max);
        let width = self
            .layout
            .min_width
            .max(max_x + self.layout.node_spacing + self.layout.padding);
        (width, self.layout.height)
    }
}

/// Builds diagnostic trees from answer reviews.
pub struct TreeBuilder {
    provider: Arc<dyn AlternativePathProvider>,
    layout: TreeLayout,
    timeout: Option<Duration>,
}

impl TreeBuilder {
    pub fn new(provider: Arc<dyn AlternativePathProvider>) -> Self {
        Self {
            provider,
            layout: TreeLayout::default(),
            timeout: None,
        }
    }

    pub fn with_layout(mut self, layout: TreeLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Treat a provider call that takes longer than `timeout` as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    /// Build a tree for `review`, one node per item in order.
    pub async fn build(&self, review: &[AnswerReviewItem]) -> DiagnosticTree {
        if review.is_empty() {
            return self.assemble(review, Vec::new(), AlternativeSource::Provider);
        }

        let requests = history_requests(review);
        match try_join_all(requests.iter().map(|r| self.fetch(r))).await {
            Ok(branches) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    nodes = review.len(),
                    "alternative paths resolved"
                );
                self.assemble(review, branches, AlternativeSource::Provider)
            }
            Err(e) => {
                let err = EngineError::AlternativeProviderUnavailable(format!("{e:#}"));
                tracing::warn!(
                    provider = self.provider.name(),
                    "{err}; building tree from local fallback"
                );
                let branches = review.iter().map(fallback_alternatives).collect();
                self.assemble(review, branches, AlternativeSource::Fallback)
            }
        }
    }

    /// Alternatives for one node. An empty list counts as a failure.
    async fn fetch(&self, request: &AlternativeRequest) -> anyhow::Result<Vec<AlternativePath>> {
        let paths = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.provider.alternatives(request))
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "no alternatives for question {} within {}ms",
                        request.current_question_id,
                        limit.as_millis()
                    )
                })??,
            None => self.provider.alternatives(request).await?,
        };
        if paths.is_empty() {
            anyhow::bail!("no alternatives for question {}", request.current_question_id);
        }
        Ok(paths)
    }

    fn assemble(
        &self,
        review: &[AnswerReviewItem],
        branches: Vec<Vec<AlternativePath>>,
        source: AlternativeSource,
    ) -> DiagnosticTree {
        let history: Vec<AdaptiveAnswer> = review.iter().map(AdaptiveAnswer::from).collect();

        let nodes: Vec<DiagnosticTreeNode> = review
            .iter()
            .zip(branches)
            .enumerate()
            .map(|(i, (item, alternatives))| {
                let position = self.layout.node_position(i, item.question.difficulty);
                let alternative_paths = alternatives
                    .into_iter()
                    .map(|mut alt| {
                        alt.position = self.layout.alternative_position(position.x, alt.difficulty);
                        alt
                    })
                    .collect();

                DiagnosticTreeNode {
                    id: format!("q{}", i + 1),
                    question_id: item.question.id,
                    question_text: item.question.text.clone(),
                    difficulty: item.question.difficulty,
                    topic: item.question.topic.clone(),
                    user_answer: item.selected_answer,
                    correct_answer: item.question.correct_option,
                    is_correct: item.is_correct,
                    time_taken_ms: item.time_taken_ms,
                    position,
                    alternative_paths,
                    previous_answers: history[..i].to_vec(),
                }
            })
            .collect();

        let connections = connect(&nodes);
        DiagnosticTree {
            nodes,
            connections,
            source,
            layout: self.layout,
        }
    }
}

/// One request per item, each carrying the history up to and including it.
fn history_requests(review: &[AnswerReviewItem]) -> Vec<AlternativeRequest> {
    let mut history = Vec::with_capacity(review.len());
    review
        .iter()
        .map(|item| {
            history.push(AdaptiveAnswer::from(item));
            AlternativeRequest {
                answers: history.clone(),
                current_question_id: item.question.id,
            }
        })
        .collect()
}

fn connect(nodes: &[DiagnosticTreeNode]) -> Vec<TreeConnection> {
    let mut connections = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if i + 1 < nodes.len() {
            connections.push(TreeConnection {
                from: i,
                to: ConnectionTarget::Node { node: i + 1 },
                kind: ConnectionKind::Taken,
                is_correct_path: node.is_correct,
            });
        }
        for (index, alt) in node.alternative_paths.iter().enumerate() {
            connections.push(TreeConnection {
                from: i,
                to: ConnectionTarget::Alternative { node: i, index },
                kind: ConnectionKind::Alternative,
                is_correct_path: alt.condition == Condition::IfCorrect,
            });
        }
    }
    connections
}

/// Local counterfactual for one answer: one tier down had it been wrong,
/// one tier up had it been right.
pub fn fallback_alternatives(item: &AnswerReviewItem) -> Vec<AlternativePath> {
    let tier = item.question.difficulty;
    let (condition, difficulty, question_text, explanation, would_lead_to) = if item.is_correct {
        let lower = tier.step_down();
        (
            Condition::IfIncorrect,
            lower,
            format!("Alternative {lower} question (if you had answered incorrectly)"),
            "If you had answered incorrectly, you would have received a more basic question to reinforce fundamental concepts.",
            format!("{} concepts reinforcement path", capitalize(lower)),
        )
    } else {
        let higher = tier.step_up();
        (
            Condition::IfCorrect,
            higher,
            format!("Alternative {higher} question (if you had answered correctly)"),
            "If you had answered correctly, you would have moved on to a more challenging question.",
            format!("{} concepts path", capitalize(higher)),
        )
    };

    vec![AlternativePath {
        question_id: None,
        question_text,
        difficulty,
        topic: item.question.topic.clone(),
        options: ["Option A", "Option B", "Option C", "Option D"]
            .iter()
            .map(|o| o.to_string())
            .collect(),
        correct_answer: 0,
        condition,
        explanation: explanation.to_string(),
        would_lead_to,
        position: Position::default(),
    }]
}

fn capitalize(tier: Difficulty) -> String {
    let name = tier.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}
