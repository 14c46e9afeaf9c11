//! HTTP diagnostic backend.
//!
//! Speaks the backend's JSON contract: `GET {base}/questions` for the
//! catalog and `POST {base}/get-alternative-paths` for counterfactual
//! branches.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use adaptest_core::model::Question;
use adaptest_core::traits::{AlternativePathProvider, AlternativeRequest, QuestionRepository};
use adaptest_core::tree::AlternativePath;

use crate::error::ProviderError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for a remote diagnostic backend.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            anyhow::bail!("backend base_url is empty");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status, message });
        }
        Ok(response)
    }
}

#[derive(Deserialize)]
struct AlternativesResponse {
    alternatives: Vec<AlternativePath>,
}

fn check_alternative(alt: &AlternativePath) -> Result<(), ProviderError> {
    if alt.options.is_empty() {
        return Err(ProviderError::InvalidResponse(format!(
            "alternative '{}' has no options",
            alt.question_text
        )));
    }
    if alt.correct_answer >= alt.options.len() {
        return Err(ProviderError::InvalidResponse(format!(
            "alternative '{}' marks option {} correct but has {} options",
            alt.question_text,
            alt.correct_answer,
            alt.options.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl AlternativePathProvider for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(question_id = request.current_question_id, history = request.answers.len()))]
    async fn alternatives(&self, request: &AlternativeRequest) -> anyhow::Result<Vec<AlternativePath>> {
        let response = self
            .client
            .post(format!("{}/get-alternative-paths", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs, &self.base_url))?;
        let response = self.check(response).await?;

        let body: AlternativesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse alternatives: {e}")))?;

        for alt in &body.alternatives {
            check_alternative(alt)?;
        }
        tracing::debug!(count = body.alternatives.len(), "alternatives received");
        Ok(body.alternatives)
    }
}

#[async_trait]
impl QuestionRepository for HttpBackend {
    #[instrument(skip(self))]
    async fn questions(&self) -> anyhow::Result<Vec<Question>> {
        let response = self
            .client
            .get(format!("{}/questions", self.base_url))
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs, &self.base_url))?;
        let response = self.check(response).await?;

        let questions: Vec<Question> = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse questions: {e}")))?;
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::{AdaptiveAnswer, Difficulty};
    use adaptest_core::tree::Condition;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AlternativeRequest {
        AlternativeRequest {
            answers: vec![AdaptiveAnswer {
                question_id: 3,
                selected_option: 1,
                is_correct: true,
                difficulty: Difficulty::Intermediate,
                time_spent_ms: 8_000,
            }],
            current_question_id: 3,
        }
    }

    #[tokio::test]
    async fn posts_history_and_parses_alternatives() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "alternatives": [{
                "question_id": 1,
                "question_text": "What is a variable in Java?",
                "difficulty": "basic",
                "topic": "Variables",
                "options": ["a", "b", "c", "d"],
                "correct_answer": 1,
                "condition": "if_incorrect",
                "explanation": "If you had answered incorrectly...",
                "would_lead_to": "Basic concepts reinforcement path"
            }]
        });

        Mock::given(method("POST"))
            .and(path("/api/diagnostic/get-alternative-paths"))
            .and(body_partial_json(serde_json::json!({"current_question_id": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&format!("{}/api/diagnostic/", server.uri()), 5).unwrap();
        let alternatives = backend.alternatives(&request()).await.unwrap();
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].question_id, Some(1));
        assert_eq!(alternatives[0].condition, Condition::IfIncorrect);
        assert_eq!(alternatives[0].difficulty, Difficulty::Basic);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/get-alternative-paths"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), 5).unwrap();
        let err = backend.alternatives(&request()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn malformed_alternative_is_rejected() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "alternatives": [{
                "question_text": "broken",
                "difficulty": "advanced",
                "topic": "Algorithms",
                "options": ["a", "b"],
                "correct_answer": 5,
                "condition": "if_correct",
                "explanation": "",
                "would_lead_to": ""
            }]
        });
        Mock::given(method("POST"))
            .and(path("/get-alternative-paths"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), 5).unwrap();
        let err = backend.alternatives(&request()).await.unwrap_err();
        assert!(err.to_string().contains("invalid response"));
    }

    #[tokio::test]
    async fn fetches_question_catalog() {
        let server = MockServer::start().await;

        let body = serde_json::json!([{
            "id": 1,
            "question": "What is a variable in Java?",
            "options": ["A method", "A container", "A class", "A package"],
            "correct_answer": 1,
            "difficulty": "basic",
            "topic": "Variables"
        }]);
        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(&server.uri(), 5).unwrap();
        let questions = backend.questions().await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_option, 1);
        assert_eq!(questions[0].text, "What is a variable in Java?");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(HttpBackend::new("  ", 5).is_err());
    }
}
