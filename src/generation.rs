//! Text generation: the provider seam, the Gemini HTTP client, and the
//! retry wrapper used for all three curriculum generation steps.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::curriculum::{LearningSequence, LessonForm, ObjectivesAnalysis, SequenceItem};
use crate::error::GenerationError;
use crate::prompt;

/// Message the service returns when the key cannot reach the model.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found.";

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    /// JSON constrained by the given response schema.
    Json(Value),
}

impl ResponseFormat {
    fn mime_type(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text/plain",
            ResponseFormat::Json(_) => "application/json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub format: ResponseFormat,
}

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Retry policy with exponential backoff: the wait after failed attempt `n`
/// is `base_delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt_number` (1-indexed).
    pub fn delay_for(&self, attempt_number: u32) -> Duration {
        if attempt_number == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt_number - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds, fails terminally, or the policy's
/// attempt ceiling is reached. Validation failures count as transient.
/// The operation always runs at least once.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "Generation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(
                    attempt,
                    max = max_attempts,
                    error = %e,
                    "Generation attempt failed"
                );
                last_error = e.to_string();
                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }

    Err(GenerationError::RetriesExhausted {
        attempts: max_attempts,
        last_error,
    })
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build a client from config; the key must be present in the environment.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(api_key).with_base_url(config.base_url.as_str()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams<'a> {
    response_mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let start = Instant::now();

        let schema = match &request.format {
            ResponseFormat::Json(schema) => Some(schema),
            ResponseFormat::Text => None,
        };
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationParams {
                response_mime_type: request.format.mime_type(),
                response_schema: schema,
            },
        };

        debug!(model = %request.model, "Sending request to Gemini");

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if matches!(
                status,
                StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ) || message.contains(ENTITY_NOT_FOUND)
            {
                return Err(GenerationError::InvalidApiKey(message));
            }
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Gemini responded"
        );

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Strip a Markdown code fence wrapped around a whole response.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    Ok(serde_json::from_str(strip_code_fence(text))?)
}

/// Drives the objectives -> sequence -> lesson plan generation chain.
pub struct CurriculumGenerator<G> {
    generator: G,
    model: String,
    policy: RetryPolicy,
}

impl<G: TextGenerator> CurriculumGenerator<G> {
    pub fn new(generator: G, model: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            model: model.into(),
            policy,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generate the learning objectives analysis for every learning outcome.
    pub async fn objectives(&self, form: &LessonForm) -> Result<ObjectivesAnalysis, GenerationError> {
        info!(
            provider = self.generator.name(),
            subject = %form.subject,
            outcomes = form.learning_outcomes.len(),
            "Generating learning objectives"
        );
        let request = self.request(
            prompt::objectives_prompt(form),
            ResponseFormat::Json(prompt::objectives_schema(form.semester)),
        );
        self.generate_json(&request).await
    }

    /// Generate the learning sequence for all objectives of an analysis.
    pub async fn sequence(
        &self,
        form: &LessonForm,
        analysis: &ObjectivesAnalysis,
    ) -> Result<LearningSequence, GenerationError> {
        info!(
            provider = self.generator.name(),
            objectives = analysis.objectives().count(),
            "Generating learning sequence"
        );
        let request = self.request(
            prompt::sequence_prompt(form, analysis),
            ResponseFormat::Json(prompt::sequence_schema()),
        );
        self.generate_json(&request).await
    }

    /// Generate the Markdown lesson plan for one sequence item.
    pub async fn lesson_plan(
        &self,
        form: &LessonForm,
        item: &SequenceItem,
    ) -> Result<String, GenerationError> {
        info!(
            provider = self.generator.name(),
            item = item.no,
            "Generating lesson plan"
        );
        let request = self.request(prompt::lesson_plan_prompt(form, item), ResponseFormat::Text);
        let request = &request;
        with_retry(&self.policy, || async move {
            let text = self.generator.generate(request).await?;
            let text = text.trim();
            if text.is_empty() {
                return Err(GenerationError::EmptyResponse);
            }
            Ok(text.to_string())
        })
        .await
    }

    fn request(&self, prompt: String, format: ResponseFormat) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            prompt,
            format,
        }
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<T, GenerationError> {
        with_retry(&self.policy, || async move {
            let text = self.generator.generate(request).await?;
            parse_json(&text)
        })
        .await
    }
}
