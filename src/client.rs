use async_trait::async_trait;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::case_input::CaseInput;
use crate::error::CompletionError;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Exponential backoff between failed attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Runs `op` until it succeeds, fails permanently, or attempts run out.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, CompletionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CompletionError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if attempt >= policy.max_attempts => {
                error!("Exhausted {} attempts: {}", attempt, e);
                return Err(CompletionError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {:.1}s",
                    attempt,
                    policy.max_attempts,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Turns a case into the model's raw answer.
#[async_trait]
pub trait CaseAnalyzer: Send + Sync {
    async fn analyze(&self, case: &CaseInput) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, CompletionError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    settings: CompletionSettings,
    url: String,
}

impl CompletionClient {
    pub fn new(settings: CompletionSettings) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        let url = format!("{}/chat/completions", settings.api_base_url.trim_end_matches('/'));
        Ok(Self { client, settings, url })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        }
    }

    async fn send_once(&self, request: &ChatRequest<'_>) -> Result<String, CompletionError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.settings.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = resp.json().await?;
        response.into_content()
    }
}

#[async_trait]
impl CaseAnalyzer for CompletionClient {
    async fn analyze(&self, case: &CaseInput) -> Result<String, CompletionError> {
        let prompt = build_prompt(case)?;
        let request = self.request(&prompt);

        info!("Calling {} for {} ({})", self.settings.model, case.case_id, case.filename);
        with_retries(&self.settings.retry, |_| self.send_once(&request)).await
    }
}
