//! OpenAI-compatible chat completions provider.

use super::{
    Backoff, BackoffPolicy, Choice, Completion, CompletionProvider, CompletionRequest, LlmError,
    Usage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Chat completions API provider.
#[derive(Debug)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    backoff: BackoffPolicy,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            backoff: BackoffPolicy::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the rate-limit retry schedule.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    n: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    index: u32,
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

fn into_completion(response: ChatResponse) -> Completion {
    Completion {
        choices: response
            .choices
            .into_iter()
            .map(|c| Choice {
                index: c.index,
                text: c.message.content.unwrap_or_default(),
            })
            .collect(),
        usage: response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default(),
    }
}

fn parse_body(status: u16, body: &str) -> Result<Completion, LlmError> {
    if status != 200 {
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
            return Err(LlmError::ApiError {
                status,
                message: error_response.error.message,
            });
        }
        return Err(LlmError::ApiError {
            status,
            message: body.to_string(),
        });
    }

    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;
    Ok(into_completion(response))
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.input,
                },
            ],
            temperature: request.temperature,
            top_p: request.top_p,
            n: 1,
        };

        let started = Instant::now();
        let mut backoff = Backoff::new(self.backoff.clone());

        loop {
            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after: Option<u64> = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());

                let hint = retry_after.map(Duration::from_secs);
                let Some(delay) = backoff.next_delay_with_hint(started.elapsed(), hint) else {
                    return Err(LlmError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                };

                tracing::warn!(
                    prompt = request.prompt_name,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

            let completion = parse_body(status, &text)?;
            tracing::debug!(
                prompt = request.prompt_name,
                total_tokens = completion.usage.total_tokens,
                choices = completion.choices.len(),
                "completion received"
            );
            return Ok(completion);
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
