use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionFuture, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Option<Duration>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request timeout. Without one a request may wait indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "developer",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
            };

            tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "sending completion request");

            let mut request = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body);
            if let Some(timeout) = self.timeout {
                request = request.timeout(timeout);
            }

            let resp = request.send().await?;
            read_completion(resp).await
        })
    }
}

/// Turn an HTTP response from `/chat/completions` into the first choice's text.
///
/// A `null` message content is returned as an empty string.
pub async fn read_completion(resp: reqwest::Response) -> Result<String, LlmError> {
    let status = resp.status();
    if status.as_u16() == 429 {
        return Err(LlmError::RateLimited);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let text = resp.text().await?;
    let parsed: ChatResponse =
        serde_json::from_str(&text).map_err(|e| LlmError::Decode(e.to_string()))?;
    let choice = parsed.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
    Ok(choice.message.content.unwrap_or_default())
}
