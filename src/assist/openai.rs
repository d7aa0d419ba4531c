//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{AssistError, ChatCompletion, ChatMessage, PromptMessage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: &str, model: &str) -> OpenAiClient {
        OpenAiClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    #[instrument(skip(self, messages), fields(model = %self.model))]
    async fn complete(&self, messages: &[PromptMessage]) -> Result<ChatMessage, AssistError> {
        let api_key = self.api_key.as_deref().ok_or(AssistError::MissingApiKey)?;

        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let completion: CompletionResponse =
            serde_json::from_str(&body).map_err(|err| AssistError::Malformed(err.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistError::Malformed("no choices in response".to_string()))?;

        Ok(ChatMessage {
            role: choice.message.role,
            content: choice.message.content.unwrap_or_default(),
        })
    }
}
