//! Error-explanation assistant.
//!
//! Forwards a learner's message, behind a fixed system directive, to a chat
//! completion service and hands back the assistant's reply. Every request is
//! independent: no conversation is kept between calls.

pub mod error;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use error::AssistError;
pub use openai::OpenAiClient;

/// Reply from the completion service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A message sent upstream. The user's content is forwarded as received,
/// so it may be missing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: Option<String>,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        PromptMessage {
            role: "system",
            content: Some(content.into()),
        }
    }

    pub fn user(content: Option<String>) -> Self {
        PromptMessage {
            role: "user",
            content,
        }
    }
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<ChatMessage, AssistError>;
}

#[derive(Clone)]
pub struct Assistant {
    completion: Arc<dyn ChatCompletion>,
    system_prompt: Arc<str>,
}

impl Assistant {
    pub fn new(completion: Arc<dyn ChatCompletion>, system_prompt: impl Into<String>) -> Assistant {
        Assistant {
            completion,
            system_prompt: system_prompt.into().into(),
        }
    }

    /// One upstream call, no retries.
    pub async fn reply(&self, message: Option<String>) -> Result<ChatMessage, AssistError> {
        let messages = [
            PromptMessage::system(&*self.system_prompt),
            PromptMessage::user(message),
        ];

        self.completion.complete(&messages).await
    }
}
