use std::pin::Pin;

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

/// Incremental text delivered by the model.
pub type TokenStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// Hosted chat-completion model that streams its reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> AppResult<TokenStream>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

impl ChatCompletionChunk {
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .filter_map(|c| c.delta.content)
            .collect()
    }
}

/// OpenAI-compatible chat completions endpoint.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(config.openai_api_base.clone());

        Self::new(Client::with_config(openai_config), config.quiz_model.clone())
    }

    pub fn request_body(&self, messages: &[ChatMessage], temperature: f32) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "stream": true,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
    ) -> AppResult<TokenStream> {
        log::info!(
            "Requesting streamed completion from {} ({} message(s), temperature {})",
            self.model,
            messages.len(),
            temperature
        );

        let request = self.request_body(&messages, temperature);
        let stream: Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, OpenAIError>> + Send>> =
            self.client.chat().create_stream_byot(request).await?;

        let tokens = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => {
                    let text = chunk.into_text();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(AppError::from(e))),
            }
        });

        Ok(Box::pin(tokens))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
