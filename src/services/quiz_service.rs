use std::sync::Arc;

use crate::{
    constants::quiz_prompt::{CONTEXT_PLACEHOLDER, QUIZ_SYSTEM_PROMPT},
    errors::{AppError, AppResult},
    services::chat_model::{ChatMessage, ChatModel, TokenStream},
};

pub const QUIZ_TEMPERATURE: f32 = 0.1;

/// Turns a prompt context into a streamed quiz.
pub struct QuizService {
    model: Arc<dyn ChatModel>,
}

impl QuizService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn build_messages(context: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(
            QUIZ_SYSTEM_PROMPT.replacen(CONTEXT_PLACEHOLDER, context, 1),
        )]
    }

    pub async fn generate(&self, context: &str) -> AppResult<TokenStream> {
        if context.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Cannot generate a quiz without any source text".to_string(),
            ));
        }

        log::info!(
            "Generating quiz with {} from {} characters of context",
            self.model.model_name(),
            context.len()
        );
        self.model
            .stream_chat(Self::build_messages(context), QUIZ_TEMPERATURE)
            .await
    }
}
