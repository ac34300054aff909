use super::client::OpenAiHttpClient;
use super::types::{
    ChatCompletionRequest, ChatMessage, ChatMessageContent, MessagePart, ResponseFormat,
};
use crate::ai::ChatService;
use crate::models::{Config, PromptPayload};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Upper bound on reply length; a guided fix fits well inside it.
pub const MAX_COMPLETION_TOKENS: u32 = 800;
/// Low randomness keeps replies close to the requested JSON shapes.
pub const TEMPERATURE: f32 = 0.3;

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: OpenAiHttpClient::new(api_key, base_url, timeout)?,
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
            config.request_timeout,
        )
    }

    fn build_request(&self, payload: &PromptPayload) -> ChatCompletionRequest {
        let system_message = ChatMessage {
            role: "system".to_string(),
            content: Some(ChatMessageContent::Text(prompts::HELPER_SYSTEM.to_string())),
        };

        let mut parts = vec![MessagePart::text(payload.text.clone())];
        if let Some(image) = &payload.image {
            parts.push(MessagePart::image(image.data_url.clone()));
        }

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Parts(parts)),
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![system_message, user_message],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
            temperature: Some(TEMPERATURE),
            response_format: Some(ResponseFormat::json_object()),
        }
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn complete(&self, payload: &PromptPayload) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            with_image = payload.image.is_some(),
            "Sending chat completion request to OpenAI"
        );

        let request = self.build_request(payload);
        let response = self.http.chat_completion(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No choices in OpenAI response".to_string()))?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            if reason != "stop" {
                tracing::warn!("OpenAI reply finished early: {}", reason);
            }
        }

        match choice.message.content {
            Some(ChatMessageContent::Text(text)) => Ok(text),
            _ => Err(Error::AiProvider("No text content in OpenAI response".to_string())),
        }
    }
}
