//! AI provider integration
//!
//! The helper talks to its completion provider only through [`ChatService`].
//! The OpenAI chat-completions client is the production implementation;
//! [`MockChatClient`] stands in for it in tests.

pub mod mime;
pub mod mock;
pub mod openai;

pub use mock::MockChatClient;
pub use openai::OpenAiChatClient;

use crate::models::PromptPayload;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send one prompt to the provider and return its raw text reply.
    async fn complete(&self, payload: &PromptPayload) -> Result<String>;
}
