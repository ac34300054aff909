//! Request handling core: prompt the provider once and normalize its reply.

use crate::ai::ChatService;
use crate::models::{HelpRequest, PromptPayload};
use crate::reply::HelpReply;
use crate::Result;
use tracing::{error, info, warn};

/// Result of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The provider produced a reply that fits the contract.
    Answered(HelpReply),
    /// Something failed; the caller gets the fallback reply.
    Fallback,
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback)
    }

    pub fn into_reply(self) -> HelpReply {
        match self {
            Outcome::Answered(reply) => reply,
            Outcome::Fallback => HelpReply::fallback(),
        }
    }
}

pub struct Helper {
    chat: Box<dyn ChatService>,
}

impl Helper {
    pub fn new(chat: Box<dyn ChatService>) -> Self {
        Self { chat }
    }

    /// Ask the provider once and validate what comes back.
    pub async fn answer(&self, request: &HelpRequest) -> Result<HelpReply> {
        let payload = PromptPayload::from_request(request);
        let raw = self.chat.complete(&payload).await?;

        HelpReply::parse(&raw).inspect_err(|e| {
            warn!("Provider reply did not match the reply contract: {}\nRaw: {}", e, raw);
        })
    }

    /// Like [`Helper::answer`], but every failure ends in [`Outcome::Fallback`].
    pub async fn handle(&self, request: HelpRequest) -> Outcome {
        info!(
            mode = %request.mode,
            device = %request.device,
            topic = %request.topic,
            has_screenshot = request.screenshot.is_some(),
            "Handling help request"
        );

        match self.answer(&request).await {
            Ok(reply) => Outcome::Answered(reply),
            Err(e) => {
                error!("Falling back to default reply: {}", e);
                Outcome::Fallback
            }
        }
    }
}
