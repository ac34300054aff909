//! Reply contract shared with the front end.
//!
//! A [`HelpReply`] is either a guided fix or a short chat answer. Provider text
//! only becomes a `HelpReply` through [`HelpReply::parse`], which rejects
//! anything that does not fit one of the two shapes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

pub const MAX_STEPS: usize = 5;
pub const FALLBACK_MESSAGE: &str = "Sorry, something went wrong. Try again?";

const FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HelpReply {
    GuidedFix(GuidedFix),
    Chat { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidedFix {
    pub title: String,
    pub diagnosis: String,
    pub steps: Steps,
    pub followup_question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step: NonZeroU32,
    pub text: String,
}

/// Between one and [`MAX_STEPS`] steps, in the order given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Step>", into = "Vec<Step>")]
pub struct Steps(Vec<Step>);

impl Steps {
    pub fn as_slice(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<Step>> for Steps {
    type Error = String;

    fn try_from(steps: Vec<Step>) -> std::result::Result<Self, Self::Error> {
        if steps.is_empty() || steps.len() > MAX_STEPS {
            return Err(format!(
                "expected 1 to {} steps, got {}",
                MAX_STEPS,
                steps.len()
            ));
        }
        Ok(Self(steps))
    }
}

impl From<Steps> for Vec<Step> {
    fn from(steps: Steps) -> Self {
        steps.0
    }
}

impl HelpReply {
    /// The fixed reply used whenever provider output cannot be trusted.
    pub fn fallback() -> Self {
        HelpReply::Chat {
            message: FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn chat(message: impl Into<String>) -> Self {
        HelpReply::Chat {
            message: message.into(),
        }
    }

    /// Parse raw provider text, tolerating a surrounding code fence.
    ///
    /// Only the shape is checked: tag, required keys, value types and the step
    /// count. Field content is passed through as the provider wrote it.
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned = strip_code_fence(raw);
        serde_json::from_str(cleaned).map_err(|e| {
            Error::InvalidReply(format!("reply does not match either shape: {}", e))
        })
    }
}

/// Remove surrounding code fences and whitespace.
///
/// A fence is a leading ```` ``` ```` (optionally tagged `json`) and a trailing
/// ```` ``` ````. Nested fences are peeled until none remain, so stripping an
/// already stripped text changes nothing.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    loop {
        let stripped = strip_one_fence(text);
        if stripped == text {
            return text;
        }
        text = stripped;
    }
}

fn strip_one_fence(text: &str) -> &str {
    let mut text = text;

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = strip_json_tag(rest).trim_start();
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest.trim_end();
    }

    text
}

/// Drop a `json` language tag, but only when it is a whole word.
fn strip_json_tag(rest: &str) -> &str {
    let Some(tag) = rest.get(..4) else {
        return rest;
    };
    if !tag.eq_ignore_ascii_case("json") {
        return rest;
    }

    let after = &rest[4..];
    match after.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => rest,
        _ => after,
    }
}
