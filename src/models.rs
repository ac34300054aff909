//! Data models and structures
//!
//! Defines the incoming help request, the prompt payload derived from it, and
//! the service configuration.

use crate::ai::mime::detect_image_mime;
use crate::prompts;
use base64::Engine as _;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DEVICE: &str = "unknown";
const STEP_BY_STEP: &str = "step_by_step";

/// How the user wants to be helped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    StepByStep,
    /// Any other submitted mode, kept verbatim for the prompt.
    Other(String),
}

impl Mode {
    /// Parse a submitted mode; blank input falls back to step-by-step.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == STEP_BY_STEP {
            Mode::StepByStep
        } else {
            Mode::Other(value.to_string())
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::StepByStep => f.write_str(STEP_BY_STEP),
            Mode::Other(mode) => f.write_str(mode),
        }
    }
}

/// An uploaded screenshot.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl Screenshot {
    /// Build a screenshot from an upload, sniffing the type when none was declared.
    pub fn new(bytes: Vec<u8>, declared_type: Option<&str>, file_name: Option<String>) -> Self {
        let mime_type = match declared_type.map(str::trim) {
            Some(t) if !t.is_empty() && t != "application/octet-stream" => t.to_string(),
            _ => detect_image_mime(&bytes).to_string(),
        };

        Self {
            bytes,
            mime_type,
            file_name,
        }
    }

    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }
}

/// One user request, with defaults applied to anything left out.
#[derive(Debug, Clone)]
pub struct HelpRequest {
    pub message: String,
    pub mode: Mode,
    pub device: String,
    pub topic: String,
    pub screenshot: Option<Screenshot>,
}

impl Default for HelpRequest {
    fn default() -> Self {
        Self {
            message: String::new(),
            mode: Mode::default(),
            device: DEFAULT_DEVICE.to_string(),
            topic: String::new(),
            screenshot: None,
        }
    }
}

/// Raw form values as submitted; `None` means the field was absent.
#[derive(Debug, Default)]
pub struct HelpForm {
    pub message: Option<String>,
    pub mode: Option<String>,
    pub device: Option<String>,
    pub topic: Option<String>,
    pub screenshot: Option<Screenshot>,
}

impl From<HelpForm> for HelpRequest {
    fn from(form: HelpForm) -> Self {
        let defaults = HelpRequest::default();
        let or_default = |value: Option<String>, default: String| {
            value.filter(|v| !v.is_empty()).unwrap_or(default)
        };

        Self {
            message: or_default(form.message, defaults.message),
            mode: form.mode.as_deref().map(Mode::parse).unwrap_or_default(),
            device: or_default(form.device, defaults.device),
            topic: or_default(form.topic, defaults.topic),
            screenshot: form.screenshot.filter(|s| !s.bytes.is_empty()),
        }
    }
}

/// Inline image reference sent next to the prompt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data_url: String,
}

/// What gets sent to the provider for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub text: String,
    pub image: Option<InlineImage>,
}

impl PromptPayload {
    pub fn from_request(request: &HelpRequest) -> Self {
        let mode = request.mode.to_string();
        let mut text = prompts::render(
            prompts::HELPER_USER,
            &[
                ("message", &request.message),
                ("device", &request.device),
                ("mode", &mode),
                ("topic", &request.topic),
            ],
        );

        let image = request.screenshot.as_ref().map(|shot| {
            text.push_str("\n\n");
            text.push_str(prompts::SCREENSHOT);
            InlineImage {
                mime_type: shot.mime_type.clone(),
                data_url: shot.data_url(),
            }
        });

        Self { text, image }
    }
}

// Configuration
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = match get("AI_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number("AI_TIMEOUT_SECS", &v)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => parse_number("MAX_UPLOAD_BYTES", &v)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY")
                .ok_or_else(|| crate::Error::Config("OPENAI_API_KEY not set".to_string()))?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout,
            max_upload_bytes,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} must be a number, got '{}'", key, value)))
}
