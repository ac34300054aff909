//! Error handling and custom error types
//!
//! Provides unified error handling across the service using thiserror. None of
//! these ever reach an HTTP caller: request-time failures are logged and turned
//! into the fallback reply.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    #[error("Multipart form error: {0}")]
    Multipart(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
