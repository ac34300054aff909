//! Tech helper service - plain-language tech support for seniors
//!
//! Accepts a question (and an optional screenshot) over HTTP, asks a
//! multimodal chat model for help once, and returns either a short guided fix
//! or a chat answer in a strict JSON shape.

pub mod ai;
pub mod error;
pub mod helper;
pub mod models;
pub mod prompts;
pub mod reply;
pub mod server;

pub use error::{Error, Result};
