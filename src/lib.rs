//! Subtrans - batched subtitle translation with a local LLM
//!
//! Translates SRT files line by line against an OpenAI-compatible
//! chat-completion endpoint (such as ollama), several lines at a time,
//! and writes the result next to the source file with timing untouched.

pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod subtitle;
