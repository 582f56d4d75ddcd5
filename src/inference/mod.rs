// Inference backends
//
// This module hides the model server behind the InferenceClient trait:
// - openai: OpenAI-compatible chat completions (ollama, llama.cpp server, LM Studio)
// - prompt: system instruction and user message construction
// - postprocess: clean-up applied to every successful response

pub mod openai;
pub mod postprocess;
pub mod prompt;

use async_trait::async_trait;
use std::sync::Arc;

pub use postprocess::clean_translation;
pub use prompt::context_window;

use crate::config::{InferenceConfig, TargetLanguage};
use crate::error::{InferenceError, Result};

/// Everything needed to translate one subtitle line
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// The line being translated
    pub text: String,
    /// Surrounding lines, possibly empty
    pub context: Vec<String>,
    pub source_language: String,
    pub target_language: TargetLanguage,
    pub model: String,
}

/// A single-shot translation service. No retries happen behind this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Translate one line, returning cleaned, single-line text
    async fn translate(&self, request: &TranslationRequest) -> std::result::Result<String, InferenceError>;

    /// Model ids offered by the endpoint; empty when it cannot be queried
    async fn list_models(&self) -> Vec<String>;
}

/// Factory for creating inference clients
pub struct InferenceClientFactory;

impl InferenceClientFactory {
    /// Create the default client (OpenAI-compatible chat completions)
    pub fn create_client(config: InferenceConfig) -> Result<Arc<dyn InferenceClient>> {
        Ok(Arc::new(openai::ChatCompletionClient::new(config)?))
    }
}
