// Subtitle translation through a hosted chat-completion API
//
// - Common: prompt template and response cleanup
// - OpenAI: HTTP client for OpenAI-compatible chat-completion endpoints
// - Pipeline: chunking, retries and concurrent fan-out per file

pub mod common;
pub mod openai;
pub mod pipeline;

use async_trait::async_trait;
use std::sync::Arc;

pub use common::*;
pub use pipeline::*;

use crate::config::TranslateConfig;
use crate::error::Result;

/// A single request/response exchange with a chat model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one system and one user message, return the assistant reply
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Factory for creating chat clients
pub struct ChatClientFactory;

impl ChatClientFactory {
    /// Create the OpenAI-compatible client, reading the API key from the environment
    pub fn create_client(config: &TranslateConfig) -> Result<Arc<dyn ChatCompletion>> {
        let api_key = config.api_key()?;
        Ok(Arc::new(openai::OpenAiClient::new(config, api_key)?))
    }
}
