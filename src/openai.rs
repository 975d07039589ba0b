//! OpenAI-compatible client configuration with sensible defaults.

use crate::config::ApiSettings;
use crate::error::{RagbookError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client from API settings.
///
/// The key is taken from `OPENAI_API_KEY`. A custom `base_url` lets any
/// OpenAI-compatible endpoint stand in for the hosted service.
pub fn create_client(api: &ApiSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default();
    if let Some(base) = api.base_url.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(api.timeout_secs))
        .build()
        .map_err(|e| RagbookError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
