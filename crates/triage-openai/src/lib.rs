// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI chat completions provider for message classification.
//!
//! Implements [`ProviderAdapter`]: one system turn plus one user turn in,
//! the assistant's raw text out. Reply interpretation lives in the
//! classifier crate.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use triage_config::ClassifierConfig;
use triage_core::TriageError;
use triage_core::traits::{PluginAdapter, ProviderAdapter};
use triage_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// OpenAI provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config, then `OPENAI_API_KEY`, then error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &ClassifierConfig) -> Result<Self, TriageError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = OpenAiClient::new(
            &api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;

        info!(model = %config.model, "OpenAI provider initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_chat_request(&self, request: &ProviderRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(&request.system_instruction),
                ChatMessage::user(&request.user_prompt),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    // No API call here: a probe would spend tokens.
    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TriageError> {
        let response = self.client.chat(&self.to_chat_request(&request)).await?;
        let content = response
            .first_text()
            .ok_or_else(|| TriageError::Provider {
                message: "response contained no assistant text".into(),
                source: None,
            })?
            .to_string();

        Ok(ProviderResponse {
            id: response.id,
            content,
            model: response.model,
        })
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<String, TriageError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(TriageError::Config(
            "OpenAI API key not found. Set classifier.api_key in config or the OPENAI_API_KEY environment variable.".into(),
        )),
    }
}
