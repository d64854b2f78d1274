// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classification provider with scripted replies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use triage_core::traits::{PluginAdapter, ProviderAdapter};
use triage_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use triage_core::TriageError;

/// Reply returned once the script is exhausted. Not valid JSON.
pub const DEFAULT_REPLY: &str = "mock response";

/// A provider that pops scripted results from a FIFO queue and records every
/// request it receives.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, TriageError>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads successful replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Pre-loads replies and errors in call order.
    pub fn with_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<String, TriageError>>,
    {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            requests: Arc::default(),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.script).push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: TriageError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, TriageError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TriageError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TriageError> {
        let call = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };
        let next = lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()));
        next.map(|content| ProviderResponse {
            id: format!("mock-resp-{call}"),
            content,
            model: "mock-model".to_string(),
        })
    }
}
