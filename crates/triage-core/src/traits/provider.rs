// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the external text-classification capability.

use async_trait::async_trait;

use crate::error::TriageError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a language-model completion endpoint.
///
/// Implementations perform exactly one round-trip per call (plus whatever
/// transient-error retries they are configured for) and return the raw reply
/// text. Interpreting that text is the classifier's job.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, TriageError>;
}
