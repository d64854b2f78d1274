// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Provider and storage adapters extend [`PluginAdapter`] and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod classifier;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use classifier::MessageClassifier;
pub use provider::ProviderAdapter;
pub use storage::StorageAdapter;
