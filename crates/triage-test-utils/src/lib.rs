// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for triage integration tests.
//!
//! Deterministic stand-ins for the external classification capability and
//! helpers for throwaway SQLite stores, so tests run without network access.
//!
//! - [`MockProvider`]: scripted provider replies and errors
//! - [`MockClassifier`]: scripted classification outcomes keyed by subject
//! - [`FaultyStorage`]: wraps a store and fails chosen commits
//! - [`temp_storage`]: an initialized SQLite store in a temp directory

pub mod faulty_storage;
pub mod mock_classifier;
pub mod mock_provider;
pub mod storage;

pub use faulty_storage::FaultyStorage;
pub use mock_classifier::{MockClassifier, classified, fallback};
pub use mock_provider::MockProvider;
pub use storage::{TempStorage, temp_storage};
