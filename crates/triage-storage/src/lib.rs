// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for triaged message records.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer model through
//! `tokio-rusqlite`, and atomic checkpoint-group inserts.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
