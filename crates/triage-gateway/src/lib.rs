// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP query and update surface for triaged messages.
//!
//! Exposes listing with category and date filters, partial updates, per
//! category statistics, and a route that runs the batch pipeline over a
//! server-side CSV file.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, ServerConfig, build_router, start_server};
