// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lectern integration tests.
//!
//! Provides an in-memory store, mock provider adapters, and a test harness
//! for fast, deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`InMemoryStore`] - Every store trait, with the same uniqueness rules as SQLite
//! - [`MockPaymentProvider`] - Predictable checkout sessions
//! - [`MockVideoProvider`] - Numbered live streams with settable status
//! - [`TestHarness`] - The full router wired to the above

pub mod harness;
pub mod memory_store;
pub mod mock_provider;

pub use harness::{TestHarness, TestResponse};
pub use memory_store::InMemoryStore;
pub use mock_provider::{MockPaymentProvider, MockVideoProvider};
