// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for Lectern stores and provider adapters.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use provider::{PaymentProvider, VideoProvider};
pub use storage::{
    CourseCatalog, EntitlementStore, LiveStreamStore, MaterialStore, PaymentLedger,
    StorageAdapter, UserStore,
};
