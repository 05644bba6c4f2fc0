// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lectern entitlement and signed-access service.
//!
//! This crate provides the error type, the domain types, and the store and
//! provider traits used throughout the Lectern workspace. Services depend on
//! the traits; backends and provider clients implement them.

pub mod error;
pub mod stores;
pub mod traits;
pub mod types;

pub use error::LecternError;
pub use stores::Stores;
pub use types::{
    AdapterType, CheckoutRequest, CheckoutSession, Course, CourseId, CredentialKind, Entitlement,
    HealthStatus, LedgerWrite, LiveStreamRecord, Material, NewCourse, NewUser, PaymentRecord,
    PlaybackPolicy, Principal, ProvisionedStream, ReconciliationFailure, Role, SignedCredential,
    User, UserId,
};

pub use traits::{
    CourseCatalog, EntitlementStore, LiveStreamStore, MaterialStore, PaymentLedger,
    PaymentProvider, PluginAdapter, StorageAdapter, UserStore, VideoProvider,
};
