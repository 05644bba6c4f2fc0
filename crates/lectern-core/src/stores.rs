// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bundle of store trait objects injected into services.

use std::sync::Arc;

use crate::traits::{
    CourseCatalog, EntitlementStore, LiveStreamStore, MaterialStore, PaymentLedger, UserStore,
};

/// Every store a service may need, as shared trait objects.
///
/// Usually all handles point at one backend; tests may mix implementations.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub courses: Arc<dyn CourseCatalog>,
    pub entitlements: Arc<dyn EntitlementStore>,
    pub materials: Arc<dyn MaterialStore>,
    pub live_streams: Arc<dyn LiveStreamStore>,
    pub payments: Arc<dyn PaymentLedger>,
}

impl Stores {
    /// Builds the bundle from a single backend implementing every store trait.
    pub fn from_shared<S>(backend: Arc<S>) -> Self
    where
        S: UserStore
            + CourseCatalog
            + EntitlementStore
            + MaterialStore
            + LiveStreamStore
            + PaymentLedger
            + 'static,
    {
        Self {
            users: backend.clone(),
            courses: backend.clone(),
            entitlements: backend.clone(),
            materials: backend.clone(),
            live_streams: backend.clone(),
            payments: backend,
        }
    }
}
