// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payments for Lectern.
//!
//! This crate provides:
//! - **Checkout client**: creates and retrieves hosted checkout sessions
//! - **Events**: typed parsing of verified payment notifications
//! - **Reconciliation**: turns paid sessions into entitlements exactly once

pub mod client;
pub mod events;
pub mod reconcile;
mod types;

pub use client::StripeClient;
pub use events::{EventError, PaymentEvent, parse_event};
pub use reconcile::{
    ReconcileOutcome, ReconciliationError, ReconciliationListener, checkout_metadata,
};
