// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider traits for the external payment and video platforms.
//!
//! Implementations translate provider responses into the DTOs in
//! [`crate::types`]; raw provider payloads never cross these traits.

use async_trait::async_trait;

use crate::error::LecternError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CheckoutRequest, CheckoutSession, PlaybackPolicy, ProvisionedStream};

/// Adapter for a hosted-checkout payment provider.
#[async_trait]
pub trait PaymentProvider: PluginAdapter {
    /// Creates a hosted checkout session for a single course purchase.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, LecternError>;

    /// Fetches the current state of a checkout session.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, LecternError>;
}

/// Adapter for a live video platform.
#[async_trait]
pub trait VideoProvider: PluginAdapter {
    /// Provisions a new live stream with the given playback policy.
    async fn create_live_stream(
        &self,
        policy: PlaybackPolicy,
    ) -> Result<ProvisionedStream, LecternError>;

    /// Fetches the current state of a provisioned live stream.
    async fn get_live_stream(&self, stream_id: &str) -> Result<ProvisionedStream, LecternError>;
}
