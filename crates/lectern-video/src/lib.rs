// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live video for Lectern.
//!
//! [`MuxClient`] implements [`lectern_core::VideoProvider`] over the provider's
//! REST API. [`LiveStreamService`] gates provisioning and viewing behind the
//! access decision engine, and [`VideoWebhookHandler`] keeps stored stream
//! status in step with provider notifications.

pub mod client;
pub mod live;
mod types;
pub mod webhook;

pub use client::MuxClient;
pub use live::{JoinInfo, LiveStatus, LiveStreamError, LiveStreamService, StartedStream};
pub use webhook::{VideoEventOutcome, VideoWebhookHandler};
