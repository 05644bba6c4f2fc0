// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the Lectern access service.
//!
//! The gateway is a thin axum layer: it authenticates bearer callers, hands
//! requests to the decision engine and services, and maps their outcomes onto
//! status codes through [`ApiError`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use auth::AuthPrincipal;
pub use error::{ApiError, COURSE_UNAVAILABLE};
pub use handlers::live::VIDEO_SIGNATURE_HEADER;
pub use handlers::payments::PAYMENT_SIGNATURE_HEADER;
pub use server::{build_router, cors_layer, start_server};
pub use state::{AppState, GatewaySettings};
