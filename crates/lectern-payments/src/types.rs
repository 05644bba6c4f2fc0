// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment provider wire types.
//!
//! These mirror the provider's JSON and never leave this crate; callers see
//! [`CheckoutSession`] instead.

use std::collections::BTreeMap;

use lectern_core::CheckoutSession;
use serde::Deserialize;

/// A checkout session object as returned by the API and embedded in events.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl From<ApiCheckoutSession> for CheckoutSession {
    fn from(api: ApiCheckoutSession) -> Self {
        Self {
            id: api.id,
            url: api.url,
            payment_status: api.payment_status.unwrap_or_else(|| "unpaid".to_string()),
            amount_total: api.amount_total,
            currency: api.currency,
            metadata: api.metadata.unwrap_or_default(),
        }
    }
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope of a webhook notification.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: ApiEventData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiEventData {
    pub object: serde_json::Value,
}
