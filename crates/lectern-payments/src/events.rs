// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed view of verified payment notifications.

use lectern_core::CheckoutSession;
use thiserror::Error;

use crate::types::{ApiCheckoutSession, ApiEvent};

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

/// A payment notification after signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// A checkout session finished or its delayed payment cleared.
    CheckoutSettled {
        event_id: String,
        event_type: String,
        session: CheckoutSession,
    },
    /// Any other event type. Acknowledged without action.
    Other { event_id: String, event_type: String },
}

impl PaymentEvent {
    pub fn event_id(&self) -> &str {
        match self {
            Self::CheckoutSettled { event_id, .. } | Self::Other { event_id, .. } => event_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            Self::CheckoutSettled { event_type, .. } | Self::Other { event_type, .. } => event_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("notification is not a valid event: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("event {event_id} carries an invalid checkout session: {source}")]
    InvalidSession {
        event_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a raw, already verified notification body.
pub fn parse_event(raw: &[u8]) -> Result<PaymentEvent, EventError> {
    let event: ApiEvent = serde_json::from_slice(raw).map_err(EventError::InvalidEnvelope)?;
    match event.type_.as_str() {
        CHECKOUT_COMPLETED | ASYNC_PAYMENT_SUCCEEDED => {
            let session: ApiCheckoutSession = serde_json::from_value(event.data.object)
                .map_err(|source| EventError::InvalidSession {
                    event_id: event.id.clone(),
                    source,
                })?;
            Ok(PaymentEvent::CheckoutSettled {
                event_id: event.id,
                event_type: event.type_,
                session: session.into(),
            })
        }
        _ => Ok(PaymentEvent::Other {
            event_id: event.id,
            event_type: event.type_,
        }),
    }
}
