// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live stream status notifications from the video provider.

use std::sync::Arc;

use lectern_auth::{SignatureError, WebhookVerifier};
use lectern_core::LiveStreamStore;
use tracing::{debug, error, info, warn};

use crate::types::ApiVideoEvent;

const LIVE_STREAM_EVENT_PREFIX: &str = "video.live_stream.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEventOutcome {
    /// The stored status of `stream_id` was updated.
    Updated { stream_id: String, status: String },
    /// No record carries this provider stream id.
    UnknownStream { stream_id: String },
    /// Not a live stream event, or missing id/status.
    Ignored,
    /// Acknowledged, but the update could not be written.
    Failed,
}

/// Applies status notifications to the live stream store.
///
/// With a verifier configured every notification must carry a valid
/// signature; without one, notifications are trusted as received.
pub struct VideoWebhookHandler {
    verifier: Option<WebhookVerifier>,
    streams: Arc<dyn LiveStreamStore>,
}

impl VideoWebhookHandler {
    pub fn new(verifier: Option<WebhookVerifier>, streams: Arc<dyn LiveStreamStore>) -> Self {
        Self { verifier, streams }
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_some()
    }

    /// Handle a raw notification body. Only a signature failure is an error;
    /// everything else is acknowledged.
    pub async fn handle(
        &self,
        raw: &[u8],
        signature_header: Option<&str>,
    ) -> Result<VideoEventOutcome, SignatureError> {
        if let Some(verifier) = &self.verifier {
            let header = signature_header.ok_or(SignatureError::MissingHeader)?;
            if let Err(e) = verifier.verify(raw, header) {
                warn!(error = %e, "video notification rejected");
                return Err(e);
            }
        }

        let event: ApiVideoEvent = match serde_json::from_slice(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "video notification is not an event, ignoring");
                return Ok(VideoEventOutcome::Ignored);
            }
        };
        if !event.type_.starts_with(LIVE_STREAM_EVENT_PREFIX) {
            debug!(event_type = %event.type_, "video notification ignored");
            return Ok(VideoEventOutcome::Ignored);
        }
        let Some((stream_id, status)) = event
            .data
            .and_then(|data| data.id.zip(data.status))
            .filter(|(id, status)| !id.is_empty() && !status.is_empty())
        else {
            return Ok(VideoEventOutcome::Ignored);
        };

        match self
            .streams
            .update_status_by_stream_id(&stream_id, &status)
            .await
        {
            Ok(true) => {
                info!(%stream_id, %status, event_type = %event.type_, "live stream status updated");
                Ok(VideoEventOutcome::Updated { stream_id, status })
            }
            Ok(false) => {
                debug!(%stream_id, "status notification for unknown live stream");
                Ok(VideoEventOutcome::UnknownStream { stream_id })
            }
            Err(e) => {
                error!(%stream_id, error = %e, "failed to apply live stream status");
                Ok(VideoEventOutcome::Failed)
            }
        }
    }
}
