// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Video provider wire types. Translated to [`ProvisionedStream`] at the
//! crate boundary.

use lectern_core::{PlaybackPolicy, ProvisionedStream};
use serde::{Deserialize, Serialize};

/// Body of `POST /video/v1/live-streams`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateLiveStreamRequest {
    pub playback_policy: Vec<PlaybackPolicy>,
    pub new_asset_settings: NewAssetSettings,
    pub latency_mode: &'static str,
    pub reconnect_window: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewAssetSettings {
    pub playback_policy: Vec<PlaybackPolicy>,
}

impl CreateLiveStreamRequest {
    pub fn new(policy: PlaybackPolicy) -> Self {
        Self {
            playback_policy: vec![policy],
            new_asset_settings: NewAssetSettings {
                playback_policy: vec![policy],
            },
            latency_mode: "low",
            reconnect_window: 60,
        }
    }
}

/// Every API response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLiveStream {
    pub id: String,
    #[serde(default)]
    pub stream_key: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub playback_ids: Vec<ApiPlaybackId>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPlaybackId {
    pub id: String,
}

impl From<ApiLiveStream> for ProvisionedStream {
    fn from(api: ApiLiveStream) -> Self {
        Self {
            stream_id: api.id,
            stream_key: api.stream_key.unwrap_or_default(),
            playback_id: api.playback_ids.into_iter().next().map(|p| p.id),
            status: api.status.unwrap_or_else(|| "idle".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// A status notification. Only the fields we act on are read.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiVideoEvent {
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub data: Option<ApiVideoEventData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiVideoEventData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_shape() {
        let body = serde_json::to_value(CreateLiveStreamRequest::new(PlaybackPolicy::Signed)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "playback_policy": ["signed"],
                "new_asset_settings": {"playback_policy": ["signed"]},
                "latency_mode": "low",
                "reconnect_window": 60
            })
        );
    }

    #[test]
    fn first_playback_id_is_used() {
        let api: ApiLiveStream = serde_json::from_value(serde_json::json!({
            "id": "ls_1",
            "stream_key": "sk_1",
            "status": "idle",
            "playback_ids": [{"id": "pb_1", "policy": "signed"}, {"id": "pb_2", "policy": "public"}]
        }))
        .unwrap();
        let stream = ProvisionedStream::from(api);
        assert_eq!(stream.playback_id.as_deref(), Some("pb_1"));
        assert_eq!(stream.stream_key, "sk_1");
    }

    #[test]
    fn sparse_stream_defaults() {
        let api: ApiLiveStream = serde_json::from_str(r#"{"id":"ls_2"}"#).unwrap();
        let stream = ProvisionedStream::from(api);
        assert_eq!(stream.status, "idle");
        assert!(stream.playback_id.is_none());
        assert!(stream.stream_key.is_empty());
    }
}
