// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the live video API.
//!
//! Authenticates with HTTP basic auth (token id and secret). No call is retried.

use std::time::Duration;

use async_trait::async_trait;
use lectern_config::model::VideoConfig;
use lectern_core::{
    AdapterType, HealthStatus, LecternError, PlaybackPolicy, PluginAdapter, ProvisionedStream,
    VideoProvider,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::types::{ApiEnvelope, ApiErrorResponse, ApiLiveStream, CreateLiveStreamRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Video provider client implementing [`VideoProvider`].
#[derive(Debug, Clone)]
pub struct MuxClient {
    client: reqwest::Client,
    token_id: String,
    token_secret: SecretString,
    base_url: String,
}

impl MuxClient {
    pub fn new(
        token_id: impl Into<String>,
        token_secret: SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, LecternError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LecternError::provider("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            token_id: token_id.into(),
            token_secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the `[video]` section. Both token fields are required.
    pub fn from_config(config: &VideoConfig) -> Result<Self, LecternError> {
        let (Some(id), Some(secret)) = (&config.token_id, &config.token_secret) else {
            return Err(LecternError::Config(
                "video.token_id and video.token_secret must both be set".into(),
            ));
        };
        Self::new(id.clone(), SecretString::from(secret.clone()), config.api_base.clone())
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn live_streams_url(&self) -> String {
        format!("{}/video/v1/live-streams", self.base_url)
    }

    async fn read_stream(&self, response: reqwest::Response) -> Result<ApiLiveStream, LecternError> {
        let status = response.status();
        debug!(status = %status, "video response received");

        if status.is_success() {
            return response
                .json::<ApiEnvelope<ApiLiveStream>>()
                .await
                .map(|envelope| envelope.data)
                .map_err(|e| LecternError::provider("failed to parse live stream", e));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!(
                "video API error ({}): {}",
                api_err.error.type_.unwrap_or_else(|| "unknown".into()),
                api_err.error.messages.join("; ")
            ),
            Err(_) => format!("video API returned {status}"),
        };
        Err(LecternError::Provider {
            message,
            source: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for MuxClient {
    fn name(&self) -> &str {
        "mux"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Video
    }

    async fn health_check(&self) -> Result<HealthStatus, LecternError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LecternError> {
        Ok(())
    }
}

#[async_trait]
impl VideoProvider for MuxClient {
    async fn create_live_stream(
        &self,
        policy: PlaybackPolicy,
    ) -> Result<ProvisionedStream, LecternError> {
        let response = self
            .client
            .post(self.live_streams_url())
            .basic_auth(&self.token_id, Some(self.token_secret.expose_secret()))
            .json(&CreateLiveStreamRequest::new(policy))
            .send()
            .await
            .map_err(|e| LecternError::provider("live stream request failed", e))?;

        let stream: ProvisionedStream = self.read_stream(response).await?.into();
        info!(stream_id = %stream.stream_id, %policy, "live stream provisioned");
        Ok(stream)
    }

    async fn get_live_stream(&self, stream_id: &str) -> Result<ProvisionedStream, LecternError> {
        let well_formed = !stream_id.is_empty()
            && stream_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !well_formed {
            return Err(LecternError::Validation(format!(
                "invalid live stream id `{stream_id}`"
            )));
        }
        let response = self
            .client
            .get(format!("{}/{stream_id}", self.live_streams_url()))
            .basic_auth(&self.token_id, Some(self.token_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| LecternError::provider("live stream lookup failed", e))?;
        Ok(self.read_stream(response).await?.into())
    }
}
