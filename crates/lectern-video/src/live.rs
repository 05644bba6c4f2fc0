// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-course live streams: provisioning, status, and viewer access.
//!
//! A course has at most one stream. Starting again returns the stored stream
//! with its stream key withheld; the key is only shown to the instructor in
//! the response that provisioned it. The playback policy is fixed when the
//! stream is provisioned and read back from the record afterwards.

use std::sync::Arc;

use lectern_access::{
    AccessDecisionEngine, CredentialIssuer, DenyReason, IssueError, ResourceRequest,
};
use lectern_core::{
    CourseId, CredentialKind, LecternError, LiveStreamRecord, LiveStreamStore, PlaybackPolicy,
    Principal, VideoProvider,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LiveStreamError {
    #[error("access denied: {0}")]
    Denied(DenyReason),

    /// The course has no stream record.
    #[error("no live stream for this course")]
    NoStream,

    /// A record exists but has no playback id to join.
    #[error("live stream not configured")]
    NotConfigured,

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Store(#[from] LecternError),
}

/// Returned to the instructor who starts (or restarts) a course stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedStream {
    pub ingest_url: String,
    /// Present only when this call provisioned the stream.
    pub stream_key: Option<String>,
    pub playback_id: Option<String>,
    pub playback_policy: PlaybackPolicy,
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    pub status: String,
    pub is_active: bool,
    pub playback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinInfo {
    pub playback_policy: PlaybackPolicy,
    pub hls: String,
}

/// Coordinates the decision engine, the stream store, the provider, and the
/// credential issuer for live streams.
#[derive(Clone)]
pub struct LiveStreamService {
    decisions: AccessDecisionEngine,
    streams: Arc<dyn LiveStreamStore>,
    provider: Arc<dyn VideoProvider>,
    issuer: Arc<CredentialIssuer>,
    ingest_url: String,
    stream_base: String,
    join_ttl_secs: u64,
}

impl LiveStreamService {
    pub fn new(
        decisions: AccessDecisionEngine,
        streams: Arc<dyn LiveStreamStore>,
        provider: Arc<dyn VideoProvider>,
        issuer: Arc<CredentialIssuer>,
    ) -> Self {
        Self {
            decisions,
            streams,
            provider,
            issuer,
            ingest_url: "rtmps://global-live.mux.com:443/app".to_string(),
            stream_base: "https://stream.mux.com".to_string(),
            join_ttl_secs: 600,
        }
    }

    pub fn with_ingest_url(mut self, url: impl Into<String>) -> Self {
        self.ingest_url = url.into();
        self
    }

    pub fn with_stream_base(mut self, base: impl Into<String>) -> Self {
        self.stream_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_join_ttl(mut self, secs: u64) -> Self {
        self.join_ttl_secs = secs;
        self
    }

    /// Policy for newly provisioned streams: signed whenever a playback
    /// signer is configured.
    pub fn provisioning_policy(&self) -> PlaybackPolicy {
        if self.issuer.can_issue(CredentialKind::LivePlayback) {
            PlaybackPolicy::Signed
        } else {
            PlaybackPolicy::Public
        }
    }

    /// Provision the course stream, or return the existing one.
    pub async fn start(
        &self,
        principal: &Principal,
        course: CourseId,
    ) -> Result<StartedStream, LiveStreamError> {
        self.decisions
            .decide(principal, ResourceRequest::ManageLiveStream(course))
            .await?
            .into_result()
            .map_err(LiveStreamError::Denied)?;

        if let Some(existing) = self.streams.get_live_stream(course).await? {
            debug!(%course, stream_id = %existing.stream_id, "reusing live stream");
            return Ok(self.started(existing, None));
        }

        let policy = self.provisioning_policy();

        let provisioned = self.provider.create_live_stream(policy).await?;
        let new_stream_id = provisioned.stream_id.clone();
        let stored = self
            .streams
            .insert_live_stream(LiveStreamRecord {
                course_id: course,
                stream_id: provisioned.stream_id,
                playback_id: provisioned.playback_id,
                status: provisioned.status,
                playback_policy: policy,
            })
            .await?;

        // A concurrent start may have stored its stream first.
        if stored.stream_id != new_stream_id {
            info!(%course, orphaned = %new_stream_id, "live stream start raced, keeping stored stream");
            return Ok(self.started(stored, None));
        }
        info!(%course, stream_id = %stored.stream_id, %policy, "live stream started");
        Ok(self.started(stored, Some(provisioned.stream_key)))
    }

    /// Current status of the course stream, refreshed from the provider.
    pub async fn status(&self, course: CourseId) -> Result<LiveStatus, LiveStreamError> {
        let record = self
            .streams
            .get_live_stream(course)
            .await?
            .ok_or(LiveStreamError::NoStream)?;

        let current = self.provider.get_live_stream(&record.stream_id).await?;
        if current.status != record.status {
            self.streams
                .update_status_by_stream_id(&record.stream_id, &current.status)
                .await?;
            debug!(%course, from = %record.status, to = %current.status, "live stream status changed");
        }
        Ok(LiveStatus {
            is_active: current.status == "active",
            status: current.status,
            playback_id: record.playback_id,
        })
    }

    /// Playback URL for an entitled viewer.
    pub async fn join(
        &self,
        principal: &Principal,
        course: CourseId,
    ) -> Result<JoinInfo, LiveStreamError> {
        self.decisions
            .decide(principal, ResourceRequest::JoinLiveStream(course))
            .await?
            .into_result()
            .map_err(LiveStreamError::Denied)?;

        let record = self
            .streams
            .get_live_stream(course)
            .await?
            .ok_or(LiveStreamError::NotConfigured)?;
        let playback_id = record
            .playback_id
            .filter(|id| !id.is_empty())
            .ok_or(LiveStreamError::NotConfigured)?;

        // A signed stream never falls back to a bare URL, even if the signer
        // has since been removed; issuance fails instead.
        match record.playback_policy {
            PlaybackPolicy::Signed => {
                let credential = self.issuer.issue(
                    &playback_id,
                    CredentialKind::LivePlayback,
                    self.join_ttl_secs,
                )?;
                debug!(user = %principal.id, %course, "live playback token issued");
                Ok(JoinInfo {
                    playback_policy: PlaybackPolicy::Signed,
                    hls: credential.url,
                })
            }
            PlaybackPolicy::Public => Ok(JoinInfo {
                playback_policy: PlaybackPolicy::Public,
                hls: format!("{}/{playback_id}.m3u8", self.stream_base),
            }),
        }
    }

    fn started(
        &self,
        record: LiveStreamRecord,
        stream_key: Option<String>,
    ) -> StartedStream {
        StartedStream {
            ingest_url: self.ingest_url.clone(),
            reused: stream_key.is_none(),
            stream_key,
            playback_id: record.playback_id,
            playback_policy: record.playback_policy,
        }
    }
}
