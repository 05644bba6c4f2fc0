// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mints short-lived signed credentials once access has been allowed.
//!
//! The issuer never consults entitlements; callers obtain an `Allow` from the
//! decision engine first. Requested TTLs above the per-kind ceiling are
//! refused rather than clamped.

use chrono::{DateTime, Duration, Utc};
use lectern_config::LecternConfig;
use lectern_config::model::AccessConfig;
use lectern_core::{CredentialKind, SignedCredential};
use tracing::debug;

use crate::error::IssueError;
use crate::playback::PlaybackTokenSigner;
use crate::storage_url::StorageUrlSigner;

/// Per-kind TTL ceilings, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlLimits {
    pub storage_object: u64,
    pub live_playback: u64,
    pub video_playback: u64,
}

impl TtlLimits {
    pub fn ceiling(&self, kind: CredentialKind) -> u64 {
        match kind {
            CredentialKind::StorageObject => self.storage_object,
            CredentialKind::LivePlayback => self.live_playback,
            CredentialKind::VideoPlayback => self.video_playback,
        }
    }
}

impl Default for TtlLimits {
    fn default() -> Self {
        Self::from(&AccessConfig::default())
    }
}

impl From<&AccessConfig> for TtlLimits {
    fn from(config: &AccessConfig) -> Self {
        Self {
            storage_object: config.max_storage_ttl_secs,
            live_playback: config.max_live_ttl_secs,
            video_playback: config.max_video_ttl_secs,
        }
    }
}

/// Validate a requested TTL against a ceiling.
pub fn check_ttl(kind: CredentialKind, requested: u64, ceiling: u64) -> Result<(), IssueError> {
    if requested == 0 {
        return Err(IssueError::InvalidTtl);
    }
    if requested > ceiling {
        return Err(IssueError::TtlExceeded {
            kind,
            requested,
            ceiling,
        });
    }
    Ok(())
}

/// Issues [`SignedCredential`]s for storage objects and playback ids.
pub struct CredentialIssuer {
    limits: TtlLimits,
    storage: Option<StorageUrlSigner>,
    playback: Option<PlaybackTokenSigner>,
    stream_base: String,
}

impl CredentialIssuer {
    /// An issuer with no signers; add them with the `with_*` builders.
    pub fn new(limits: TtlLimits) -> Self {
        Self {
            limits,
            storage: None,
            playback: None,
            stream_base: "https://stream.mux.com".to_string(),
        }
    }

    pub fn with_storage_signer(mut self, signer: StorageUrlSigner) -> Self {
        self.storage = Some(signer);
        self
    }

    pub fn with_playback_signer(mut self, signer: PlaybackTokenSigner) -> Self {
        self.playback = Some(signer);
        self
    }

    /// Base URL for playback URLs, e.g. `https://stream.mux.com`.
    pub fn with_stream_base(mut self, base: impl Into<String>) -> Self {
        self.stream_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build an issuer from the loaded configuration. Signers whose settings
    /// are absent are left unconfigured; malformed key material is an error.
    pub fn from_config(config: &LecternConfig) -> Result<Self, IssueError> {
        let mut issuer =
            Self::new(TtlLimits::from(&config.access)).with_stream_base(&config.video.stream_base);
        if let Some(signer) = StorageUrlSigner::from_config(&config.object_storage)? {
            issuer = issuer.with_storage_signer(signer);
        }
        if let Some(signer) = PlaybackTokenSigner::from_config(&config.video)? {
            issuer = issuer.with_playback_signer(signer);
        }
        Ok(issuer)
    }

    pub fn limits(&self) -> TtlLimits {
        self.limits
    }

    pub fn can_issue(&self, kind: CredentialKind) -> bool {
        match kind {
            CredentialKind::StorageObject => self.storage.is_some(),
            CredentialKind::LivePlayback | CredentialKind::VideoPlayback => {
                self.playback.is_some()
            }
        }
    }

    /// Issue a credential for `resource` valid for `ttl_secs` from now.
    pub fn issue(
        &self,
        resource: &str,
        kind: CredentialKind,
        ttl_secs: u64,
    ) -> Result<SignedCredential, IssueError> {
        self.issue_at(resource, kind, ttl_secs, Utc::now())
    }

    /// Issue a credential for `resource` valid from `now` for `ttl_secs`.
    ///
    /// `resource` is a storage key for `StorageObject` and a playback id for
    /// the playback kinds.
    pub fn issue_at(
        &self,
        resource: &str,
        kind: CredentialKind,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<SignedCredential, IssueError> {
        check_ttl(kind, ttl_secs, self.limits.ceiling(kind))?;
        // Ceilings come from config as u64; anything chrono cannot hold is refused.
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or(IssueError::InvalidTtl)?;
        let expires_at = now + ttl;

        let (token, url) = match kind {
            CredentialKind::StorageObject => {
                let signer = self
                    .storage
                    .as_ref()
                    .ok_or(IssueError::SignerUnavailable(kind))?;
                let presigned = signer.presign_get_at(resource, ttl_secs, now)?;
                (presigned.signature, presigned.url)
            }
            CredentialKind::LivePlayback | CredentialKind::VideoPlayback => {
                let signer = self
                    .playback
                    .as_ref()
                    .ok_or(IssueError::SignerUnavailable(kind))?;
                let token = signer.sign(resource, kind, expires_at)?;
                let url = format!("{}/{resource}.m3u8?token={token}", self.stream_base);
                (token, url)
            }
        };

        debug!(%kind, resource, ttl_secs, "signed credential issued");
        Ok(SignedCredential {
            resource: resource.to_string(),
            kind,
            issued_at: now,
            expires_at,
            token,
            url,
        })
    }
}
