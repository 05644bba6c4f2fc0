// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared state handed to every request handler.

use std::sync::Arc;

use lectern_access::{AccessDecisionEngine, CredentialIssuer};
use lectern_auth::{IdentityTokenIssuer, IdentityTokenVerifier, WebhookVerifier};
use lectern_config::LecternConfig;
use lectern_core::{LecternError, PaymentProvider, Stores, VideoProvider};
use lectern_payments::ReconciliationListener;
use lectern_video::{LiveStreamService, VideoWebhookHandler};
use secrecy::SecretString;

/// Request-independent values the handlers read.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Public web application URL, the base of checkout redirects.
    pub app_url: String,
    /// Currency for new checkout sessions.
    pub currency: String,
    /// Lifetime of material download URLs.
    pub materials_ttl_secs: u64,
}

impl GatewaySettings {
    pub fn from_config(config: &LecternConfig) -> Self {
        Self {
            app_url: config.server.app_url.trim_end_matches('/').to_string(),
            currency: config.payments.currency.to_uppercase(),
            materials_ttl_secs: config.access.materials_ttl_secs,
        }
    }
}

/// Every service the HTTP surface calls into. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub decisions: AccessDecisionEngine,
    pub issuer: Arc<CredentialIssuer>,
    pub identity: Arc<IdentityTokenVerifier>,
    pub tokens: Arc<IdentityTokenIssuer>,
    pub payments: Arc<dyn PaymentProvider>,
    pub reconciliation: Arc<ReconciliationListener>,
    pub live: LiveStreamService,
    pub video_webhooks: Arc<VideoWebhookHandler>,
    pub settings: Arc<GatewaySettings>,
}

impl AppState {
    /// Wire the services together from configuration, stores, and providers.
    ///
    /// Fails when the identity secret or the payment webhook secret is absent;
    /// the video webhook secret is optional.
    pub fn new(
        config: &LecternConfig,
        stores: Stores,
        payments: Arc<dyn PaymentProvider>,
        video: Arc<dyn VideoProvider>,
        issuer: CredentialIssuer,
    ) -> Result<Self, LecternError> {
        let jwt_secret = config
            .auth
            .jwt_secret
            .clone()
            .map(SecretString::from)
            .ok_or_else(|| LecternError::Config("auth.jwt_secret is not set".into()))?;
        let payments_secret = config
            .payments
            .webhook_secret
            .clone()
            .map(SecretString::from)
            .ok_or_else(|| LecternError::Config("payments.webhook_secret is not set".into()))?;

        let decisions = AccessDecisionEngine::from_stores(&stores);
        let issuer = Arc::new(issuer);
        let reconciliation = ReconciliationListener::from_stores(
            WebhookVerifier::new(payments_secret, config.payments.webhook_tolerance_secs),
            &stores,
        );
        let live = LiveStreamService::new(
            decisions.clone(),
            stores.live_streams.clone(),
            video,
            issuer.clone(),
        )
        .with_ingest_url(config.video.ingest_url.clone())
        .with_stream_base(config.video.stream_base.clone())
        .with_join_ttl(config.access.live_join_ttl_secs);
        let video_verifier = config.video.webhook_secret.clone().map(|secret| {
            WebhookVerifier::new(
                SecretString::from(secret),
                config.payments.webhook_tolerance_secs,
            )
        });
        let video_webhooks = VideoWebhookHandler::new(video_verifier, stores.live_streams.clone());

        Ok(Self {
            decisions,
            issuer,
            identity: Arc::new(IdentityTokenVerifier::new(&jwt_secret)),
            tokens: Arc::new(IdentityTokenIssuer::new(
                &jwt_secret,
                config.auth.token_ttl_secs,
            )),
            payments,
            reconciliation: Arc::new(reconciliation),
            live,
            video_webhooks: Arc::new(video_webhooks),
            settings: Arc::new(GatewaySettings::from_config(config)),
            stores,
        })
    }
}
