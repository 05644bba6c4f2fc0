// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock payment and video providers for deterministic testing.
//!
//! Both record the requests they receive so tests can assert on what the
//! services asked the provider to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use lectern_core::{
    AdapterType, CheckoutRequest, CheckoutSession, HealthStatus, LecternError, PaymentProvider,
    PlaybackPolicy, PluginAdapter, ProvisionedStream, VideoProvider,
};

/// A payment provider that hands out predictable checkout sessions.
///
/// Created sessions are `cs_test_1`, `cs_test_2`, ... and start unpaid.
/// [`MockPaymentProvider::mark_paid`] flips one to paid for retrieval.
#[derive(Default)]
pub struct MockPaymentProvider {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    requests: Mutex<Vec<CheckoutRequest>>,
    fail: AtomicBool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the provider were down.
    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Register or replace a session returned by retrieval.
    pub async fn insert_session(&self, session: CheckoutSession) {
        self.sessions.lock().await.insert(session.id.clone(), session);
    }

    /// Mark a stored session as paid.
    pub async fn mark_paid(&self, session_id: &str) {
        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.payment_status = "paid".to_string();
        }
    }

    /// Every checkout request received so far.
    pub async fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), LecternError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LecternError::provider(
                "mock-payments",
                std::io::Error::other("provider unavailable"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MockPaymentProvider {
    fn name(&self) -> &str {
        "mock-payments"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payments
    }

    async fn health_check(&self) -> Result<HealthStatus, LecternError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LecternError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, LecternError> {
        self.check_available()?;
        let mut requests = self.requests.lock().await;
        let id = format!("cs_test_{}", requests.len() + 1);
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://checkout.test/pay/{id}")),
            payment_status: "unpaid".to_string(),
            amount_total: Some(request.unit_amount_cents),
            currency: Some(request.currency.to_lowercase()),
            metadata: [
                ("userId".to_string(), request.user_id.to_string()),
                ("courseId".to_string(), request.course_id.to_string()),
            ]
            .into_iter()
            .collect(),
        };
        requests.push(request);
        self.sessions.lock().await.insert(id, session.clone());
        Ok(session)
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, LecternError> {
        self.check_available()?;
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| {
                LecternError::provider(
                    "mock-payments",
                    std::io::Error::other(format!("no such session: {session_id}")),
                )
            })
    }
}

/// A video provider that provisions numbered streams.
///
/// Streams are `ls_1`, `ls_2`, ... with playback ids `pb_1`, `pb_2`, ...
/// [`MockVideoProvider::set_status`] changes what polling reports.
#[derive(Default)]
pub struct MockVideoProvider {
    created: AtomicUsize,
    policies: Mutex<Vec<PlaybackPolicy>>,
    statuses: Mutex<HashMap<String, String>>,
}

impl MockVideoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of streams provisioned so far.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Playback policies requested, in order.
    pub async fn policies(&self) -> Vec<PlaybackPolicy> {
        self.policies.lock().await.clone()
    }

    pub async fn set_status(&self, stream_id: &str, status: &str) {
        self.statuses
            .lock()
            .await
            .insert(stream_id.to_string(), status.to_string());
    }
}

#[async_trait]
impl PluginAdapter for MockVideoProvider {
    fn name(&self) -> &str {
        "mock-video"
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
impl VideoProvider for MockVideoProvider {
    async fn create_live_stream(
        &self,
        policy: PlaybackPolicy,
    ) -> Result<ProvisionedStream, LecternError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        self.policies.lock().await.push(policy);
        let stream_id = format!("ls_{n}");
        self.statuses
            .lock()
            .await
            .insert(stream_id.clone(), "idle".to_string());
        Ok(ProvisionedStream {
            stream_id,
            stream_key: format!("sk_{n}"),
            playback_id: Some(format!("pb_{n}")),
            status: "idle".to_string(),
        })
    }

    async fn get_live_stream(&self, stream_id: &str) -> Result<ProvisionedStream, LecternError> {
        let statuses = self.statuses.lock().await;
        let status = statuses.get(stream_id).cloned().ok_or_else(|| {
            LecternError::provider(
                "mock-video",
                std::io::Error::other(format!("no such stream: {stream_id}")),
            )
        })?;
        let n = stream_id.trim_start_matches("ls_");
        Ok(ProvisionedStream {
            stream_id: stream_id.to_string(),
            stream_key: format!("sk_{n}"),
            playback_id: Some(format!("pb_{n}")),
            status,
        })
    }
}
