// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete router with mock providers, test
//! secrets, and either the in-memory store or a temp SQLite database.
//! Requests are driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use secrecy::SecretString;
use tower::ServiceExt;

use lectern_access::CredentialIssuer;
use lectern_auth::WebhookVerifier;
use lectern_config::LecternConfig;
use lectern_config::model::StorageConfig;
use lectern_core::{
    Course, CourseId, LecternError, NewCourse, NewUser, Principal, Role, StorageAdapter, Stores,
};
use lectern_gateway::{AppState, build_router};
use lectern_storage::SqliteStorage;

use crate::memory_store::InMemoryStore;
use crate::mock_provider::{MockPaymentProvider, MockVideoProvider};

pub const JWT_SECRET: &str = "test-identity-secret";
pub const PAYMENT_WEBHOOK_SECRET: &str = "whsec_test_payments";
pub const VIDEO_WEBHOOK_SECRET: &str = "whsec_test_video";
pub const STORAGE_BUCKET: &str = "lectern-materials";

pub const PLAYBACK_KEY_ID: &str = "test-playback-key";
const PLAYBACK_PRIVATE_KEY: &str = include_str!("../testdata/playback_private.pem");

/// Public half of the playback signing key, for verifying issued tokens.
pub const PLAYBACK_PUBLIC_KEY: &str = include_str!("../testdata/playback_public.pem");

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    sqlite: bool,
    signed_playback: bool,
    video_webhook_secret: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            sqlite: false,
            signed_playback: false,
            video_webhook_secret: false,
        }
    }

    /// Back the stores with a temp SQLite database instead of memory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    /// Configure a playback signing key so live streams use the signed policy.
    pub fn with_signed_playback(mut self) -> Self {
        self.signed_playback = true;
        self
    }

    /// Require signatures on video provider notifications.
    pub fn with_video_webhook_secret(mut self) -> Self {
        self.video_webhook_secret = true;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, LecternError> {
        let mut config = LecternConfig::default();
        config.server.app_url = "https://app.test".to_string();
        config.auth.jwt_secret = Some(JWT_SECRET.to_string());
        config.payments.api_key = Some("sk_test".to_string());
        config.payments.webhook_secret = Some(PAYMENT_WEBHOOK_SECRET.to_string());
        config.video.token_id = Some("tok_id".to_string());
        config.video.token_secret = Some("tok_secret".to_string());
        config.object_storage.access_key_id = Some("AKIDTEST".to_string());
        config.object_storage.secret_access_key = Some("storage-secret".to_string());
        config.object_storage.region = "us-east-1".to_string();
        config.object_storage.bucket = Some(STORAGE_BUCKET.to_string());
        if self.signed_playback {
            config.video.signing_key_id = Some(PLAYBACK_KEY_ID.to_string());
            config.video.signing_key_private = Some(PLAYBACK_PRIVATE_KEY.to_string());
        }
        if self.video_webhook_secret {
            config.video.webhook_secret = Some(VIDEO_WEBHOOK_SECRET.to_string());
        }

        let (stores, memory, temp_dir) = if self.sqlite {
            let temp_dir =
                tempfile::TempDir::new().map_err(|e| LecternError::Storage { source: e.into() })?;
            config.storage = StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            };
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await?;
            (Stores::from_shared(Arc::new(storage)), None, Some(temp_dir))
        } else {
            let memory = Arc::new(InMemoryStore::new());
            (Stores::from_shared(memory.clone()), Some(memory), None)
        };

        let payments = Arc::new(MockPaymentProvider::new());
        let video = Arc::new(MockVideoProvider::new());
        let issuer = CredentialIssuer::from_config(&config)?;
        let state = AppState::new(
            &config,
            stores.clone(),
            payments.clone(),
            video.clone(),
            issuer,
        )?;
        let router = build_router(state.clone(), &config.server.cors_origins);

        Ok(TestHarness {
            router,
            state,
            stores,
            memory,
            payments,
            video,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A response with its body fully read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    /// The body parsed as JSON. Panics on a non-JSON body.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

/// A complete test environment with mock providers and isolated storage.
pub struct TestHarness {
    pub router: Router,
    pub state: AppState,
    pub stores: Stores,
    /// Set when the harness runs on the in-memory store.
    pub memory: Option<Arc<InMemoryStore>>,
    pub payments: Arc<MockPaymentProvider>,
    pub video: Arc<MockVideoProvider>,
    pub config: LecternConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        TestResponse { status, body }
    }

    /// Send a request with an optional bearer token and optional JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("valid request")).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> TestResponse {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    /// Create an account directly in the store and mint its identity token.
    pub async fn sign_in(&self, email: &str, role: Role) -> (Principal, String) {
        let user = self
            .stores
            .users
            .create_user(NewUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                role,
            })
            .await
            .expect("create user");
        let principal = Principal {
            id: user.id,
            email: user.email,
            role: user.role,
        };
        let token = self.state.tokens.issue(&principal).expect("issue token");
        (principal, token)
    }

    /// Create a course owned by `instructor`.
    pub async fn create_course(&self, instructor: &Principal, price_cents: i64) -> Course {
        self.stores
            .courses
            .create_course(NewCourse {
                title: "Systems Programming".to_string(),
                description: Some("Ownership, lifetimes, and unsafe".to_string()),
                price_cents,
                instructor_id: instructor.id,
            })
            .await
            .expect("create course")
    }

    /// A `checkout.session.completed` notification body.
    pub fn checkout_completed(
        event_id: &str,
        session_id: &str,
        user: &Principal,
        course: CourseId,
    ) -> Vec<u8> {
        serde_json::json!({
            "id": event_id,
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": session_id,
                    "payment_status": "paid",
                    "amount_total": 4900,
                    "currency": "usd",
                    "metadata": {
                        "userId": user.id.to_string(),
                        "courseId": course.to_string()
                    }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    /// Signature header for `payload` under the payment webhook secret.
    pub fn sign_payment_webhook(payload: &[u8]) -> String {
        sign(PAYMENT_WEBHOOK_SECRET, payload)
    }

    /// Signature header for `payload` under the video webhook secret.
    pub fn sign_video_webhook(payload: &[u8]) -> String {
        sign(VIDEO_WEBHOOK_SECRET, payload)
    }

    /// Post a raw webhook body with an optional signature header.
    pub async fn post_webhook(
        &self,
        uri: &str,
        signature_header: (&str, Option<String>),
        payload: Vec<u8>,
    ) -> TestResponse {
        let (name, value) = signature_header;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = value {
            builder = builder.header(name, value);
        }
        self.send(builder.body(Body::from(payload)).expect("valid request"))
            .await
    }
}

fn sign(secret: &str, payload: &[u8]) -> String {
    WebhookVerifier::new(SecretString::from(secret.to_string()), 300)
        .sign(payload, Utc::now().timestamp())
        .expect("sign payload")
}
