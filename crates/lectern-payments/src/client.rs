// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the hosted-checkout payment API.
//!
//! Requests are form-encoded with a bearer API key. Responses are translated
//! into [`CheckoutSession`] before they leave this module. No call is retried.

use std::time::Duration;

use async_trait::async_trait;
use lectern_config::model::PaymentsConfig;
use lectern_core::{
    AdapterType, CheckoutRequest, CheckoutSession, HealthStatus, LecternError, PaymentProvider,
    PluginAdapter,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::types::{ApiCheckoutSession, ApiErrorResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Payment provider client implementing [`PaymentProvider`].
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
}

impl StripeClient {
    /// Creates a client authenticating with `api_key` against `base_url`
    /// (e.g. `https://api.stripe.com`).
    pub fn new(api_key: &SecretString, base_url: impl Into<String>) -> Result<Self, LecternError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| LecternError::Config(format!("invalid payments API key: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LecternError::provider("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the `[payments]` section.
    pub fn from_config(config: &PaymentsConfig) -> Result<Self, LecternError> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| LecternError::Config("payments.api_key is not set".into()))?;
        Self::new(&SecretString::from(api_key.clone()), config.api_base.clone())
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn read_session(
        &self,
        response: reqwest::Response,
    ) -> Result<ApiCheckoutSession, LecternError> {
        let status = response.status();
        debug!(status = %status, "payments response received");

        if status.is_success() {
            return response
                .json::<ApiCheckoutSession>()
                .await
                .map_err(|e| LecternError::provider("failed to parse checkout session", e));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!(
                "payments API error ({}): {}",
                api_err.error.type_.unwrap_or_else(|| "unknown".into()),
                api_err.error.message.unwrap_or_default()
            ),
            Err(_) => format!("payments API returned {status}"),
        };
        Err(LecternError::Provider {
            message,
            source: None,
        })
    }
}

/// Form fields for a single-item checkout session.
fn checkout_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        (
            "line_items[0][price_data][currency]",
            request.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][product_data][name]",
            request.course_title.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            request.unit_amount_cents.to_string(),
        ),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("metadata[courseId]", request.course_id.to_string()),
        ("metadata[userId]", request.user_id.to_string()),
    ]
}

#[async_trait]
impl PluginAdapter for StripeClient {
    fn name(&self) -> &str {
        "stripe"
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
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, LecternError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(|e| LecternError::provider("checkout session request failed", e))?;

        let session: CheckoutSession = self.read_session(response).await?.into();
        if session.url.is_none() {
            return Err(LecternError::Provider {
                message: format!("checkout session {} has no url", session.id),
                source: None,
            });
        }
        info!(
            session_id = %session.id,
            course = %request.course_id,
            user = %request.user_id,
            "checkout session created"
        );
        Ok(session)
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, LecternError> {
        let well_formed = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(LecternError::Validation(format!(
                "invalid checkout session id `{session_id}`"
            )));
        }
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.base_url))
            .send()
            .await
            .map_err(|e| LecternError::provider("checkout session lookup failed", e))?;
        Ok(self.read_session(response).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use lectern_core::{CourseId, UserId};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(base_url: &str) -> StripeClient {
        StripeClient::new(&SecretString::from("sk_test_123".to_string()), base_url).unwrap()
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            course_id: CourseId(7),
            user_id: UserId(2),
            course_title: "Rust & Systems".into(),
            unit_amount_cents: 4900,
            currency: "USD".into(),
            success_url: "http://localhost:5173/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                .into(),
            cancel_url: "http://localhost:5173/courses/7".into(),
        }
    }

    #[tokio::test]
    async fn create_session_sends_form_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("metadata%5BcourseId%5D=7"))
            .and(body_string_contains("metadata%5BuserId%5D=2"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=4900"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bcurrency%5D=usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_1",
                "object": "checkout.session",
                "url": "https://checkout.example/pay/cs_test_1",
                "payment_status": "unpaid",
                "amount_total": 4900,
                "currency": "usd",
                "metadata": {"courseId": "7", "userId": "2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = test_client(&server.uri())
            .create_checkout_session(request())
            .await
            .unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.url.as_deref(), Some("https://checkout.example/pay/cs_test_1"));
        assert_eq!(session.metadata.get("courseId").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn session_without_url_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_2",
                "url": null
            })))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .create_checkout_session(request())
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Provider { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn api_errors_surface_type_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "No such price"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .create_checkout_session(request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid_request_error"), "got: {err}");
        assert!(err.contains("No such price"), "got: {err}");
    }

    #[tokio::test]
    async fn retrieve_session_maps_payment_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_3",
                "payment_status": "paid",
                "amount_total": 4900,
                "currency": "usd",
                "metadata": {"courseId": "7", "userId": "2"}
            })))
            .mount(&server)
            .await;

        let session = test_client(&server.uri())
            .retrieve_checkout_session("cs_test_3")
            .await
            .unwrap();
        assert!(session.is_paid());
        assert_eq!(session.amount_total, Some(4900));
    }

    #[tokio::test]
    async fn retrieve_rejects_path_injection() {
        let client = test_client("http://127.0.0.1:9");
        for id in ["", "../v1/customers", "cs_1?expand=x"] {
            assert!(matches!(
                client.retrieve_checkout_session(id).await,
                Err(LecternError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .retrieve_checkout_session("cs_down")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = PaymentsConfig::default();
        assert!(matches!(
            StripeClient::from_config(&config),
            Err(LecternError::Config(_))
        ));
    }
}
