// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the HTTP listener.

use std::future::Future;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use lectern_core::LecternError;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{self, account, courses, live, payments};
use crate::state::AppState;

/// Build the CORS layer. No configured origins allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Every route of the HTTP surface.
///
/// Webhook routes take raw bytes; authentication is per handler through
/// [`AuthPrincipal`](crate::auth::AuthPrincipal).
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(account::register))
        .route("/auth/login", post(account::login))
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/courses/{id}", get(courses::get_course))
        .route(
            "/courses/{id}/materials",
            get(courses::list_materials).post(courses::add_material),
        )
        .route("/courses/{id}/live", post(live::start_live))
        .route("/courses/{id}/live/status", get(live::live_status))
        .route("/courses/{id}/live/join", get(live::join_live))
        .route(
            "/payments/checkout/create-session",
            post(payments::create_session),
        )
        .route("/payments/webhooks/provider", post(payments::payment_webhook))
        .route(
            "/payments/verify-session/{id}",
            get(payments::verify_session),
        )
        .route("/payments/my-courses", get(payments::my_courses))
        .route("/video/webhooks/provider", post(live::video_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Bind `host:port` and serve `router` until `shutdown` resolves.
pub async fn start_server(
    host: &str,
    port: u16,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), LecternError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LecternError::Config(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "lectern listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LecternError::Internal(format!("server error: {e}")))
}
