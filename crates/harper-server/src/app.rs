//! Router construction

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
///
/// CORS mirrors the caller's origin, method and headers and allows
/// credentials, so any browser origin may call the service.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat::chat))
        .route("/chat-gpt-5", post(handlers::chat::chat))
        .route("/react", post(handlers::react::react))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
