use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use docchat_core::{Error, Result};

use crate::config::ServerConfig;
use crate::handlers::{chat, health, not_found, providers};
use crate::rate_limit::{self, IpRateLimiter};
use crate::state::AppState;

/// Creates the application router.
///
/// `/health` is never rate limited; every `/api` route shares `limiter`.
pub fn router(
    state: Arc<AppState>,
    config: &ServerConfig,
    limiter: Arc<IpRateLimiter>,
) -> Result<Router> {
    let api = Router::new()
        .route("/api/chat", post(chat::ask))
        .route("/api/chat/context", post(chat::context))
        .route("/api/chat/collection", get(chat::collection))
        .route("/api/chat/providers", get(providers::list))
        .route("/api/chat/providers/test", post(providers::test_all))
        .route("/api/chat/providers/:name/test", post(providers::test_one))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit::enforce));

    Ok(Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .fallback(not_found)
        .with_state(state)
        .layer(build_cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http()))
}

fn build_cors_layer(origin: &str) -> Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(origin)
            .map_err(|e| Error::Configuration(format!("Invalid CORS_ORIGIN '{}': {}", origin, e)))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]))
}
