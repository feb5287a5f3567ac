//! HTTP API for docchat
//!
//! Thin axum layer over [`docchat_rag::RagEngine`]: request validation,
//! routing, per-IP rate limiting and the `{success, data | error}` envelope.

mod config;
mod error;
mod handlers;
pub mod logging;
mod rate_limit;
mod router;
mod state;
mod validation;


use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use docchat_rag::RagEngine;

pub use config::{RateLimitConfig, ServerConfig};
pub use error::ApiError;
pub use handlers::ApiResponse;
pub use rate_limit::{IpRateLimiter, build_limiter};
pub use router::router;
pub use state::AppState;
pub use validation::{ChatRequest, ContextRequest};

pub use docchat_core::{Error, Result};

/// Bind and serve until Ctrl-C
pub async fn serve(config: ServerConfig, engine: Arc<RagEngine>) -> Result<()> {
    let limiter = build_limiter(&config.rate_limit)?;
    spawn_limiter_cleanup(Arc::clone(&limiter), config.rate_limit.window);

    let app = router(Arc::new(AppState::new(engine)), &config, limiter)?;
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, cors_origin = %config.cors_origin, "docchat server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("docchat server stopped");
    Ok(())
}

/// Drop limiter state for clients that have been idle for a full window
fn spawn_limiter_cleanup(limiter: Arc<IpRateLimiter>, window: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(window);
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
