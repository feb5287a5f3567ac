//! Per-client request limiting for the `/api` routes

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use docchat_core::{Error, Result};

use crate::config::RateLimitConfig;
use crate::error::ApiError;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Allow `max_requests` per `window`, replenished evenly across the window
pub fn build_limiter(config: &RateLimitConfig) -> Result<Arc<IpRateLimiter>> {
    let burst = NonZeroU32::new(config.max_requests).ok_or_else(|| {
        Error::Configuration("rate limit must allow at least one request".to_string())
    })?;
    let quota = Quota::with_period(config.window / config.max_requests)
        .ok_or_else(|| Error::Configuration("rate limit window is too short".to_string()))?
        .allow_burst(burst);
    Ok(Arc::new(RateLimiter::keyed(quota)))
}

/// Peer address from the connection; requests without one share a bucket
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn enforce(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match limiter.check_key(&ip) {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            warn!(client = %ip, path = %request.uri().path(), "rate limit exceeded");
            ApiError::TooManyRequests {
                retry_after_secs: wait.as_secs().max(1),
            }
            .into_response()
        }
    }
}
