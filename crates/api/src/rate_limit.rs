//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-peer-IP limiting with tower_governor. Needs the service to be served
//! with `into_make_service_with_connect_info::<SocketAddr>()`.

use axum::Router;
use governor::middleware::StateInformationMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tracing::info;

/// Governor config with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

#[derive(Debug, Error)]
#[error("invalid rate limit: per_second = {per_second}, burst_size = {burst_size}")]
pub struct RateLimitError {
    pub per_second: u64,
    pub burst_size: u32,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between quota replenishments
    #[serde(default = "default_per_second")]
    pub per_second: u64,
    /// Requests that may be made at once
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

fn default_per_second() -> u64 {
    1
}

fn default_burst_size() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: default_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Build the governor config; zero periods or bursts are rejected
pub fn create_governor_config(config: &RateLimitConfig) -> Result<Arc<DefaultGovernorConfig>, RateLimitError> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
        .ok_or(RateLimitError {
            per_second: config.per_second,
            burst_size: config.burst_size,
        })
}

/// Wrap `router` in the limiter when enabled
pub fn apply(router: Router, config: &RateLimitConfig) -> Result<Router, RateLimitError> {
    if !config.enabled {
        return Ok(router);
    }
    let governor = create_governor_config(config)?;
    info!(
        per_second = config.per_second,
        burst_size = config.burst_size,
        "Rate limiting enabled"
    );
    Ok(router.layer(GovernorLayer { config: governor }))
}
