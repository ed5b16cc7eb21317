//! Vehicle Fault Service
//!
//! HTTP front end for the fault inference pipeline: prediction, model
//! diagnostics, health and metrics.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use inference_engine::{locate_and_load, ArtifactLocator, InferenceEngine, LoadReport};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{LogConfig, ServiceConfig};
pub use error::ApiError;

/// Application state shared across handlers. Built once at startup and
/// never mutated.
pub struct AppState {
    /// Present only when every artifact loaded
    pub engine: Option<Arc<InferenceEngine>>,
    /// Startup failure reported to every prediction request
    pub load_error: Option<String>,
    pub models_dir: Option<PathBuf>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State from a startup load attempt
    pub fn from_report(report: LoadReport) -> Self {
        let (engine, load_error) = match report.result {
            Ok(models) => (Some(Arc::new(InferenceEngine::new(models))), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            engine,
            load_error,
            models_dir: report.models_dir,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    pub fn with_engine(engine: InferenceEngine) -> Self {
        Self {
            models_dir: engine.models().dir().map(PathBuf::from),
            engine: Some(Arc::new(engine)),
            load_error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub models_loaded: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::pages::index))
        .route("/predict", post(routes::predict::predict))
        .route("/debug_models", get(routes::diagnostics::debug_models))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(routes::diagnostics::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.load_error.is_some() {
        "degraded"
    } else {
        "healthy"
    };
    Json(HealthResponse {
        status,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        models_loaded: state.engine.is_some(),
    })
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Load models and run the server until it stops
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let report = tokio::task::spawn_blocking(|| locate_and_load(&ArtifactLocator::from_env())).await?;
    let mut state = AppState::from_report(report);
    if let Some(e) = &state.load_error {
        warn!(error = %e, "Serving without models");
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!(error = %e, "Metrics recorder not installed"),
    }

    let app = rate_limit::apply(create_router(Arc::new(state)), &config.rate_limit)?;

    info!("Starting API server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
