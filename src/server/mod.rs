//! HTTP API server and daily analysis schedule.

pub mod routes;
pub mod scheduler;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use chrono::NaiveTime;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::config::ResolvedSettings;
use crate::storage::Storage;
use crate::{Error, Result};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Storage for uploads and results. Held for the whole of an analysis run,
    /// so manual and scheduled runs never interleave.
    pub storage: Arc<Mutex<Storage>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(storage: Storage, max_upload_bytes: usize) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            max_upload_bytes,
        }
    }
}

/// Server settings, taken from resolved configuration.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS
    pub allowed_origin: String,
    pub max_upload_bytes: usize,
    /// Local time of the daily analysis, `None` to disable it
    pub schedule: Option<NaiveTime>,
}

impl ServerOptions {
    pub fn from_settings(settings: &ResolvedSettings) -> Self {
        Self {
            host: settings.host.value.clone(),
            port: settings.port.value,
            allowed_origin: settings.allowed_origin.value.clone(),
            max_upload_bytes: settings.max_upload_bytes.value,
            schedule: settings
                .schedule_enabled
                .value
                .then_some(settings.schedule_time.value),
        }
    }
}

/// Build the API router with CORS and the upload body limit applied.
pub fn build_router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| Error::Config(format!("Invalid allowed origin '{}': {}", allowed_origin, e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Ok(routes::router()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state))
}

/// Start the API server and, if configured, the daily analysis task.
///
/// Runs until Ctrl+C.
pub async fn start_server(storage: Storage, options: ServerOptions) -> Result<()> {
    let state = AppState::new(storage, options.max_upload_bytes);

    if let Some(at) = options.schedule {
        tokio::spawn(scheduler::run_daily(state.storage.clone(), at));
    } else {
        tracing::info!("scheduled analysis disabled");
    }

    let app = build_router(state, &options.allowed_origin)?;

    let host_addr: IpAddr = options
        .host
        .parse()
        .map_err(|e| Error::Config(format!("Invalid host address '{}': {}", options.host, e)))?;
    let addr = SocketAddr::from((host_addr, options.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, origin = %options.allowed_origin, "server listening");
    println!("Starting storyboard API at http://{}", addr);
    println!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
