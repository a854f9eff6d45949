use crate::callback::CallbackReceiver;
use crate::config::Config;
use crate::lifecycle::probe::DEFAULT_PROBE_TIMEOUT;
use crate::lifecycle::{HttpUrlProbe, JobManager};
use crate::remote::{ConversionClient, HttpConversionClient};
use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use vodbridge_db::pool::DbPool;

pub mod error;
pub mod routes_api;
pub mod routes_callback;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub manager: Arc<JobManager>,
    pub callbacks: Arc<CallbackReceiver>,
}

impl AppContext {
    /// Wire a context around an existing manager. The callback receiver
    /// takes its key and public URL base from `config`.
    pub fn new(config: Arc<Config>, manager: Arc<JobManager>) -> Self {
        let callbacks = CallbackReceiver::new(
            Arc::clone(&manager),
            config.remote.api_key().map(String::from),
            config.remote.public_url_base().map(String::from),
        );
        Self {
            config,
            manager,
            callbacks: Arc::new(callbacks),
        }
    }

    /// Build the full context: HTTP client, URL probe, and job manager.
    ///
    /// Missing remote credentials are not fatal; the server starts and
    /// rejects operations that need the conversion service.
    pub fn from_config(config: Config, pool: DbPool) -> Result<Self> {
        let client: Option<Arc<dyn ConversionClient>> =
            match HttpConversionClient::from_config(&config) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!("Conversion service unavailable: {}", e);
                    None
                }
            };

        let probe_timeout = match config.probe.timeout_secs {
            0 => DEFAULT_PROBE_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        let probe = HttpUrlProbe::new(probe_timeout).context("Failed to create URL probe")?;

        let manager = JobManager::new(pool, client, Arc::new(probe));
        Ok(Self::new(Arc::new(config), Arc::new(manager)))
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes_api::api_routes())
        .merge(routes_callback::callback_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config, pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    tracing::info!("Callback URL: {}", config.callback_url());

    let ctx = AppContext::from_config(config, pool)?;
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
