use anyhow::{Context, Result};
use axum::{Router, http::HeaderValue, routing::get};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::MakeSpan;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

mod config;
mod handlers;
mod metrics;
#[cfg(test)]
mod test_helpers;
mod ws;

use config::{FileConfig, ServerConfig, load_config};
use metrics::ServerMetrics;
use ws::VoyageHub;

/// Span maker that stamps each request with a unique id.
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[derive(Parser)]
#[command(name = "voyage")]
#[command(about = "Real-time voyage rooms with exclusive crew roles")]
struct Cli {
    /// Config file (defaults to ./voyage.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub hub: Arc<VoyageHub>,
    pub server_config: Arc<ServerConfig>,
    pub metrics: Arc<ServerMetrics>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_directive = if cli.debug {
        "voyage=debug,voyage_hub=debug,tower_http=debug,info"
    } else {
        "voyage=info,voyage_hub=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let mut file_config: FileConfig = load_config(cli.config.as_deref())
        .extract()
        .context("Failed to load configuration")?;
    if let Some(host) = cli.host {
        file_config.server.host = host;
    }
    if let Some(port) = cli.port {
        file_config.server.port = port;
    }

    let server_config = ServerConfig::from_file(&file_config)?;
    let hub_config = file_config.hub.to_hub_config();
    info!(
        "[HUB] Limited roles: {:?}, send timeout: {:?}, history: {}",
        hub_config.limited_roles, hub_config.send_timeout, hub_config.history_limit
    );

    let cors = cors_layer(&server_config.allowed_origins);
    let app_state = AppState {
        hub: Arc::new(VoyageHub::new(hub_config)),
        server_config: Arc::new(server_config.clone()),
        metrics: Arc::new(ServerMetrics::new()),
    };

    let app = build_router(app_state)
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr))?;
    let actual_addr = listener.local_addr()?;

    info!("Voyage hub listening on http://{}", actual_addr);
    info!("");
    info!("Endpoints:");
    info!("  WS     /ws/{{voyage_id}}/{{role}}        - Join a voyage");
    info!("  GET    /api/voyages/{{voyage_id}}        - Voyage summary");
    info!("  GET    /api/voyages/{{voyage_id}}/roles  - Role occupancy");
    info!("  GET    /health                           - Health check");
    info!("  GET    /metrics                          - Server metrics");

    // Create shutdown signal handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received shutdown signal, closing voyages...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Voyage hub stopped");
    Ok(())
}

/// All routes, state applied. Tracing and CORS layers are added by the caller.
pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/architecture", get(handlers::architecture_handler))
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/voyages/{voyage_id}", get(handlers::get_voyage))
        .route(
            "/api/voyages/{voyage_id}/roles",
            get(handlers::get_role_status),
        )
        .route(
            "/ws/{voyage_id}/{role}",
            get(handlers::voyage_websocket_handler),
        )
        .with_state(state)
}

/// Restrict CORS to the configured origins; an empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
