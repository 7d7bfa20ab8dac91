use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use super::api::{self, AppState};
use super::compose::RendererRegistry;
use super::db::{DbHandle, SectionDb};
use super::ws;

pub const DEFAULT_PORT: u16 = 3140;

/// Configuration for the section server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub db_path: PathBuf,
    pub admin_token: Option<String>,
    pub site_title: String,
    pub dev_mode: bool,
    /// Open the homepage in a browser once listening.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_string(),
            db_path: PathBuf::from(".composer/sections.db"),
            admin_token: None,
            site_title: "Homepage".to_string(),
            dev_mode: false,
            open_browser: false,
        }
    }
}

/// Build the full application router: API, WebSocket feed and homepage.
pub fn build_router(state: Arc<AppState>) -> Router {
    let ws_tx = state.ws_tx.clone();

    api::api_router()
        .route(
            "/ws",
            get(move |ws_upgrade| ws::ws_handler_with_sender(ws_upgrade, ws_tx)),
        )
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No route for {}", uri.path())})),
    )
}

/// Open the database and run the server until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = SectionDb::new(&config.db_path).context("Failed to initialize section database")?;
    let (ws_tx, _rx) = broadcast::channel::<String>(256);

    if config.admin_token.is_none() {
        warn!("no admin token configured, admin routes accept unauthenticated writes");
    }

    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        ws_tx,
        renderers: RendererRegistry::builtin(),
        admin_token: config.admin_token.clone(),
        site_title: config.site_title.clone(),
    });

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    let url = format!("http://{}", local_addr);
    info!(%url, db = %config.db_path.display(), dev = config.dev_mode, "section server listening");
    println!("Section composer running at {}", url);

    if config.open_browser {
        if let Err(e) = open::that(&url) {
            warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        return;
    }
    info!("shutting down");
}
