use anyhow::{Context, Result};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": crate::VERSION
    }))
}

/// Full application router: API, health probe, optional static frontend
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", api::router())
        .route("/health", get(liveness))
        .with_state(state);

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http()).layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}

pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = app(state, config);
    let addr = config.bind_address();

    if let Some((cert, key)) = config.tls_paths() {
        return run_tls(&addr, cert, key, app).await;
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")
}

#[cfg(not(feature = "tls"))]
async fn run_tls(_addr: &str, _cert: &str, _key: &str, _app: Router) -> Result<()> {
    anyhow::bail!("TLS is configured but this build lacks the `tls` feature")
}

#[cfg(feature = "tls")]
async fn run_tls(addr: &str, cert: &str, key: &str, app: Router) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    // Process-wide crypto provider; a second install is a no-op error
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} and key {key}"))?;
    let addr: std::net::SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid bind address {addr}"))?;

    tracing::info!("Web server running at https://{}", addr);
    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .context("Web server failed")
}
