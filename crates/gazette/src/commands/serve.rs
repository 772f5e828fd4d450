//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::load_config;

/// Serve a built site without watching or live reload.
pub async fn run(config_path: &Path, port: Option<u16>, dir: Option<PathBuf>) -> Result<()> {
    let settings = load_config(config_path)?;
    let dir = dir.unwrap_or_else(|| settings.site_config().build_dir);

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'gazette build' first.",
            dir.display()
        );
    }

    let server = &settings.file.server;
    let addr: SocketAddr = format!("{}:{}", server.host, port.unwrap_or(server.port))
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let app = Router::new().fallback_service(ServeDir::new(&dir));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let url = format!("http://{}", addr);
    if let Err(e) = open::that(&url) {
        tracing::warn!("Failed to open browser: {}", e);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
