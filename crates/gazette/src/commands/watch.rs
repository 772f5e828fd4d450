//! Watch command: build, serve with live reload, rebuild on change.

use std::path::Path;

use anyhow::Result;
use gazette_server::{DevServer, DevServerConfig};
use gazette_static::SiteBuilder;

use crate::config::load_config;

/// Run watch mode until interrupted.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let settings = load_config(config_path)?;

    let config = DevServerConfig {
        host: settings.file.server.host.clone(),
        port: port.unwrap_or(settings.file.server.port),
        open,
        ..Default::default()
    };

    tracing::info!("Starting watch mode on port {}", config.port);

    let builder =
        SiteBuilder::new(settings.site_config()).with_history(settings.history_source());

    DevServer::new(config, builder).start().await?;

    Ok(())
}
