//! Task commands: index, posts, resources and build.

use std::path::Path;

use anyhow::{Context, Result};
use gazette_static::{SiteBuilder, Task};

use crate::config::load_config;

/// Run `task` and its dependencies once.
pub async fn run(config_path: &Path, task: Task) -> Result<()> {
    tracing::info!("Running '{}'...", task);

    let settings = load_config(config_path)?;
    let mut builder =
        SiteBuilder::new(settings.site_config()).with_history(settings.history_source());

    let result = builder
        .run(task)
        .await
        .with_context(|| format!("Task '{}' failed", task))?;

    tracing::info!(
        "Wrote {} pages and {} resources in {}ms",
        result.pages,
        result.resources,
        result.duration_ms
    );
    if result.skipped > 0 {
        tracing::info!("{} posts unchanged", result.skipped);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
