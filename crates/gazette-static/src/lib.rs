//! Blog build tasks.
//!
//! Renders the index page and post pages through the output pipeline
//! (template, HTML minification, rename, write, live reload) and keeps the
//! per-post modification times used by incremental rebuilds.

pub mod builder;
pub mod cache;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod resources;
pub mod task;
pub mod templates;

pub use builder::{BuildError, BuildResult, SiteBuilder};
pub use cache::MtimeCache;
pub use config::SiteConfig;
pub use pipeline::{NoReload, ReloadNotifier, Rendered};
pub use task::{Task, UnknownTask};
pub use templates::TemplateEngine;
