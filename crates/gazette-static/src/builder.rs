//! Task runner for the blog build.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tokio::task::JoinSet;

use gazette_content::{load_authors, load_posts, ContentError, Post};
use gazette_history::{HistoryError, HistorySource, NoHistory};

use crate::cache::MtimeCache;
use crate::config::SiteConfig;
use crate::data::{index_data, post_data};
use crate::pipeline::{NoReload, ReloadNotifier, Rendered};
use crate::resources::copy_resources;
use crate::task::Task;
use crate::templates::TemplateEngine;

/// Result of a task run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Tasks executed, dependencies included
    pub tasks: Vec<Task>,

    /// Number of pages written
    pub pages: usize,

    /// Posts left alone by an incremental run
    pub skipped: usize,

    /// Number of resource files written
    pub resources: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read input: {0}")]
    ReadError(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Failed to load history: {0}")]
    History(#[from] HistoryError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("History task failed: {0}")]
    Join(String),
}

/// Runs build tasks and remembers which posts were built.
///
/// Keep one builder for the lifetime of the process so incremental post
/// builds can compare against earlier runs.
pub struct SiteBuilder {
    config: SiteConfig,
    history: Arc<dyn HistorySource>,
    notifier: Arc<dyn ReloadNotifier>,
    mtimes: MtimeCache,
}

impl SiteBuilder {
    /// Create a builder without history lookups or reload notifications.
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            history: Arc::new(NoHistory),
            notifier: Arc::new(NoReload),
            mtimes: MtimeCache::new(),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySource>) -> Self {
        self.history = history;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReloadNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn mtimes(&self) -> &MtimeCache {
        &self.mtimes
    }

    /// Run `task` after its dependencies.
    pub async fn run(&mut self, task: Task) -> Result<BuildResult, BuildError> {
        self.run_all(&[task]).await
    }

    /// Run several tasks, each shared dependency once. The first failure
    /// aborts the run.
    pub async fn run_all(&mut self, tasks: &[Task]) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let plan = Task::plan(tasks);
        let mut result = BuildResult {
            output_dir: self.config.build_dir.clone(),
            ..Default::default()
        };

        for task in &plan {
            tracing::debug!("Starting '{}'", task);
            match task {
                Task::Resources => result.resources += self.resources()?,
                Task::Index => {
                    self.index()?;
                    result.pages += 1;
                }
                Task::PostsNoDeps | Task::PostsContentChanged => {
                    let build_all = *task == Task::PostsNoDeps;
                    let (built, skipped) = self.posts(build_all).await?;
                    result.pages += built;
                    result.skipped += skipped;
                }
                // Only sequence their dependencies
                Task::Posts | Task::Build => {}
            }
        }

        result.tasks = plan;
        result.duration_ms = start.elapsed().as_millis() as u64;

        Ok(result)
    }

    /// Copy static resources into the build directory.
    pub fn resources(&self) -> Result<usize, BuildError> {
        let written = copy_resources(
            &self.config.resources_dir,
            &self.config.build_dir,
            self.config.minify,
        )?;
        self.notifier.reload(&self.config.build_dir);

        Ok(written)
    }

    /// Render the index page.
    pub fn index(&self) -> Result<PathBuf, BuildError> {
        let posts = load_posts(&self.config.posts_dir)?;
        let authors = load_authors(&self.config.authors_dir)?;
        let engine = self.template_engine()?;

        let html = engine
            .render(index_data(&self.config, &posts, &authors))
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let written = Rendered::new(html)
            .minified(self.config.minify)
            .renamed("index.html")
            .write_to(&self.config.build_dir)?;
        self.notifier.reload(&written);

        tracing::info!("Built index with {} posts", posts.len());

        Ok(written)
    }

    /// Render post pages. Returns the number of posts built and skipped.
    ///
    /// With `build_all` every post is rendered; otherwise only posts whose
    /// source mtime differs from the one recorded at their last build.
    pub async fn posts(&mut self, build_all: bool) -> Result<(usize, usize), BuildError> {
        let posts = load_posts(&self.config.posts_dir)?;
        let authors = load_authors(&self.config.authors_dir)?;

        let total = posts.len();
        let selected: Vec<Post> = posts
            .into_iter()
            .filter(|post| self.mtimes.needs_build(post, build_all))
            .collect();
        let skipped = total - selected.len();

        if selected.is_empty() {
            tracing::info!("No posts to build");
            return Ok((0, skipped));
        }

        let posts = self.load_histories(selected).await?;
        let engine = self.template_engine()?;

        let config = &self.config;
        let written: Vec<PathBuf> = posts
            .par_iter()
            .map(|post| {
                tracing::info!("Building output for post '{}'...", post.id);

                let html = engine
                    .render(post_data(config, post, &authors))
                    .map_err(|e| {
                        BuildError::TemplateError(format!("post '{}': {}", post.id, e))
                    })?;

                Rendered::new(html)
                    .renamed(post.output_path())
                    .minified(config.minify)
                    .write_to(&config.build_dir)
            })
            .collect::<Result<_, _>>()?;

        for (post, path) in posts.iter().zip(&written) {
            self.mtimes.record(post);
            self.notifier.reload(path);
        }

        Ok((written.len(), skipped))
    }

    /// Look up the history of every post concurrently, keeping their order.
    async fn load_histories(&self, posts: Vec<Post>) -> Result<Vec<Post>, BuildError> {
        let mut lookups = JoinSet::new();

        for (position, mut post) in posts.into_iter().enumerate() {
            let history = Arc::clone(&self.history);
            lookups.spawn_blocking(move || {
                post.history = Some(history.file_history(&post.file)?);
                Ok::<_, HistoryError>((position, post))
            });
        }

        let mut loaded = Vec::with_capacity(lookups.len());
        while let Some(joined) = lookups.join_next().await {
            let (position, post) = joined.map_err(|e| BuildError::Join(e.to_string()))??;
            loaded.push((position, post));
        }

        loaded.sort_by_key(|(position, _)| *position);

        Ok(loaded.into_iter().map(|(_, post)| post).collect())
    }

    /// A fresh engine per run, so template edits are picked up.
    fn template_engine(&self) -> Result<TemplateEngine, BuildError> {
        let engine = TemplateEngine::new(&self.config.templates_dir);

        match fs::read_to_string(&self.config.index_template) {
            Ok(source) => engine
                .with_entry(source)
                .map_err(|e| BuildError::TemplateError(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    "{} not found, using the built-in entry template",
                    self.config.index_template.display()
                );
                Ok(engine)
            }
            Err(e) => Err(BuildError::ReadError(format!(
                "{}: {}",
                self.config.index_template.display(),
                e
            ))),
        }
    }
}
