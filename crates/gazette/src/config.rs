//! gazette.toml loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use gazette_history::{GitHistory, HistorySource, NoHistory, DEFAULT_PAGE_SIZE};
use gazette_static::SiteConfig;
use serde::Deserialize;

/// Configuration file structure (gazette.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub site: SiteSection,
    pub paths: PathsSection,
    pub build: BuildSettings,
    pub history: HistorySettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub title: String,
    pub base_url: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            base_url: "/".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub index: PathBuf,
    pub templates: PathBuf,
    pub resources: PathBuf,
    pub posts: PathBuf,
    pub authors: PathBuf,
    pub build: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        let site = SiteConfig::default();
        Self {
            index: site.index_template,
            templates: site.templates_dir,
            resources: site.resources_dir,
            posts: site.posts_dir,
            authors: site.authors_dir,
            build: site.build_dir,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self { minify: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub enabled: bool,
    /// Branch or revision to walk, HEAD when unset
    pub branch: Option<String>,
    pub page_size: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            branch: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// A loaded config file and the directory its paths are relative to.
#[derive(Debug)]
pub struct Settings {
    pub file: ConfigFile,
    pub root: PathBuf,
}

impl Settings {
    /// Build configuration with every path resolved against the config
    /// file's directory.
    pub fn site_config(&self) -> SiteConfig {
        let paths = &self.file.paths;
        SiteConfig {
            title: self.file.site.title.clone(),
            base_url: self.file.site.base_url.clone(),
            index_template: self.root.join(&paths.index),
            templates_dir: self.root.join(&paths.templates),
            resources_dir: self.root.join(&paths.resources),
            posts_dir: self.root.join(&paths.posts),
            authors_dir: self.root.join(&paths.authors),
            build_dir: self.root.join(&paths.build),
            minify: self.file.build.minify,
        }
    }

    /// Git history of the repository holding the posts, or none when
    /// disabled.
    pub fn history_source(&self) -> Arc<dyn HistorySource> {
        let history = &self.file.history;
        if !history.enabled {
            return Arc::new(NoHistory);
        }

        Arc::new(
            GitHistory::new(self.root.join(&self.file.paths.posts))
                .with_branch(history.branch.clone())
                .with_page_size(history.page_size),
        )
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<Settings> {
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(Settings {
            file: ConfigFile::default(),
            root,
        });
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(Settings { file, root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let settings = load_config(&temp.path().join("gazette.toml")).unwrap();
        let site = settings.site_config();

        assert_eq!(site.title, "Blog");
        assert_eq!(site.posts_dir, temp.path().join("content/posts"));
        assert_eq!(site.build_dir, temp.path().join("build"));
        assert!(site.minify);
        assert!(settings.file.history.enabled);
        assert_eq!(settings.file.history.page_size, 1000);
        assert_eq!(settings.file.server.port, 8080);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gazette.toml");
        fs::write(
            &path,
            r#"
[site]
title = "Field Notes"

[paths]
posts = "posts"

[history]
branch = "main"
"#,
        )
        .unwrap();

        let settings = load_config(&path).unwrap();
        let site = settings.site_config();

        assert_eq!(site.title, "Field Notes");
        assert_eq!(site.base_url, "/");
        assert_eq!(site.posts_dir, temp.path().join("posts"));
        assert_eq!(site.authors_dir, temp.path().join("content/authors"));
        assert_eq!(settings.file.history.branch.as_deref(), Some("main"));
        assert_eq!(settings.file.history.page_size, 1000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gazette.toml");
        fs::write(&path, "[build]\nminify = \"sometimes\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn relative_config_path_keeps_relative_paths() {
        let settings = load_config(Path::new("missing-gazette.toml")).unwrap();

        assert_eq!(
            settings.site_config().index_template,
            PathBuf::from("src/index.html")
        );
    }
}
