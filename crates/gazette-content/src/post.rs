//! Posts loaded from the content directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;
use serde::Serialize;
use walkdir::WalkDir;

use gazette_history::HistoryEntry;

use crate::parser::parse_post;

/// Errors that can occur when loading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read content: {0}")]
    ReadError(String),

    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid url '{url}' for post '{id}'")]
    InvalidUrl { id: String, url: String },

    #[error("Duplicate post id '{id}': {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
}

/// A blog post.
///
/// Read fresh from disk on every task run; `history` is only filled in by the
/// posts task.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// File stem of the source file
    pub id: String,

    /// Source file path
    #[serde(skip)]
    pub file: PathBuf,

    /// Modification time of the source file
    #[serde(skip)]
    pub mtime: SystemTime,

    /// Destination URL, relative to the site root, without surrounding slashes
    pub url: String,

    pub title: String,
    pub date: Option<NaiveDate>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,

    /// Rendered body HTML
    pub content: String,

    /// Description, or the first paragraph of the body
    pub excerpt: String,

    /// Commit history of the source file, newest first
    pub history: Option<Vec<HistoryEntry>>,

    #[serde(skip)]
    draft: bool,
}

impl Post {
    /// Read and parse a single post file.
    pub fn from_file(path: &Path) -> Result<Self, ContentError> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::ReadError(format!("{}: bad file name", path.display())))?
            .to_string();

        let source = fs::read_to_string(path)
            .map_err(|e| ContentError::ReadError(format!("{}: {}", path.display(), e)))?;
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| ContentError::ReadError(format!("{}: {}", path.display(), e)))?;

        let parsed = parse_post(&source).map_err(|e| ContentError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let fm = parsed.frontmatter.unwrap_or_default();

        let url = normalize_url(&id, fm.url.as_deref().unwrap_or(&id))?;
        let title = if fm.title.is_empty() {
            id.clone()
        } else {
            fm.title
        };
        let excerpt = fm.description.clone().unwrap_or(parsed.excerpt);

        Ok(Self {
            id,
            file: path.to_path_buf(),
            mtime,
            url,
            title,
            date: fm.date,
            author: fm.author,
            description: fm.description,
            tags: fm.tags,
            content: parsed.html,
            excerpt,
            history: None,
            draft: fm.draft,
        })
    }

    /// Output path of the post page, relative to the build directory.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.url).join("index.html")
    }

    pub fn is_draft(&self) -> bool {
        self.draft
    }
}

/// Trim surrounding slashes and reject urls escaping the build directory.
fn normalize_url(id: &str, url: &str) -> Result<String, ContentError> {
    let trimmed = url.trim_matches('/');
    let valid = !trimmed.is_empty()
        && Path::new(trimmed)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(ContentError::InvalidUrl {
            id: id.to_string(),
            url: url.to_string(),
        })
    }
}

/// Load all non-draft posts below `dir`, newest first.
pub fn load_posts(dir: &Path) -> Result<Vec<Post>, ContentError> {
    if !dir.exists() {
        return Err(ContentError::ReadError(format!(
            "Posts directory not found: {}",
            dir.display()
        )));
    }

    let mut posts: Vec<Post> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "md" && ext != "markdown" {
            continue;
        }

        let post = Post::from_file(path)?;
        if post.is_draft() {
            tracing::debug!("Skipping draft '{}'", post.id);
            continue;
        }

        if let Some(first) = seen.insert(post.id.clone(), post.file.clone()) {
            return Err(ContentError::DuplicateId {
                id: post.id,
                first: first.display().to_string(),
                second: path.display().to_string(),
            });
        }

        posts.push(post);
    }

    // Newest first, undated last
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_post(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn output_path_is_url_joined_with_index() {
        let temp = tempdir().unwrap();
        let path = write_post(
            temp.path(),
            "hello.md",
            "---\ntitle: Hello\nurl: /2016/hello-world/\n---\nBody",
        );

        let post = Post::from_file(&path).unwrap();

        assert_eq!(post.url, "2016/hello-world");
        assert_eq!(
            post.output_path(),
            PathBuf::from("2016/hello-world/index.html")
        );
    }

    #[test]
    fn url_defaults_to_id() {
        let temp = tempdir().unwrap();
        let path = write_post(temp.path(), "first-post.md", "---\ntitle: First\n---\nHi");

        let post = Post::from_file(&path).unwrap();

        assert_eq!(post.id, "first-post");
        assert_eq!(post.output_path(), PathBuf::from("first-post/index.html"));
    }

    #[test]
    fn title_falls_back_to_id() {
        let temp = tempdir().unwrap();
        write_post(temp.path(), "untitled.md", "---\ndate: 2016-03-01\n---\nNo title.");
        write_post(temp.path(), "bare.md", "Just a body.");

        let posts = load_posts(temp.path()).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| (p.id.as_str(), p.title.as_str())).collect();

        assert_eq!(titles, vec![("untitled", "untitled"), ("bare", "bare")]);
        assert_eq!(posts[0].date, NaiveDate::from_ymd_opt(2016, 3, 1));
    }

    #[test]
    fn rejects_escaping_url() {
        let temp = tempdir().unwrap();
        let path = write_post(temp.path(), "evil.md", "---\ntitle: Evil\nurl: ../outside\n---\n");

        let result = Post::from_file(&path);

        assert!(matches!(result, Err(ContentError::InvalidUrl { .. })));
    }

    #[test]
    fn loads_posts_newest_first_without_drafts() {
        let temp = tempdir().unwrap();
        write_post(temp.path(), "old.md", "---\ntitle: Old\ndate: 2015-01-01\n---\nOld");
        write_post(temp.path(), "new.md", "---\ntitle: New\ndate: 2017-06-01\n---\nNew");
        write_post(temp.path(), "wip.md", "---\ntitle: WIP\ndraft: true\n---\nWIP");
        write_post(temp.path(), "notes.txt", "not a post");

        let posts = load_posts(temp.path()).unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(posts[0].excerpt, "New");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("2016")).unwrap();
        write_post(temp.path(), "same.md", "---\ntitle: A\n---\n");
        write_post(&temp.path().join("2016"), "same.md", "---\ntitle: B\n---\n");

        let result = load_posts(temp.path());

        assert!(matches!(result, Err(ContentError::DuplicateId { .. })));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().unwrap();

        let result = load_posts(&temp.path().join("nope"));

        assert!(matches!(result, Err(ContentError::ReadError(_))));
    }
}
