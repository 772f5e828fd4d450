//! Commit history of the files backing blog posts.
//!
//! The history of a file is collected page by page: each page is a time-sorted
//! revision walk restricted to commits touching the file, and the next page
//! starts at the oldest commit collected so far. The walk ends once a page
//! brings no commit that has not been seen before.

use std::path::Path;

pub mod entry;
pub mod git;
pub mod walk;

pub use entry::HistoryEntry;
pub use git::GitHistory;
pub use walk::{collect_history, HistoryPager, DEFAULT_PAGE_SIZE};

/// Errors that can occur while walking history.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository at {0} has no working directory")]
    Bare(String),

    #[error("{file} is not inside the repository at {repo}")]
    OutsideRepo { file: String, repo: String },

    #[error("Failed to resolve {path}: {message}")]
    Resolve { path: String, message: String },

    #[error("Commit {0} has an invalid timestamp")]
    InvalidTime(String),
}

/// Source of per-file commit history.
pub trait HistorySource: Send + Sync {
    /// Full history of `file`, newest first.
    fn file_history(&self, file: &Path) -> Result<Vec<HistoryEntry>, HistoryError>;
}

/// History source used when history is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl HistorySource for NoHistory {
    fn file_history(&self, _file: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(Vec::new())
    }
}
