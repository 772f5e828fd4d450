//! History walks over a git repository.

use std::path::{Component, Path, PathBuf};

use git2::{DiffOptions, ErrorCode, Oid, Repository, Sort};

use crate::walk::{collect_history, HistoryPager, DEFAULT_PAGE_SIZE};
use crate::{HistoryEntry, HistoryError, HistorySource};

/// [`HistorySource`] backed by the git repository containing the site.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_dir: PathBuf,
    branch: Option<String>,
    page_size: usize,
}

impl GitHistory {
    /// History source for the repository containing `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            branch: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Walk from `branch` (any revision git understands) instead of `HEAD`.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl HistorySource for GitHistory {
    fn file_history(&self, file: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
        let pager = GitPager::open(&self.repo_dir, self.branch.as_deref())?;
        let relative = pager.relative_path(file)?;

        let history = match collect_history(&pager, &relative, self.page_size) {
            Err(HistoryError::Git(e)) if e.code() == ErrorCode::UnbornBranch => {
                tracing::debug!("No commits yet, {} has no history", relative.display());
                return Ok(Vec::new());
            }
            result => result?,
        };
        tracing::debug!("{} commits touch {}", history.len(), relative.display());

        Ok(history)
    }
}

/// One repository handle per walk; [`Repository`] is not `Sync`.
struct GitPager<'a> {
    repo: Repository,
    branch: Option<&'a str>,
}

impl<'a> GitPager<'a> {
    fn open(dir: &Path, branch: Option<&'a str>) -> Result<Self, HistoryError> {
        let repo = Repository::discover(dir)?;
        Ok(Self { repo, branch })
    }

    /// Path of `file` relative to the working directory, as git sees it.
    fn relative_path(&self, file: &Path) -> Result<PathBuf, HistoryError> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| HistoryError::Bare(self.repo.path().display().to_string()))?;

        let canonical = |p: &Path| {
            p.canonicalize().map_err(|e| HistoryError::Resolve {
                path: p.display().to_string(),
                message: e.to_string(),
            })
        };
        let workdir = canonical(workdir)?;
        let file = canonical(file)?;

        file.strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| HistoryError::OutsideRepo {
                file: file.display().to_string(),
                repo: workdir.display().to_string(),
            })
    }

    /// Whether `commit` changed `path` relative to its first parent.
    fn touches(&self, commit: &git2::Commit, pathspec: &str) -> Result<bool, HistoryError> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };

        let mut opts = DiffOptions::new();
        opts.pathspec(pathspec).disable_pathspec_match(true);

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

        Ok(diff.deltas().next().is_some())
    }
}

impl HistoryPager for GitPager<'_> {
    fn tip(&self) -> Result<String, HistoryError> {
        let commit = match self.branch {
            Some(rev) => self.repo.revparse_single(rev)?.peel_to_commit()?,
            None => self.repo.head()?.peel_to_commit()?,
        };
        Ok(commit.id().to_string())
    }

    fn page(
        &self,
        from: &str,
        file: &Path,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        let pathspec = to_pathspec(file);

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(Oid::from_str(from)?)?;

        let mut page = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if self.touches(&commit, &pathspec)? {
                page.push(HistoryEntry::try_from(&commit)?);
                if page.len() >= limit {
                    break;
                }
            }
        }

        Ok(page)
    }
}

/// Git paths always use `/`.
fn to_pathspec(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
