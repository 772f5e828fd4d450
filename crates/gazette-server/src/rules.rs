//! Which source changes trigger which tasks.

use std::path::{Path, PathBuf};

use gazette_static::{SiteConfig, Task};

/// A task and the sources that trigger it.
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub paths: Vec<PathBuf>,
    pub task: Task,
}

/// Watch rules for a site, in trigger order.
#[derive(Debug, Clone)]
pub struct WatchRules {
    rules: Vec<WatchRule>,
}

impl WatchRules {
    pub fn new(rules: Vec<WatchRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| WatchRule {
                paths: rule.paths.iter().map(|p| absolutize(p)).collect(),
                task: rule.task,
            })
            .collect();

        Self { rules }
    }

    /// The rules of watch mode:
    ///
    /// - posts, the entry template or templates re-render the index
    /// - the entry template or templates re-render every post
    /// - posts or authors re-render posts whose source changed
    pub fn for_site(config: &SiteConfig) -> Self {
        Self::new(vec![
            WatchRule {
                paths: vec![
                    config.posts_dir.clone(),
                    config.index_template.clone(),
                    config.templates_dir.clone(),
                ],
                task: Task::Index,
            },
            WatchRule {
                paths: vec![config.index_template.clone(), config.templates_dir.clone()],
                task: Task::PostsNoDeps,
            },
            WatchRule {
                paths: vec![config.posts_dir.clone(), config.authors_dir.clone()],
                task: Task::PostsContentChanged,
            },
        ])
    }

    /// Every path any rule watches, each once.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for path in self.rules.iter().flat_map(|rule| &rule.paths) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    /// Tasks triggered by `changed`, in rule order, each once.
    pub fn tasks_for(&self, changed: &[PathBuf]) -> Vec<Task> {
        let changed: Vec<PathBuf> = changed.iter().map(|p| absolutize(p)).collect();

        self.rules
            .iter()
            .filter(|rule| {
                changed
                    .iter()
                    .any(|path| rule.paths.iter().any(|watched| path.starts_with(watched)))
            })
            .map(|rule| rule.task)
            .fold(Vec::new(), |mut tasks, task| {
                if !tasks.contains(&task) {
                    tasks.push(task);
                }
                tasks
            })
    }
}

/// Canonical form of `path` when it exists, otherwise joined onto the
/// current directory.
fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            return cwd.join(path);
        }
    }
    path.to_path_buf()
}
