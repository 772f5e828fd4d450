//! Named build tasks and their prerequisites.

use std::fmt;
use std::str::FromStr;

/// A build task, as triggered from the command line or a file watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Copy static resources and bundled assets
    Resources,
    /// Render the index page
    Index,
    /// Resources, then every post
    Posts,
    /// Every post, ignoring the mtime cache
    PostsNoDeps,
    /// Posts whose source changed since their last build
    PostsContentChanged,
    /// Index and posts
    Build,
}

impl Task {
    pub const ALL: [Task; 6] = [
        Task::Resources,
        Task::Index,
        Task::Posts,
        Task::PostsNoDeps,
        Task::PostsContentChanged,
        Task::Build,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::Resources => "resources",
            Task::Index => "index",
            Task::Posts => "posts",
            Task::PostsNoDeps => "posts-no-deps",
            Task::PostsContentChanged => "posts-content-changed",
            Task::Build => "build",
        }
    }

    /// Tasks that run before this one, in order.
    pub fn dependencies(self) -> &'static [Task] {
        match self {
            Task::Index => &[Task::Resources],
            Task::Posts => &[Task::Resources, Task::PostsNoDeps],
            Task::Build => &[Task::Index, Task::Posts],
            Task::Resources | Task::PostsNoDeps | Task::PostsContentChanged => &[],
        }
    }

    /// Execution order for running `tasks`: dependencies first, each task at
    /// most once.
    pub fn plan(tasks: &[Task]) -> Vec<Task> {
        fn visit(task: Task, plan: &mut Vec<Task>) {
            if plan.contains(&task) {
                return;
            }
            for dep in task.dependencies() {
                visit(*dep, plan);
            }
            plan.push(task);
        }

        let mut plan = Vec::new();
        for task in tasks {
            visit(*task, &mut plan);
        }
        plan
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown task '{0}'")]
pub struct UnknownTask(pub String);

impl FromStr for Task {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|task| task.name() == s)
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_runs_after_resources() {
        assert_eq!(Task::plan(&[Task::Index]), vec![Task::Resources, Task::Index]);
    }

    #[test]
    fn posts_runs_resources_then_posts_without_deps() {
        assert_eq!(
            Task::plan(&[Task::Posts]),
            vec![Task::Resources, Task::PostsNoDeps, Task::Posts]
        );
    }

    #[test]
    fn build_runs_resources_once() {
        assert_eq!(
            Task::plan(&[Task::Build]),
            vec![
                Task::Resources,
                Task::Index,
                Task::PostsNoDeps,
                Task::Posts,
                Task::Build
            ]
        );
    }

    #[test]
    fn merges_triggered_tasks() {
        assert_eq!(
            Task::plan(&[Task::Index, Task::PostsNoDeps, Task::Index]),
            vec![Task::Resources, Task::Index, Task::PostsNoDeps]
        );
    }

    #[test]
    fn parses_task_names() {
        for task in Task::ALL {
            assert_eq!(task.name().parse::<Task>().unwrap(), task);
        }
        assert!("deploy".parse::<Task>().is_err());
    }
}
