use std::collections::HashMap;
use std::time::SystemTime;

use gazette_content::Post;

/// Source modification time of every post, as of its last build.
///
/// Lives as long as the process; nothing is persisted.
#[derive(Debug, Default)]
pub struct MtimeCache {
    built: HashMap<String, SystemTime>,
}

impl MtimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `post` has to be rendered. Full builds render everything;
    /// incremental builds skip posts whose mtime matches the recorded one.
    pub fn needs_build(&self, post: &Post, build_all: bool) -> bool {
        build_all || self.built.get(&post.id) != Some(&post.mtime)
    }

    pub fn record(&mut self, post: &Post) {
        self.built.insert(post.id.clone(), post.mtime);
    }

    pub fn len(&self) -> usize {
        self.built.len()
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;
    use tempfile::tempdir;

    fn post() -> (tempfile::TempDir, Post) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("hello.md");
        fs::write(&path, "---\ntitle: Hello\n---\nBody").unwrap();
        let post = Post::from_file(&path).unwrap();
        (temp, post)
    }

    #[test]
    fn unseen_post_needs_build() {
        let (_temp, post) = post();
        let cache = MtimeCache::new();

        assert!(cache.needs_build(&post, false));
    }

    #[test]
    fn unchanged_post_is_skipped_incrementally() {
        let (_temp, post) = post();
        let mut cache = MtimeCache::new();
        cache.record(&post);

        assert!(!cache.needs_build(&post, false));
    }

    #[test]
    fn changed_mtime_needs_build() {
        let (_temp, mut post) = post();
        let mut cache = MtimeCache::new();
        cache.record(&post);

        post.mtime += Duration::from_secs(5);

        assert!(cache.needs_build(&post, false));
    }

    #[test]
    fn older_mtime_also_needs_build() {
        let (_temp, mut post) = post();
        let mut cache = MtimeCache::new();
        cache.record(&post);

        post.mtime -= Duration::from_secs(5);

        assert!(cache.needs_build(&post, false));
    }

    #[test]
    fn full_build_ignores_cache() {
        let (_temp, post) = post();
        let mut cache = MtimeCache::new();
        cache.record(&post);

        assert!(cache.needs_build(&post, true));
    }
}
