//! Paginated history accumulation.

use std::collections::HashSet;
use std::path::Path;

use crate::{HistoryEntry, HistoryError};

/// Number of commits fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Fetches pages of a file's history.
pub trait HistoryPager {
    /// Full hash of the commit the walk starts from.
    fn tip(&self) -> Result<String, HistoryError>;

    /// Up to `limit` commits touching `file`, newest first, walking from
    /// `from` (inclusive).
    fn page(&self, from: &str, file: &Path, limit: usize)
        -> Result<Vec<HistoryEntry>, HistoryError>;
}

/// Collect the full history of `file`, newest first.
///
/// Every page after the first starts at the oldest commit collected so far, so
/// it repeats that commit; a page without any unseen commit ends the walk.
/// `page_size` is raised to 2 since a single-commit page could only ever
/// repeat its starting commit.
pub fn collect_history<P>(
    pager: &P,
    file: &Path,
    page_size: usize,
) -> Result<Vec<HistoryEntry>, HistoryError>
where
    P: HistoryPager + ?Sized,
{
    let page_size = page_size.max(2);

    let tip = pager.tip()?;
    let mut history = pager.page(&tip, file, page_size)?;
    let mut seen: HashSet<String> = history.iter().map(|e| e.sha_full.clone()).collect();

    while let Some(last) = history.last() {
        let page = pager.page(&last.sha_full, file, page_size)?;
        let fresh: Vec<HistoryEntry> = page
            .into_iter()
            .filter(|e| seen.insert(e.sha_full.clone()))
            .collect();

        if fresh.is_empty() {
            break;
        }

        tracing::trace!("Collected {} more commits for {}", fresh.len(), file.display());
        history.extend(fresh);
    }

    Ok(history)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::DateTime;

    use super::*;

    /// A linear history, newest first, where every commit touches the file.
    struct FakePager {
        commits: Vec<HistoryEntry>,
        calls: RefCell<Vec<String>>,
    }

    impl FakePager {
        fn new(count: usize) -> Self {
            let date = DateTime::parse_from_rfc3339("2016-03-01T12:00:00+00:00").unwrap();
            let commits = (0..count)
                .rev()
                .map(|i| HistoryEntry::new(format!("{:040}", i), format!("commit {}", i), date))
                .collect();
            Self {
                commits,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl HistoryPager for FakePager {
        fn tip(&self) -> Result<String, HistoryError> {
            Ok(self
                .commits
                .first()
                .map(|c| c.sha_full.clone())
                .unwrap_or_else(|| "0".repeat(40)))
        }

        fn page(
            &self,
            from: &str,
            _file: &Path,
            limit: usize,
        ) -> Result<Vec<HistoryEntry>, HistoryError> {
            self.calls.borrow_mut().push(from.to_string());
            let start = self
                .commits
                .iter()
                .position(|c| c.sha_full == from)
                .unwrap_or(self.commits.len());
            Ok(self.commits[start..].iter().take(limit).cloned().collect())
        }
    }

    struct FailingPager;

    impl HistoryPager for FailingPager {
        fn tip(&self) -> Result<String, HistoryError> {
            Ok("abc".to_string())
        }

        fn page(&self, _: &str, _: &Path, _: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
            Err(HistoryError::InvalidTime("abc".to_string()))
        }
    }

    #[test]
    fn stops_when_page_only_repeats_last_commit() {
        let pager = FakePager::new(3);

        let history = collect_history(&pager, Path::new("post.md"), 10).unwrap();

        assert_eq!(history.len(), 3);
        // First page from the tip, second page from the oldest commit only repeats it
        assert_eq!(pager.calls.borrow().len(), 2);
        assert_eq!(pager.calls.borrow()[1], history[2].sha_full);
    }

    #[test]
    fn accumulates_across_pages_without_duplicates() {
        let pager = FakePager::new(7);

        let history = collect_history(&pager, Path::new("post.md"), 3).unwrap();

        let shas: Vec<_> = history.iter().map(|e| e.sha_full.clone()).collect();
        let expected: Vec<_> = pager.commits.iter().map(|e| e.sha_full.clone()).collect();
        assert_eq!(shas, expected);
        // Pages: [6 5 4] [4 3 2] [2 1 0] [0]
        assert_eq!(pager.calls.borrow().len(), 4);
    }

    #[test]
    fn raises_page_size_of_one() {
        let pager = FakePager::new(4);

        let history = collect_history(&pager, Path::new("post.md"), 1).unwrap();

        assert_eq!(history.len(), 4);
    }

    #[test]
    fn empty_history_ends_immediately() {
        let pager = FakePager::new(0);

        let history = collect_history(&pager, Path::new("post.md"), DEFAULT_PAGE_SIZE).unwrap();

        assert!(history.is_empty());
        assert_eq!(pager.calls.borrow().len(), 1);
    }

    #[test]
    fn propagates_page_errors() {
        let result = collect_history(&FailingPager, Path::new("post.md"), DEFAULT_PAGE_SIZE);

        assert!(matches!(result, Err(HistoryError::InvalidTime(_))));
    }
}
