use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::HistoryError;

/// A commit that touched a post's source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Abbreviated hash (6 characters)
    pub sha: String,
    pub sha_full: String,
    pub message: String,
    /// Author date, in the author's offset
    pub date: DateTime<FixedOffset>,
}

impl HistoryEntry {
    pub fn new(
        sha_full: impl Into<String>,
        message: impl Into<String>,
        date: DateTime<FixedOffset>,
    ) -> Self {
        let sha_full = sha_full.into();
        Self {
            sha: sha_full.chars().take(6).collect(),
            sha_full,
            message: message.into(),
            date,
        }
    }
}

impl TryFrom<&git2::Commit<'_>> for HistoryEntry {
    type Error = HistoryError;

    fn try_from(commit: &git2::Commit<'_>) -> Result<Self, Self::Error> {
        let id = commit.id().to_string();
        let when = commit.author().when();

        let offset = FixedOffset::east_opt(when.offset_minutes() * 60)
            .ok_or_else(|| HistoryError::InvalidTime(id.clone()))?;
        let date = DateTime::from_timestamp(when.seconds(), 0)
            .ok_or_else(|| HistoryError::InvalidTime(id.clone()))?
            .with_timezone(&offset);

        let message = String::from_utf8_lossy(commit.message_bytes())
            .trim_end()
            .to_string();

        Ok(Self::new(id, message, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_sha() {
        let date = DateTime::parse_from_rfc3339("2016-03-01T12:00:00+01:00").unwrap();
        let entry = HistoryEntry::new("a1b2c3d4e5f6", "Fix typo", date);

        assert_eq!(entry.sha, "a1b2c3");
        assert_eq!(entry.sha_full, "a1b2c3d4e5f6");
    }

    #[test]
    fn serializes_date_as_rfc3339() {
        let date = DateTime::parse_from_rfc3339("2016-03-01T12:00:00+01:00").unwrap();
        let entry = HistoryEntry::new("a1b2c3d4e5f6", "Fix typo", date);

        let json = serde_json::to_string(&entry).unwrap();

        assert!(json.contains(r#""date":"2016-03-01T12:00:00+01:00""#));
        assert!(json.contains(r#""sha":"a1b2c3""#));
    }
}
