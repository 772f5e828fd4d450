//! Frontmatter extraction and parsing.

use chrono::NaiveDate;
use serde::Deserialize;

/// Parsed frontmatter of a post.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Post title, the post id when empty
    #[serde(default)]
    pub title: String,

    /// Publication date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<NaiveDate>,

    /// Author id, matching a file stem in the authors directory
    #[serde(default)]
    pub author: Option<String>,

    /// Short summary, used as excerpt on the index page
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Destination URL override
    #[serde(default)]
    pub url: Option<String>,

    /// Drafts are not built
    #[serde(default)]
    pub draft: bool,
}

/// Split a leading `---` fenced YAML block from the post body.
///
/// The fences must be whole lines. A `---` first line followed by a blank
/// line is a thematic break, not frontmatter.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let Some((first, rest)) = source.split_once('\n') else {
        return Ok((None, source));
    };
    let opens = first.trim_end() == "---"
        && rest.lines().next().is_some_and(|line| !line.trim().is_empty());
    if !opens {
        return Ok((None, source));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = rest[..offset].trim();
            let body = &rest[offset + line.len()..];

            let frontmatter = if yaml.is_empty() {
                Frontmatter::default()
            } else {
                serde_yaml::from_str(yaml)
                    .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
            };
            return Ok((Some(frontmatter), body.trim_start()));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed)
}

#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Frontmatter block has no closing --- line")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_valid_frontmatter() {
        let source = r#"---
title: Hello Rust
date: 2016-03-01
author: danny
tags: [rust, blogging]
---

# Hello
"#;

        let (fm, content) = extract_frontmatter(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.title, "Hello Rust");
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2016, 3, 1));
        assert_eq!(fm.author.as_deref(), Some("danny"));
        assert_eq!(fm.tags, vec!["rust".to_string(), "blogging".to_string()]);
        assert!(!fm.draft);
        assert!(content.starts_with("# Hello"));
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo frontmatter here.";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let result = extract_frontmatter("---\ntitle: Test\n# No closing");

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn title_may_be_left_out() {
        let (fm, content) = extract_frontmatter("---\ndate: 2020-01-01\n---\nBody").unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.title, "");
        assert_eq!(fm.date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(content, "Body");
    }

    #[test]
    fn empty_block_is_default_frontmatter() {
        let (fm, content) = extract_frontmatter("---\n---\nBody").unwrap();

        assert_eq!(fm, Some(Frontmatter::default()));
        assert_eq!(content, "Body");
    }

    #[test]
    fn leading_thematic_break_is_body() {
        let source = "---\n\nAfter the rule.\n";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn fences_must_be_whole_lines() {
        let result = extract_frontmatter("---\ntitle: Dashes\n---more\n");
        assert!(matches!(result, Err(FrontmatterError::Unclosed)));

        let (fm, content) = extract_frontmatter("----\ntitle: Dashes\n---\n").unwrap();
        assert!(fm.is_none());
        assert!(content.starts_with("----"));
    }
}
