//! Post source parser.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A parsed post source file.
#[derive(Debug, Clone)]
pub struct ParsedPost {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Markdown body (without frontmatter)
    pub markdown: String,

    /// Rendered body HTML
    pub html: String,

    /// Plain text of the first paragraph
    pub excerpt: String,
}

/// Errors that can occur when parsing a post.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Parse a post: frontmatter, rendered body and excerpt.
pub fn parse_post(source: &str) -> Result<ParsedPost, ParseError> {
    let (frontmatter, body) = extract_frontmatter(source)?;

    Ok(ParsedPost {
        frontmatter,
        markdown: body.to_string(),
        html: render_markdown(body),
        excerpt: first_paragraph(body),
    })
}

/// Render markdown to HTML.
pub fn render_markdown(content: &str) -> String {
    let parser = Parser::new_ext(content, markdown_options());

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

/// Extract the text of the first paragraph, markup stripped.
fn first_paragraph(content: &str) -> String {
    let mut in_paragraph = false;
    let mut text = String::new();

    for event in Parser::new_ext(content, markdown_options()) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(TagEnd::Paragraph) => break,
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_complete_post() {
        let source = r#"---
title: Footers
description: Sticky footers done right
---

# Footers

A footer that *follows* you,
until it doesn't.

| a | b |
|---|---|
| 1 | 2 |
"#;

        let post = parse_post(source).unwrap();

        let fm = post.frontmatter.unwrap();
        assert_eq!(fm.title, "Footers");
        assert_eq!(fm.description.as_deref(), Some("Sticky footers done right"));

        assert!(post.html.contains("<h1>Footers</h1>"));
        assert!(post.html.contains("<em>follows</em>"));
        assert!(post.html.contains("<table>"));
        assert_eq!(post.excerpt, "A footer that follows you, until it doesn't.");
    }

    #[test]
    fn parses_without_frontmatter() {
        let post = parse_post("Just `code` and text.").unwrap();

        assert!(post.frontmatter.is_none());
        assert_eq!(post.excerpt, "Just code and text.");
    }

    #[test]
    fn excerpt_is_empty_without_paragraphs() {
        let post = parse_post("# Only a heading").unwrap();

        assert_eq!(post.excerpt, "");
    }
}
