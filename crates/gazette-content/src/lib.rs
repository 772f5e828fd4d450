//! Blog content loading.
//!
//! Reads posts (markdown with YAML frontmatter) and authors from the content
//! directories, renders post bodies to HTML and tracks source modification
//! times for incremental builds.

pub mod author;
pub mod frontmatter;
pub mod parser;
pub mod post;

pub use author::{load_authors, Author, Authors};
pub use frontmatter::Frontmatter;
pub use parser::{parse_post, render_markdown, ParseError, ParsedPost};
pub use post::{load_posts, ContentError, Post};
