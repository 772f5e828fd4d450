//! Output pipeline: rendered page -> minify -> rename -> write -> reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::builder::BuildError;

/// Notified after every file written to the build directory.
pub trait ReloadNotifier: Send + Sync {
    fn reload(&self, path: &Path);
}

/// Notifier for one-shot builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReload;

impl ReloadNotifier for NoReload {
    fn reload(&self, _path: &Path) {}
}

/// A rendered page on its way to the build directory.
#[derive(Debug, Clone)]
pub struct Rendered {
    path: PathBuf,
    html: String,
}

impl Rendered {
    /// A page rendered from the entry template, named after it.
    pub fn new(html: String) -> Self {
        Self {
            path: PathBuf::from(crate::templates::ENTRY_TEMPLATE),
            html,
        }
    }

    pub fn minified(mut self, enabled: bool) -> Self {
        if enabled {
            self.html = minify_html(&self.html);
        }
        self
    }

    /// Change the output path, relative to the build directory.
    pub fn renamed(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Write below `build_dir`, returning the written file.
    pub fn write_to(&self, build_dir: &Path) -> Result<PathBuf, BuildError> {
        let target = build_dir.join(&self.path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(&target, &self.html)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", target.display(), e)))?;

        Ok(target)
    }
}

/// Preformatted elements, comments, or a whitespace run containing a line break.
fn tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:pre|textarea|script)\b.*?</(?:pre|textarea|script)>|<!--.*?-->|\s*\n\s*")
            .expect("valid regex")
    })
}

/// Elements whose surrounding whitespace does not render.
const BLOCK_TAGS: &[&str] = &[
    "!doctype", "html", "head", "body", "title", "meta", "link", "style", "script", "noscript",
    "header", "footer", "main", "nav", "section", "article", "aside", "div", "p", "pre",
    "blockquote", "hr", "br", "ul", "ol", "li", "dl", "dt", "dd", "table", "thead", "tbody",
    "tfoot", "tr", "th", "td", "h1", "h2", "h3", "h4", "h5", "h6", "figure", "figcaption",
    "form", "details", "summary",
];

/// Whether `tag` (starting at its `<`) opens or closes a block element.
fn is_block_tag(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '!')
        .collect::<String>()
        .to_ascii_lowercase();

    BLOCK_TAGS.contains(&name.as_str())
}

/// Drop comments and line breaks around block tags.
///
/// A line break between two inline tags becomes a single space. `<pre>`,
/// `<textarea>` and `<script>` contents are left untouched, as are
/// conditional comments.
pub fn minify_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for m in tokens().find_iter(html) {
        out.push_str(&html[last..m.start()]);
        last = m.end();

        let token = m.as_str();
        if token.starts_with("<!--") {
            if token.starts_with("<!--[if") {
                out.push_str(token);
            }
        } else if token.starts_with('<') {
            out.push_str(token);
        } else {
            let before = &html[..m.start()];
            let after = &html[m.end()..];
            if before.ends_with('>') && after.starts_with('<') {
                let block_before = before.rfind('<').is_some_and(|i| is_block_tag(&before[i..]));
                if !(block_before || is_block_tag(after)) {
                    out.push(' ');
                }
            } else {
                out.push_str(token);
            }
        }
    }
    out.push_str(&html[last..]);

    out.trim().to_string()
}
