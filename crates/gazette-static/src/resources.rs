//! Static resources: copied files, minified CSS and the bundled footer script.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::builder::BuildError;

/// Client-side behavior of the fixed post footer.
pub const FOOTER_SCRIPT: &str = include_str!("../assets/footer.js");

/// Styles for the fixed post footer.
pub const FOOTER_STYLES: &str = include_str!("../assets/footer.css");

/// Copy `source_dir` into `build_dir` and write the bundled assets.
///
/// Returns the number of files written.
pub fn copy_resources(
    source_dir: &Path,
    build_dir: &Path,
    minify: bool,
) -> Result<usize, BuildError> {
    let mut written = 0;

    write_asset(build_dir, Path::new("scripts/footer.js"), FOOTER_SCRIPT.to_string())?;
    write_asset(
        build_dir,
        Path::new("styles/footer.css"),
        process_css(FOOTER_STYLES, minify),
    )?;
    written += 2;

    if !source_dir.exists() {
        tracing::debug!("No resources directory at {}", source_dir.display());
        return Ok(written);
    }

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let relative = path.strip_prefix(source_dir).unwrap_or(path);
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if ext == "css" {
            let css = fs::read_to_string(path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;
            write_asset(build_dir, relative, process_css(&css, minify))?;
        } else {
            let target = build_dir.join(relative);
            ensure_parent(&target)?;
            fs::copy(path, &target)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", target.display(), e)))?;
        }

        written += 1;
    }

    tracing::debug!("Copied resources from {}", source_dir.display());

    Ok(written)
}

fn process_css(css: &str, minify: bool) -> String {
    if !minify {
        return css.to_string();
    }

    match minify_css(css) {
        Ok(minified) => minified,
        Err(e) => {
            tracing::warn!("Leaving CSS unminified: {}", e);
            css.to_string()
        }
    }
}

/// Minify CSS using lightningcss.
pub fn minify_css(css: &str) -> Result<String, String> {
    use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| format!("CSS parse error: {}", e))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| format!("CSS minify error: {}", e))?;

    Ok(minified.code)
}

fn write_asset(build_dir: &Path, relative: &Path, contents: String) -> Result<(), BuildError> {
    let target = build_dir.join(relative);
    ensure_parent(&target)?;
    fs::write(&target, contents)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", target.display(), e)))
}

fn ensure_parent(target: &Path) -> Result<(), BuildError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", parent.display(), e)))?;
    }
    Ok(())
}
