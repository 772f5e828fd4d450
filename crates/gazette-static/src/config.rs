use std::path::PathBuf;

/// Configuration shared by all build tasks.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site title
    pub title: String,

    /// Base URL for the site
    pub base_url: String,

    /// Entry template, rendered once for the index and once per post
    pub index_template: PathBuf,

    /// Directory of templates the entry template includes or extends
    pub templates_dir: PathBuf,

    /// Static resources copied into the build directory
    pub resources_dir: PathBuf,

    /// Post sources
    pub posts_dir: PathBuf,

    /// Author files
    pub authors_dir: PathBuf,

    /// Output directory
    pub build_dir: PathBuf,

    /// Minify HTML/CSS output
    pub minify: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            base_url: "/".to_string(),
            index_template: PathBuf::from("src/index.html"),
            templates_dir: PathBuf::from("src/templates"),
            resources_dir: PathBuf::from("src/static"),
            posts_dir: PathBuf::from("content/posts"),
            authors_dir: PathBuf::from("content/authors"),
            build_dir: PathBuf::from("build"),
            minify: true,
        }
    }
}
