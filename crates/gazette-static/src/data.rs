//! Template contexts for the index and post pages.

use serde::Serialize;

use gazette_content::{Author, Authors, Post};

use crate::config::SiteConfig;

/// Site-wide values available to every template.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub title: String,
    pub base_url: String,
}

impl From<&SiteConfig> for SiteInfo {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            base_url: config.base_url.clone(),
        }
    }
}

/// A post as listed on the index page.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub author: Option<Author>,
    pub excerpt: String,
    pub tags: Vec<String>,
}

/// Context of the index page.
#[derive(Debug, Clone, Serialize)]
pub struct IndexData {
    pub site: SiteInfo,
    pub posts: Vec<PostSummary>,
}

/// Context of a post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostData<'a> {
    pub site: SiteInfo,
    pub post: &'a Post,
    pub author: Option<&'a Author>,
}

pub fn index_data(config: &SiteConfig, posts: &[Post], authors: &Authors) -> IndexData {
    let posts = posts
        .iter()
        .map(|post| PostSummary {
            id: post.id.clone(),
            title: post.title.clone(),
            url: post.url.clone(),
            date: post.date.map(|d| d.to_string()),
            author: lookup_author(post, authors).cloned(),
            excerpt: post.excerpt.clone(),
            tags: post.tags.clone(),
        })
        .collect();

    IndexData {
        site: SiteInfo::from(config),
        posts,
    }
}

pub fn post_data<'a>(config: &SiteConfig, post: &'a Post, authors: &'a Authors) -> PostData<'a> {
    PostData {
        site: SiteInfo::from(config),
        post,
        author: lookup_author(post, authors),
    }
}

fn lookup_author<'a>(post: &Post, authors: &'a Authors) -> Option<&'a Author> {
    let id = post.author.as_deref()?;
    let author = authors.get(id);
    if author.is_none() {
        tracing::warn!("Unknown author '{}' in post '{}'", id, post.id);
    }
    author
}
