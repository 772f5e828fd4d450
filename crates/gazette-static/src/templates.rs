//! Template engine for rendering the index and post pages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Error, ErrorKind};
use serde::Serialize;

/// Name of the entry template.
pub const ENTRY_TEMPLATE: &str = "index.html";

/// Template engine using minijinja.
///
/// Templates are loaded lazily from the templates directory; names missing
/// there fall back to the built-in templates. Build a fresh engine per task
/// run so edits on disk are picked up.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine loading templates from `templates_dir`.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let dir = templates_dir.into();
        let mut env = Environment::new();
        env.set_loader(move |name| load_template(&dir, name));

        Self { env }
    }

    /// Use `source` as the entry template instead of the loaded one.
    pub fn with_entry(mut self, source: String) -> Result<Self, Error> {
        self.env.add_template_owned(ENTRY_TEMPLATE, source)?;
        Ok(self)
    }

    /// Render the entry template with `context`.
    pub fn render<S: Serialize>(&self, context: S) -> Result<String, Error> {
        self.env.get_template(ENTRY_TEMPLATE)?.render(context)
    }
}

fn load_template(dir: &Path, name: &str) -> Result<Option<String>, Error> {
    if name.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Ok(None);
    }

    match fs::read_to_string(dir.join(name)) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(builtin(name).map(str::to_string)),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", name),
        )
        .with_source(e)),
    }
}

fn builtin(name: &str) -> Option<&'static str> {
    match name {
        ENTRY_TEMPLATE => Some(ENTRY),
        "base.html" => Some(BASE),
        "list.html" => Some(LIST),
        "post.html" => Some(POST),
        "history.html" => Some(HISTORY),
        _ => None,
    }
}

const ENTRY: &str = r##"{% extends "base.html" %}
{% block title %}{% if post %}{{ post.title }} - {% endif %}{{ site.title }}{% endblock %}
{% block content %}
{% if post %}{% include "post.html" %}{% else %}{% include "list.html" %}{% endif %}
{% endblock %}
{% block scripts %}{% if post %}<script src="{{ site.base_url }}scripts/footer.js" defer></script>{% endif %}{% endblock %}"##;

const BASE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% block title %}{{ site.title }}{% endblock %}</title>
  <link rel="stylesheet" href="{{ site.base_url }}styles/footer.css">
</head>
<body>
  <header class="masthead">
    <a href="{{ site.base_url }}">{{ site.title }}</a>
  </header>
  <main>
    {% block content %}{% endblock %}
  </main>
  {% block scripts %}{% endblock %}
</body>
</html>"##;

const LIST: &str = r##"<ul class="posts">
{% for entry in posts %}
  <li class="post-summary">
    <a href="{{ site.base_url }}{{ entry.url }}/">{{ entry.title }}</a>
    {% if entry.date %}<time datetime="{{ entry.date }}">{{ entry.date }}</time>{% endif %}
    {% if entry.author %}<span class="author">{{ entry.author.name }}</span>{% endif %}
    <p>{{ entry.excerpt }}</p>
  </li>
{% else %}
  <li class="empty">No posts yet.</li>
{% endfor %}
</ul>"##;

const POST: &str = r##"<article class="post">
  <h1>{{ post.title }}</h1>
  {% if post.date %}<time datetime="{{ post.date }}">{{ post.date }}</time>{% endif %}
  <div class="content">
    {{ post.content | safe }}
  </div>
  <footer class="postbottom">
    {% if author %}<span class="author">{{ author.name }}</span>{% endif %}
    {% if post.tags %}<ul class="tags">{% for tag in post.tags %}<li>{{ tag }}</li>{% endfor %}</ul>{% endif %}
    {% include "history.html" %}
  </footer>
</article>"##;

const HISTORY: &str = r##"{% if post.history %}
<details class="history">
  <summary>{{ post.history | length }} revision{% if post.history | length != 1 %}s{% endif %}</summary>
  <ol>
  {% for entry in post.history %}
    <li><code title="{{ entry.sha_full }}">{{ entry.sha }}</code> <time datetime="{{ entry.date }}">{{ entry.date[:10] }}</time> {{ entry.message }}</li>
  {% endfor %}
  </ol>
</details>
{% endif %}"##;
