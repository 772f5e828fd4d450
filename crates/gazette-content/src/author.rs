//! Post authors.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::post::ContentError;

/// An author, loaded from `<authors>/<id>.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Author {
    #[serde(skip_deserializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Authors by id.
#[derive(Debug, Clone, Default)]
pub struct Authors {
    by_id: HashMap<String, Author>,
}

impl Authors {
    pub fn get(&self, id: &str) -> Option<&Author> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Load all authors in `dir`. A missing directory yields no authors.
pub fn load_authors(dir: &Path) -> Result<Authors, ContentError> {
    let mut by_id = HashMap::new();

    if !dir.exists() {
        return Ok(Authors { by_id });
    }

    let entries =
        fs::read_dir(dir).map_err(|e| ContentError::ReadError(format!("{}: {}", dir.display(), e)))?;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !path.is_file() || (ext != "yaml" && ext != "yml") {
            continue;
        }

        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let source = fs::read_to_string(&path)
            .map_err(|e| ContentError::ReadError(format!("{}: {}", path.display(), e)))?;
        let mut author: Author =
            serde_yaml::from_str(&source).map_err(|e| ContentError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        author.id = id.to_string();

        by_id.insert(author.id.clone(), author);
    }

    Ok(Authors { by_id })
}
