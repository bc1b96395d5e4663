//! Single-article editing: load, live-parse, render and save.
//!
//! An [`ArticleDraft`] is the form-shaped view of one article. Comma-separated
//! category and tag fields map to lists through [`parse_list`] and
//! [`join_list`].

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::frontmatter::{self, FrontMatter};
use crate::models::Article;
use crate::scanner::MARKDOWN_SUFFIX;

/// Format of the date stamped on new drafts.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDraft {
    /// `None` until the draft has been saved once.
    pub path: Option<PathBuf>,
    pub title: String,
    pub date: String,
    pub cover: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub body: String,
    extra: BTreeMap<String, Value>,
}

impl ArticleDraft {
    /// A blank draft dated now (local time).
    pub fn new_now() -> Self {
        Self {
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
            ..Self::default()
        }
    }

    /// Read an article file into a draft.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read article: {}", path.display()))?;
        let decoded = frontmatter::decode(&text)
            .with_context(|| format!("Failed to parse front matter of {}", path.display()))?;
        let fm = decoded.front_matter.unwrap_or_default();
        Ok(Self {
            path: Some(path.to_path_buf()),
            title: fm.title.unwrap_or_default(),
            date: fm.date.unwrap_or_default(),
            cover: fm.cover.unwrap_or_default(),
            categories: fm.categories.unwrap_or_default(),
            tags: fm.tags.unwrap_or_default(),
            body: decoded.body,
            extra: fm.extra,
        })
    }

    /// Apply raw editor text to the form.
    ///
    /// Malformed metadata leaves the draft untouched and returns `false`.
    /// Otherwise keys present in the block overwrite their fields, unknown
    /// keys are taken from the block as written, and the body is replaced.
    pub fn apply_text(&mut self, text: &str) -> bool {
        let decoded = match frontmatter::decode(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!("keeping current form: {}", e);
                return false;
            }
        };
        if let Some(fm) = decoded.front_matter {
            if let Some(title) = fm.title {
                self.title = title;
            }
            if let Some(date) = fm.date {
                self.date = date;
            }
            if let Some(cover) = fm.cover {
                self.cover = cover;
            }
            if let Some(categories) = fm.categories {
                self.categories = categories;
            }
            if let Some(tags) = fm.tags {
                self.tags = tags;
            }
            self.extra = fm.extra;
        }
        self.body = decoded.body;
        true
    }

    pub fn front_matter(&self) -> FrontMatter {
        FrontMatter {
            title: Some(self.title.clone()),
            date: Some(self.date.clone()),
            cover: Some(self.cover.clone()),
            categories: Some(self.categories.clone()),
            tags: Some(self.tags.clone()),
            extra: self.extra.clone(),
        }
    }

    /// The article text that [`save`](Self::save) writes.
    pub fn render(&self) -> Result<String> {
        Ok(frontmatter::encode(&self.front_matter(), &self.body)?)
    }

    /// File name for a new draft: the title with spaces turned into dashes.
    ///
    /// Fails for titles that would not name a single file, such as ones
    /// containing a path separator or `..`.
    pub fn file_name(&self) -> Result<String> {
        let name = format!("{}{}", self.title.trim().replace(' ', "-"), MARKDOWN_SUFFIX);
        let mut components = Path::new(&name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || name.contains(['/', '\\']) {
            bail!(
                "Article title '{}' cannot be used as a file name",
                self.title
            );
        }
        Ok(name)
    }

    /// Write the draft and return the article record for the index.
    ///
    /// A draft that was loaded overwrites its file. A new draft needs a
    /// title and is created in `dir_for_new`.
    pub fn save(&mut self, dir_for_new: &Path) -> Result<Article> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => {
                if self.title.trim().is_empty() {
                    bail!("A new article needs a title before it can be saved");
                }
                dir_for_new.join(self.file_name()?)
            }
        };
        let text = self.render()?;
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write article: {}", path.display()))?;
        info!(path = %path.display(), "article saved");
        self.path = Some(path.clone());
        Ok(Article::from_front_matter(path, self.front_matter()))
    }
}

/// Split a comma-separated field, dropping blanks.
pub fn parse_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}
