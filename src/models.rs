//! Core data models used throughout the harness.
//!
//! [`Article`] is the record produced by the corpus scanner and consumed by
//! the taxonomy stores, the selection filter and the CLI.

use serde::Serialize;
use std::path::PathBuf;

use crate::frontmatter::FrontMatter;

/// Title used when an article's front matter has none.
pub const DEFAULT_TITLE: &str = "untitled";
/// Date used when an article's front matter has none.
pub const DEFAULT_DATE: &str = "no-date";

/// Metadata of one Markdown article on disk.
///
/// `date` is an opaque string: it is never parsed, only compared as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub path: PathBuf,
    pub title: String,
    pub date: String,
    pub cover: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl Article {
    /// Build an article record from decoded front matter, applying the
    /// `untitled` / `no-date` defaults.
    pub fn from_front_matter(path: PathBuf, fm: FrontMatter) -> Self {
        Self {
            path,
            title: fm.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: fm.date.unwrap_or_else(|| DEFAULT_DATE.to_string()),
            cover: fm.cover,
            categories: fm.categories.unwrap_or_default(),
            tags: fm.tags.unwrap_or_default(),
        }
    }

    /// An article whose file had no front matter block at all.
    pub fn bare(path: PathBuf) -> Self {
        Self::from_front_matter(path, FrontMatter::default())
    }

    /// List label: `Title (date)`.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.title, self.date)
    }
}

/// Sort articles by date, newest first, using plain string comparison.
///
/// Non-ISO dates sort lexicographically. The sort is stable, so articles
/// with equal dates keep their incoming order.
pub fn sort_by_date_desc(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Replace the article with the same path, or append it.
///
/// Keeps an in-memory index current after [`ArticleDraft::save`] without a
/// rescan. Editors embedding the library call it; the `hxh` CLI rescans on
/// every command and has no long-lived index.
///
/// [`ArticleDraft::save`]: crate::draft::ArticleDraft::save
pub fn upsert_article(articles: &mut Vec<Article>, article: Article) {
    match articles.iter_mut().find(|a| a.path == article.path) {
        Some(existing) => *existing = article,
        None => articles.push(article),
    }
}
