//! Corpus summary.
//!
//! Counts articles, categories and tags in a scanned corpus and prints a
//! short overview. Used by `hxh stats` as a quick sanity check before
//! rescanning the taxonomy files or exporting a backup.

use std::path::Path;

use serde::Serialize;

use crate::models::{Article, DEFAULT_DATE, DEFAULT_TITLE};
use crate::taxonomy::{CategoryTree, TagTable, Taxonomy};

/// How many of the most used tags the summary lists.
pub const TOP_TAGS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub articles: usize,
    pub untitled: usize,
    pub main_categories: usize,
    pub sub_categories: usize,
    pub tags: usize,
    pub top_tags: Vec<(String, u64)>,
    /// Greatest / smallest date string, ignoring articles without a date.
    pub newest: Option<String>,
    pub oldest: Option<String>,
    pub total_bytes: u64,
}

/// Summarize `articles` without touching any persisted taxonomy.
pub fn summarize(articles: &[Article]) -> CorpusStats {
    let mut categories = CategoryTree::default();
    categories.rescan(articles);
    let mut tags = TagTable::default();
    tags.rescan(articles);

    let dated = articles.iter().filter(|a| a.date != DEFAULT_DATE);
    let newest = dated.clone().map(|a| a.date.as_str()).max().map(str::to_string);
    let oldest = dated.map(|a| a.date.as_str()).min().map(str::to_string);

    let total_bytes = articles
        .iter()
        .map(|a| std::fs::metadata(&a.path).map(|m| m.len()).unwrap_or(0))
        .sum();

    CorpusStats {
        articles: articles.len(),
        untitled: articles
            .iter()
            .filter(|a| a.title == DEFAULT_TITLE)
            .count(),
        main_categories: categories.len(),
        sub_categories: categories
            .nodes()
            .map(|(_, node)| node.children.len())
            .sum(),
        tags: tags.len(),
        top_tags: tags
            .ranked()
            .into_iter()
            .take(TOP_TAGS)
            .map(|(name, count)| (name.to_string(), count))
            .collect(),
        newest,
        oldest,
        total_bytes,
    }
}

/// Print a summary table to stdout.
pub fn print_stats(root: &Path, stats: &CorpusStats) {
    println!("Hexo Harness - Corpus Stats");
    println!("===========================");
    println!();
    println!("  Root:        {}", root.display());
    println!("  Size:        {}", format_bytes(stats.total_bytes));
    println!();
    println!("  Articles:    {}", stats.articles);
    println!("  Untitled:    {}", stats.untitled);
    println!(
        "  Categories:  {} main, {} sub",
        stats.main_categories, stats.sub_categories
    );
    println!("  Tags:        {}", stats.tags);
    println!(
        "  Newest:      {}",
        stats.newest.as_deref().unwrap_or("-")
    );
    println!(
        "  Oldest:      {}",
        stats.oldest.as_deref().unwrap_or("-")
    );

    if !stats.top_tags.is_empty() {
        println!();
        println!("  Top tags:");
        println!("  {:<32} {:>6}", "TAG", "COUNT");
        println!("  {}", "-".repeat(39));
        for (name, count) in &stats.top_tags {
            println!("  {:<32} {:>6}", name, count);
        }
    }

    println!();
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn article(title: &str, date: &str, categories: &[&str], tags: &[&str]) -> Article {
        Article {
            path: PathBuf::from(format!("/nonexistent/{}.md", title)),
            title: title.into(),
            date: date.into(),
            cover: None,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn summary_counts() {
        let articles = vec![
            article("a", "2024-02-01", &["Tech/Rust", "Tech"], &["rust", "cli"]),
            article("b", "2023-12-31", &["Life"], &["rust"]),
            article("untitled", "no-date", &[], &[]),
        ];
        let stats = summarize(&articles);
        assert_eq!(stats.articles, 3);
        assert_eq!(stats.untitled, 1);
        assert_eq!(stats.main_categories, 2);
        assert_eq!(stats.sub_categories, 1);
        assert_eq!(stats.tags, 2);
        assert_eq!(stats.top_tags[0], ("rust".to_string(), 2));
        assert_eq!(stats.newest.as_deref(), Some("2024-02-01"));
        assert_eq!(stats.oldest.as_deref(), Some("2023-12-31"));
        assert_eq!(stats.total_bytes, 0);
    }

    #[test]
    fn empty_corpus() {
        let stats = summarize(&[]);
        assert_eq!(stats.articles, 0);
        assert!(stats.newest.is_none());
        assert!(stats.top_tags.is_empty());
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(10), "10 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
