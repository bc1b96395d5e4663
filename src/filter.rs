//! Substring filtering for list and tree views.
//!
//! Matching is a case-insensitive substring test; an empty query matches
//! everything. The flat form keeps an index back into the source slice so a
//! selection in the filtered view always resolves to the right item.

use crate::models::Article;
use crate::taxonomy::{TagTable, TreeRow};

/// Items that passed a flat filter, with their positions in the source.
#[derive(Debug)]
pub struct Filtered<'a, T> {
    items: Vec<&'a T>,
    indices: Vec<usize>,
}

impl<'a, T> Filtered<'a, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The `i`-th visible item.
    pub fn get(&self, i: usize) -> Option<&'a T> {
        self.items.get(i).copied()
    }

    /// Position in the source slice of the `i`-th visible item.
    pub fn source_index(&self, i: usize) -> Option<usize> {
        self.indices.get(i).copied()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// `(source index, item)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        self.indices.iter().copied().zip(self.items.iter().copied())
    }
}

fn matches(haystack: &str, needle_lower: &str) -> bool {
    needle_lower.is_empty() || haystack.to_lowercase().contains(needle_lower)
}

/// Keep the items whose `label` contains `query`, ignoring case.
pub fn filter_flat<'a, T>(
    items: &'a [T],
    query: &str,
    label: impl Fn(&T) -> &str,
) -> Filtered<'a, T> {
    let needle = query.to_lowercase();
    let mut filtered = Filtered {
        items: Vec::new(),
        indices: Vec::new(),
    };
    for (i, item) in items.iter().enumerate() {
        if matches(label(item), &needle) {
            filtered.items.push(item);
            filtered.indices.push(i);
        }
    }
    filtered
}

/// Articles whose title contains `query`.
pub fn filter_articles<'a>(articles: &'a [Article], query: &str) -> Filtered<'a, Article> {
    filter_flat(articles, query, |a| a.title.as_str())
}

/// Ranked tags whose name contains `query`.
pub fn filter_tags<'a>(tags: &'a TagTable, query: &str) -> Vec<(&'a str, u64)> {
    let ranked = tags.ranked();
    let kept: Vec<(&'a str, u64)> = filter_flat(&ranked, query, |(name, _)| *name)
        .iter()
        .map(|(_, tag)| *tag)
        .collect();
    kept
}

/// Prune a tree to the rows that should stay visible.
///
/// A row stays if its own name matches or any descendant stays. A matching
/// row does not bring its non-matching children along.
pub fn filter_tree(rows: &[TreeRow], query: &str) -> Vec<TreeRow> {
    let needle = query.to_lowercase();
    rows.iter()
        .filter_map(|row| prune(row, &needle))
        .collect()
}

fn prune(row: &TreeRow, needle: &str) -> Option<TreeRow> {
    let children: Vec<TreeRow> = row
        .children
        .iter()
        .filter_map(|child| prune(child, needle))
        .collect();
    if children.is_empty() && !matches(&row.name, needle) {
        return None;
    }
    Some(TreeRow {
        name: row.name.clone(),
        path: row.path.clone(),
        count: row.count,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn article(title: &str) -> Article {
        Article {
            path: PathBuf::from(format!("{}.md", title)),
            title: title.to_string(),
            date: "2024-01-01".into(),
            cover: None,
            categories: vec![],
            tags: vec![],
        }
    }

    fn leaf(parent: &str, name: &str, count: u64) -> TreeRow {
        TreeRow {
            name: name.into(),
            path: format!("{}/{}", parent, name),
            count,
            children: vec![],
        }
    }

    fn main_row(name: &str, children: Vec<TreeRow>) -> TreeRow {
        TreeRow {
            name: name.into(),
            path: name.into(),
            count: 1,
            children,
        }
    }

    #[test]
    fn flat_filter_maps_back_to_source() {
        let articles = vec![article("Rust Notes"), article("Cooking"), article("rusty tools")];
        let hits = filter_articles(&articles, "RUST");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits.indices(), &[0, 2]);
        assert_eq!(hits.source_index(1), Some(2));
        assert_eq!(hits.get(1).unwrap().title, "rusty tools");
        assert!(hits.get(2).is_none());
    }

    #[test]
    fn empty_query_keeps_everything() {
        let articles = vec![article("a"), article("b")];
        assert_eq!(filter_articles(&articles, "").len(), 2);
        assert!(filter_articles(&articles, "zzz").is_empty());
    }

    #[test]
    fn descendant_match_keeps_ancestor() {
        let tree = vec![main_row("Main", vec![leaf("Main", "news", 1)])];
        let hits = filter_tree(&tree, "news");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Main");
        assert_eq!(hits[0].children[0].path, "Main/news");

        assert!(filter_tree(&tree, "zzz").is_empty());
    }

    #[test]
    fn matching_parent_hides_non_matching_children() {
        let tree = vec![main_row("Tech", vec![leaf("Tech", "rust", 1)])];
        let hits = filter_tree(&tree, "tech");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].children.is_empty());
    }

    #[test]
    fn tag_filter_keeps_ranking() {
        use crate::taxonomy::Taxonomy;

        let mut tags = TagTable::default();
        let mut a = article("x");
        a.tags = vec!["rust".into(), "rustc".into(), "go".into()];
        let mut b = article("y");
        b.tags = vec!["rustc".into()];
        tags.rescan(&[a, b]);
        assert_eq!(filter_tags(&tags, "Rust"), vec![("rustc", 2), ("rust", 1)]);
    }
}
