//! Two-level category tree.
//!
//! An article lists categories as `"Main"` or `"Main/Sub"`. A main
//! category counts every assignment that names it, in either form; a
//! subcategory counts only assignments in the full `"Main/Sub"` form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{expect_pair, Taxonomy, TaxonomyError};
use crate::models::Article;

/// Separates a main category from its subcategory.
pub const SEPARATOR: char = '/';

const KIND: &str = "category";

/// A main category and the counts of its subcategories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub count: u64,
    #[serde(rename = "subcategories", default)]
    pub children: BTreeMap<String, u64>,
}

/// Names one node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryRef {
    Main(String),
    Sub { parent: String, name: String },
}

impl CategoryRef {
    /// `"Main"` or `"Main/Sub"`; only the first separator splits.
    pub fn parse(path: &str) -> Self {
        match path.split_once(SEPARATOR) {
            Some((parent, name)) => CategoryRef::Sub {
                parent: parent.to_string(),
                name: name.to_string(),
            },
            None => CategoryRef::Main(path.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CategoryRef::Main(name) | CategoryRef::Sub { name, .. } => name,
        }
    }
}

impl fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryRef::Main(name) => write!(f, "{}", name),
            CategoryRef::Sub { parent, name } => write!(f, "{}{}{}", parent, SEPARATOR, name),
        }
    }
}

/// One row of the tree view; `path` maps the row back to a [`CategoryRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub name: String,
    pub path: String,
    pub count: u64,
    pub children: Vec<TreeRow>,
}

/// Main category name → node. Persisted as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    nodes: BTreeMap<String, CategoryNode>,
}

fn not_found(node: &CategoryRef) -> TaxonomyError {
    TaxonomyError::NotFound {
        kind: KIND,
        name: node.to_string(),
    }
}

fn invalid(name: &str) -> TaxonomyError {
    TaxonomyError::InvalidName {
        kind: KIND,
        name: name.to_string(),
    }
}

impl CategoryTree {
    pub fn get(&self, name: &str) -> Option<&CategoryNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &CategoryNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Count of `node`, if it exists.
    pub fn count_of(&self, node: &CategoryRef) -> Option<u64> {
        match node {
            CategoryRef::Main(name) => self.nodes.get(name).map(|n| n.count),
            CategoryRef::Sub { parent, name } => self
                .nodes
                .get(parent)
                .and_then(|n| n.children.get(name))
                .copied(),
        }
    }

    pub fn contains(&self, node: &CategoryRef) -> bool {
        self.count_of(node).is_some()
    }

    /// The tree view consumed by display and [`crate::filter::filter_tree`].
    pub fn rows(&self) -> Vec<TreeRow> {
        self.nodes
            .iter()
            .map(|(name, node)| TreeRow {
                name: name.clone(),
                path: name.clone(),
                count: node.count,
                children: node
                    .children
                    .iter()
                    .map(|(sub, count)| TreeRow {
                        name: sub.clone(),
                        path: format!("{}{}{}", name, SEPARATOR, sub),
                        count: *count,
                        children: Vec::new(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn require(&self, node: &CategoryRef) -> Result<(), TaxonomyError> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(not_found(node))
        }
    }

    fn main_mut(&mut self, name: &str) -> Result<&mut CategoryNode, TaxonomyError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| not_found(&CategoryRef::Main(name.to_string())))
    }

    fn take_main(&mut self, name: &str) -> Result<CategoryNode, TaxonomyError> {
        self.nodes
            .remove(name)
            .ok_or_else(|| not_found(&CategoryRef::Main(name.to_string())))
    }

    fn take_sub(&mut self, parent: &str, name: &str) -> Result<u64, TaxonomyError> {
        self.main_mut(parent)?
            .children
            .remove(name)
            .ok_or_else(|| not_found(&CategoryRef::Sub {
                parent: parent.to_string(),
                name: name.to_string(),
            }))
    }
}

fn add_into(children: &mut BTreeMap<String, u64>, name: String, count: u64) {
    *children.entry(name).or_insert(0) += count;
}

impl Taxonomy for CategoryTree {
    type Node = CategoryRef;

    const KIND: &'static str = KIND;

    /// Zero every count (keys are kept), then tally each assignment.
    fn rescan(&mut self, articles: &[Article]) {
        for node in self.nodes.values_mut() {
            node.count = 0;
            for count in node.children.values_mut() {
                *count = 0;
            }
        }

        for path in articles.iter().flat_map(|a| a.categories.iter()) {
            if path.is_empty() {
                continue;
            }
            match CategoryRef::parse(path) {
                CategoryRef::Main(name) => {
                    self.nodes.entry(name).or_default().count += 1;
                }
                CategoryRef::Sub { parent, name } => {
                    let node = self.nodes.entry(parent).or_default();
                    node.count += 1;
                    add_into(&mut node.children, name, 1);
                }
            }
        }
    }

    fn add(&mut self, node: &CategoryRef) -> Result<(), TaxonomyError> {
        match node {
            CategoryRef::Main(name) => {
                if name.is_empty() {
                    return Err(invalid(name));
                }
                self.nodes.entry(name.clone()).or_default();
            }
            CategoryRef::Sub { parent, name } => {
                if parent.is_empty() || name.is_empty() {
                    return Err(invalid(&node.to_string()));
                }
                self.nodes
                    .entry(parent.clone())
                    .or_default()
                    .children
                    .entry(name.clone())
                    .or_insert(0);
            }
        }
        Ok(())
    }

    /// Renaming a main category onto an existing name replaces that node;
    /// the two are not merged. The same holds for sibling subcategories.
    fn rename(&mut self, node: &CategoryRef, new_name: &str) -> Result<(), TaxonomyError> {
        self.require(node)?;
        if new_name.is_empty() {
            return Err(invalid(new_name));
        }
        if new_name == node.name() {
            return Ok(());
        }
        match node {
            CategoryRef::Main(old) => {
                if new_name.contains(SEPARATOR) {
                    return Err(invalid(new_name));
                }
                let moved = self.take_main(old)?;
                self.nodes.insert(new_name.to_string(), moved);
            }
            CategoryRef::Sub { parent, name } => {
                let count = self.take_sub(parent, name)?;
                self.main_mut(parent)?
                    .children
                    .insert(new_name.to_string(), count);
            }
        }
        Ok(())
    }

    /// Merge `selection[0]` (source) into `selection[1]` (target).
    ///
    /// - main into main: counts add up and the source's subcategories are
    ///   summed into the target's.
    /// - sub into sub: the source's count moves to the target entry, which
    ///   may live under a different parent.
    /// - sub into main: the source's count is added to the target's own count.
    /// - main into sub: the source's count is added to the target entry, and
    ///   the source's subcategories become siblings of the target under the
    ///   target's parent, not children of the target.
    fn merge(&mut self, selection: &[CategoryRef]) -> Result<(), TaxonomyError> {
        let (source, target) = expect_pair(KIND, selection)?;
        if source == target {
            return Err(TaxonomyError::SelfMerge {
                kind: KIND,
                name: source.to_string(),
            });
        }
        self.require(source)?;
        self.require(target)?;

        match (source, target) {
            (CategoryRef::Main(src), CategoryRef::Main(dst)) => {
                let moved = self.take_main(src)?;
                let dst = self.main_mut(dst)?;
                dst.count += moved.count;
                for (sub, count) in moved.children {
                    add_into(&mut dst.children, sub, count);
                }
            }
            (
                CategoryRef::Sub {
                    parent: src_parent,
                    name: src_name,
                },
                CategoryRef::Sub {
                    parent: dst_parent,
                    name: dst_name,
                },
            ) => {
                let count = self.take_sub(src_parent, src_name)?;
                add_into(&mut self.main_mut(dst_parent)?.children, dst_name.clone(), count);
            }
            (
                CategoryRef::Sub {
                    parent: src_parent,
                    name: src_name,
                },
                CategoryRef::Main(dst),
            ) => {
                let count = self.take_sub(src_parent, src_name)?;
                self.main_mut(dst)?.count += count;
            }
            (
                CategoryRef::Main(src),
                CategoryRef::Sub {
                    parent: dst_parent,
                    name: dst_name,
                },
            ) => {
                if src == dst_parent {
                    return Err(TaxonomyError::IntoOwnChild {
                        kind: KIND,
                        name: src.clone(),
                        child: target.to_string(),
                    });
                }
                let moved = self.take_main(src)?;
                let parent = self.main_mut(dst_parent)?;
                add_into(&mut parent.children, dst_name.clone(), moved.count);
                for (sub, count) in moved.children {
                    add_into(&mut parent.children, sub, count);
                }
            }
        }
        Ok(())
    }

    /// Removes a main category with all its subcategories, or one subcategory.
    fn delete(&mut self, node: &CategoryRef) -> Result<(), TaxonomyError> {
        match node {
            CategoryRef::Main(name) => self.take_main(name).map(|_| ()),
            CategoryRef::Sub { parent, name } => self.take_sub(parent, name).map(|_| ()),
        }
    }

    /// Every main name followed by its `"Main/Sub"` paths.
    fn enumerate(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (name, node) in &self.nodes {
            out.push(name.clone());
            for sub in node.children.keys() {
                out.push(format!("{}{}{}", name, SEPARATOR, sub));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn article(categories: &[&str]) -> Article {
        Article {
            path: PathBuf::from("post.md"),
            title: "post".into(),
            date: "2024-01-01".into(),
            cover: None,
            categories: categories.iter().map(|s| s.to_string()).collect(),
            tags: vec![],
        }
    }

    fn node(count: u64, children: &[(&str, u64)]) -> CategoryNode {
        CategoryNode {
            count,
            children: children.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn tree(nodes: &[(&str, CategoryNode)]) -> CategoryTree {
        CategoryTree {
            nodes: nodes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn r(path: &str) -> CategoryRef {
        CategoryRef::parse(path)
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(r("Tech"), CategoryRef::Main("Tech".into()));
        assert_eq!(
            r("Tech/Rust/Async"),
            CategoryRef::Sub {
                parent: "Tech".into(),
                name: "Rust/Async".into()
            }
        );
        assert_eq!(r("Tech/Rust").to_string(), "Tech/Rust");
    }

    #[test]
    fn rescan_counts_both_forms() {
        let mut t = CategoryTree::default();
        t.rescan(&[
            article(&["Tech/Rust", "Life"]),
            article(&["Tech", "Tech/Rust"]),
            article(&["Tech/Go"]),
        ]);
        assert_eq!(t.get("Tech").unwrap(), &node(4, &[("Go", 1), ("Rust", 2)]));
        assert_eq!(t.get("Life").unwrap(), &node(1, &[]));
    }

    #[test]
    fn rescan_is_idempotent() {
        let articles = vec![article(&["A/x", "B"]), article(&["A"])];
        let mut t = CategoryTree::default();
        t.rescan(&articles);
        let first = t.clone();
        t.rescan(&articles);
        assert_eq!(t, first);
    }

    #[test]
    fn rescan_keeps_declared_keys_at_zero() {
        let mut t = tree(&[("Old", node(9, &[("gone", 4)]))]);
        t.rescan(&[article(&["New"])]);
        assert_eq!(t.get("Old").unwrap(), &node(0, &[("gone", 0)]));
        assert_eq!(t.get("New").unwrap().count, 1);
    }

    #[test]
    fn deleted_node_reappears_when_still_referenced() {
        let articles = vec![article(&["Tech/Rust"])];
        let mut t = CategoryTree::default();
        t.rescan(&articles);
        t.delete(&r("Tech")).unwrap();
        assert!(t.get("Tech").is_none());
        t.rescan(&articles);
        assert_eq!(t.get("Tech").unwrap(), &node(1, &[("Rust", 1)]));
    }

    #[test]
    fn merge_main_into_main() {
        let mut t = tree(&[("A", node(3, &[("x", 1)])), ("B", node(2, &[]))]);
        t.merge(&[r("A"), r("B")]).unwrap();
        assert!(t.get("A").is_none());
        assert_eq!(t.get("B").unwrap(), &node(5, &[("x", 1)]));
    }

    #[test]
    fn merge_main_into_main_sums_shared_children() {
        let mut t = tree(&[("A", node(3, &[("x", 1)])), ("B", node(2, &[("x", 2)]))]);
        t.merge(&[r("A"), r("B")]).unwrap();
        assert_eq!(t.get("B").unwrap(), &node(5, &[("x", 3)]));
    }

    #[test]
    fn merge_sub_into_sub_across_parents() {
        let mut t = tree(&[("A", node(4, &[("x", 3)])), ("B", node(2, &[("y", 2)]))]);
        t.merge(&[r("A/x"), r("B/y")]).unwrap();
        assert_eq!(t.get("A").unwrap(), &node(4, &[]));
        assert_eq!(t.get("B").unwrap(), &node(2, &[("y", 5)]));
    }

    #[test]
    fn merge_sub_into_main_absorbs_count() {
        let mut t = tree(&[("A", node(4, &[("x", 3)])), ("B", node(2, &[]))]);
        t.merge(&[r("A/x"), r("B")]).unwrap();
        assert_eq!(t.get("A").unwrap(), &node(4, &[]));
        assert_eq!(t.get("B").unwrap(), &node(5, &[]));
    }

    #[test]
    fn merge_main_into_sub_flattens_children_as_siblings() {
        let mut t = tree(&[("A", node(2, &[("x", 1)])), ("C", node(5, &[("y", 5)]))]);
        t.merge(&[r("A"), r("C/y")]).unwrap();
        assert!(t.get("A").is_none());
        assert_eq!(t.get("C").unwrap(), &node(5, &[("x", 1), ("y", 7)]));
    }

    #[test]
    fn merge_requires_exactly_two() {
        let mut t = tree(&[("A", node(1, &[])), ("B", node(1, &[])), ("C", node(1, &[]))]);
        let before = t.clone();
        for selection in [vec![], vec![r("A")], vec![r("A"), r("B"), r("C")]] {
            assert!(matches!(
                t.merge(&selection),
                Err(TaxonomyError::SelectionSize { .. })
            ));
        }
        assert_eq!(t, before);
    }

    #[test]
    fn merge_rejects_self_and_missing_without_change() {
        let mut t = tree(&[("A", node(1, &[("x", 1)]))]);
        let before = t.clone();
        assert!(matches!(
            t.merge(&[r("A"), r("A")]),
            Err(TaxonomyError::SelfMerge { .. })
        ));
        assert!(matches!(
            t.merge(&[r("A"), r("Missing")]),
            Err(TaxonomyError::NotFound { .. })
        ));
        assert!(matches!(
            t.merge(&[r("A"), r("A/x")]),
            Err(TaxonomyError::IntoOwnChild { .. })
        ));
        assert_eq!(t, before);
    }

    #[test]
    fn rename_main_moves_whole_node_and_overwrites_collision() {
        let mut t = tree(&[("A", node(3, &[("x", 1)])), ("B", node(7, &[("z", 7)]))]);
        t.rename(&r("A"), "B").unwrap();
        assert!(t.get("A").is_none());
        assert_eq!(t.get("B").unwrap(), &node(3, &[("x", 1)]));
    }

    #[test]
    fn rename_sub_keeps_parent() {
        let mut t = tree(&[("A", node(3, &[("x", 2)]))]);
        t.rename(&r("A/x"), "y").unwrap();
        assert_eq!(t.get("A").unwrap(), &node(3, &[("y", 2)]));
    }

    #[test]
    fn rename_rejects_bad_input() {
        let mut t = tree(&[("A", node(1, &[]))]);
        assert!(matches!(
            t.rename(&r("Nope"), "X"),
            Err(TaxonomyError::NotFound { .. })
        ));
        assert!(t.rename(&r("A"), "").is_err());
        assert!(t.rename(&r("A"), "B/C").is_err());
        assert_eq!(t.get("A").unwrap(), &node(1, &[]));
    }

    #[test]
    fn delete_sub_and_missing() {
        let mut t = tree(&[("A", node(3, &[("x", 1), ("y", 2)]))]);
        t.delete(&r("A/x")).unwrap();
        assert_eq!(t.get("A").unwrap(), &node(3, &[("y", 2)]));
        assert!(t.delete(&r("A/x")).is_err());
        assert!(t.delete(&r("Z")).is_err());
    }

    #[test]
    fn add_declares_without_resetting() {
        let mut t = tree(&[("A", node(3, &[("x", 2)]))]);
        t.add(&r("A/x")).unwrap();
        t.add(&r("A/new")).unwrap();
        t.add(&r("Fresh")).unwrap();
        assert_eq!(t.get("A").unwrap(), &node(3, &[("new", 0), ("x", 2)]));
        assert_eq!(t.get("Fresh").unwrap(), &node(0, &[]));
        assert!(t.add(&r("")).is_err());
    }

    #[test]
    fn enumerate_and_rows() {
        let t = tree(&[("B", node(1, &[])), ("A", node(2, &[("x", 1)]))]);
        assert_eq!(t.enumerate(), vec!["A", "A/x", "B"]);
        let rows = t.rows();
        assert_eq!(rows[0].path, "A");
        assert_eq!(rows[0].children[0].path, "A/x");
        assert_eq!(rows[0].children[0].count, 1);
        assert!(rows[1].children.is_empty());
    }
}
