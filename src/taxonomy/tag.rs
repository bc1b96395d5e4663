//! Flat tag table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{expect_pair, Taxonomy, TaxonomyError};
use crate::models::Article;

const KIND: &str = "tag";

/// Tag name → number of articles using it. Persisted as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    counts: BTreeMap<String, u64>,
}

fn not_found(name: &str) -> TaxonomyError {
    TaxonomyError::NotFound {
        kind: KIND,
        name: name.to_string(),
    }
}

impl TagTable {
    pub fn count(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Tags by count, most used first; ties by name.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut list: Vec<_> = self
            .counts
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        list
    }

    fn require(&self, name: &str) -> Result<(), TaxonomyError> {
        if self.counts.contains_key(name) {
            Ok(())
        } else {
            Err(not_found(name))
        }
    }
}

impl Taxonomy for TagTable {
    type Node = String;

    const KIND: &'static str = KIND;

    /// Unlike categories, tags are rebuilt from scratch: unused tags vanish.
    fn rescan(&mut self, articles: &[Article]) {
        self.counts.clear();
        for tag in articles.iter().flat_map(|a| a.tags.iter()) {
            if tag.is_empty() {
                continue;
            }
            *self.counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    fn add(&mut self, name: &String) -> Result<(), TaxonomyError> {
        if name.is_empty() {
            return Err(TaxonomyError::InvalidName {
                kind: KIND,
                name: name.clone(),
            });
        }
        self.counts.entry(name.clone()).or_insert(0);
        Ok(())
    }

    /// Renaming onto an existing tag replaces it.
    fn rename(&mut self, name: &String, new_name: &str) -> Result<(), TaxonomyError> {
        self.require(name)?;
        if new_name.is_empty() {
            return Err(TaxonomyError::InvalidName {
                kind: KIND,
                name: new_name.to_string(),
            });
        }
        if new_name == name {
            return Ok(());
        }
        let count = self.counts.remove(name).ok_or_else(|| not_found(name))?;
        self.counts.insert(new_name.to_string(), count);
        Ok(())
    }

    /// The source's count is added to the target and the source is dropped.
    fn merge(&mut self, selection: &[String]) -> Result<(), TaxonomyError> {
        let (source, target) = expect_pair(KIND, selection)?;
        if source == target {
            return Err(TaxonomyError::SelfMerge {
                kind: KIND,
                name: source.clone(),
            });
        }
        self.require(source)?;
        self.require(target)?;
        let moved = self.counts.remove(source).ok_or_else(|| not_found(source))?;
        *self.counts.entry(target.clone()).or_insert(0) += moved;
        Ok(())
    }

    fn delete(&mut self, name: &String) -> Result<(), TaxonomyError> {
        self.counts
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    fn enumerate(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }
}
