//! Category and tag statistics derived from the article corpus.
//!
//! The article set is the source of truth: counts are recomputed by
//! [`TaxonomyStore::rescan`] and the persisted file is only a cache of the
//! last known state plus any pre-declared (zero-count) nodes. Deleting a
//! node never touches article files, so a name still referenced by some
//! article reappears on the next rescan.
//!
//! [`TaxonomyStore`] is generic over a [`Taxonomy`]: it is instantiated as
//! [`CategoryStore`] (two-level tree) and [`TagStore`] (flat table). Every
//! mutating operation republishes the flattened list of valid names and
//! rewrites the JSON file. A failed write is reported but the in-memory
//! change is kept, so memory and disk may differ until the next good save.

pub mod category;
pub mod tag;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::Article;

pub use category::{CategoryNode, CategoryRef, CategoryTree, TreeRow};
pub use tag::TagTable;

pub type CategoryStore = TaxonomyStore<CategoryTree>;
pub type TagStore = TaxonomyStore<TagTable>;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("merge needs exactly two selected {kind}s, got {count}")]
    SelectionSize { kind: &'static str, count: usize },
    #[error("cannot merge {kind} `{name}` into itself")]
    SelfMerge { kind: &'static str, name: String },
    #[error("cannot merge {kind} `{name}` into its own subcategory `{child}`")]
    IntoOwnChild {
        kind: &'static str,
        name: String,
        child: String,
    },
    #[error("no such {kind}: `{name}`")]
    NotFound { kind: &'static str, name: String },
    #[error("invalid {kind} name: `{name}`")]
    InvalidName { kind: &'static str, name: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize taxonomy: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A taxonomy whose counts are derived from articles.
///
/// Implementations only mutate memory; persistence and publishing are
/// handled by [`TaxonomyStore`]. Every method that returns an error leaves
/// the taxonomy unchanged.
pub trait Taxonomy: Default + Serialize + DeserializeOwned {
    /// Handle naming one node.
    type Node: fmt::Display;

    /// Human-readable kind, used in errors and logs.
    const KIND: &'static str;

    /// Recompute all counts from `articles`.
    fn rescan(&mut self, articles: &[Article]);

    /// Pre-declare a node with zero count. Existing nodes are left alone.
    fn add(&mut self, node: &Self::Node) -> Result<(), TaxonomyError>;

    /// Rename a node, keeping its count.
    fn rename(&mut self, node: &Self::Node, new_name: &str) -> Result<(), TaxonomyError>;

    /// Merge `selection[0]` into `selection[1]`. Any other selection size is rejected.
    fn merge(&mut self, selection: &[Self::Node]) -> Result<(), TaxonomyError>;

    /// Remove a node from the taxonomy only.
    fn delete(&mut self, node: &Self::Node) -> Result<(), TaxonomyError>;

    /// Canonical flattened list of valid names.
    fn enumerate(&self) -> Vec<String>;
}

/// Reject any selection that is not exactly two nodes.
pub(crate) fn expect_pair<'a, N>(
    kind: &'static str,
    selection: &'a [N],
) -> Result<(&'a N, &'a N), TaxonomyError> {
    match selection {
        [source, target] => Ok((source, target)),
        _ => Err(TaxonomyError::SelectionSize {
            kind,
            count: selection.len(),
        }),
    }
}

/// A taxonomy plus its JSON file and published name list.
///
/// Owned by the composition root and passed by reference to whatever needs
/// it. Operations are synchronous and must be serialized by the caller.
pub struct TaxonomyStore<T: Taxonomy> {
    data: T,
    path: Option<PathBuf>,
    published: watch::Sender<Vec<String>>,
}

impl<T: Taxonomy> TaxonomyStore<T> {
    /// Load the store persisted at `path`, or start empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TaxonomyError> {
        let path = path.into();
        let data = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| TaxonomyError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| TaxonomyError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            T::default()
        };
        Ok(Self::with_data(data, Some(path)))
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::with_data(T::default(), None)
    }

    fn with_data(data: T, path: Option<PathBuf>) -> Self {
        let (published, _) = watch::channel(data.enumerate());
        Self {
            data,
            path,
            published,
        }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Watch the published name list, e.g. to drive autocompletion.
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.published.subscribe()
    }

    /// The most recently published name list.
    pub fn enumeration(&self) -> Vec<String> {
        self.published.borrow().clone()
    }

    pub fn rescan(&mut self, articles: &[Article]) -> Result<(), TaxonomyError> {
        self.data.rescan(articles);
        debug!(kind = T::KIND, articles = articles.len(), "taxonomy rescanned");
        self.commit()
    }

    pub fn add(&mut self, node: &T::Node) -> Result<(), TaxonomyError> {
        self.data.add(node)?;
        self.commit()
    }

    pub fn rename(&mut self, node: &T::Node, new_name: &str) -> Result<(), TaxonomyError> {
        self.data.rename(node, new_name)?;
        debug!(kind = T::KIND, from = %node, to = new_name, "renamed");
        self.commit()
    }

    pub fn merge(&mut self, selection: &[T::Node]) -> Result<(), TaxonomyError> {
        self.data.merge(selection)?;
        debug!(kind = T::KIND, "merged {} into {}", selection[0], selection[1]);
        self.commit()
    }

    pub fn delete(&mut self, node: &T::Node) -> Result<(), TaxonomyError> {
        self.data.delete(node)?;
        debug!(kind = T::KIND, node = %node, "deleted");
        self.commit()
    }

    /// Write the current state to the backing file, if any.
    pub fn save(&self) -> Result<(), TaxonomyError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.data).map_err(TaxonomyError::Encode)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| TaxonomyError::Save {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        std::fs::write(path, json).map_err(|source| TaxonomyError::Save {
            path: path.clone(),
            source,
        })
    }

    /// Publish first so in-memory consumers stay current even if the write fails.
    fn commit(&mut self) -> Result<(), TaxonomyError> {
        self.published.send_replace(self.data.enumerate());
        self.save().inspect_err(|e| {
            warn!(kind = T::KIND, "taxonomy kept in memory but not saved: {}", e);
        })
    }
}
