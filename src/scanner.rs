//! Corpus scanner: directory of Markdown files → sorted article index.
//!
//! Every `*.md` file under the root is read and its front matter decoded.
//! A file that cannot be read or whose metadata is malformed is logged and
//! skipped; only a root that cannot be listed fails the scan. The result is
//! sorted by date string, newest first (see [`sort_by_date_desc`]).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::frontmatter::{self, FrontMatterError};
use crate::models::{sort_by_date_desc, Article};
use crate::progress::{task_channel, TaskReceiver, TaskSink};

/// File-name suffix of articles. Compared case-sensitively.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// A scan that could not start, or one article that could not be read.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read corpus root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
}

/// Start a scan of `root` on a blocking worker.
///
/// Must be called from within a Tokio runtime. The receiver yields progress
/// percentages followed by `Completed(articles)` or `Failed(message)`.
pub fn spawn_scan(root: impl Into<PathBuf>) -> TaskReceiver<Vec<Article>> {
    let root = root.into();
    let (sink, rx) = task_channel();
    tokio::task::spawn_blocking(move || run_scan(&root, sink));
    rx
}

fn run_scan(root: &Path, sink: TaskSink<Vec<Article>>) {
    let result = scan_corpus(root, |done, total| sink.progress(done, total));
    sink.finish(result);
}

/// Scan synchronously, calling `on_progress(done, total)` after each file.
pub fn scan_corpus(
    root: &Path,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Vec<Article>, ScanError> {
    let files = list_markdown_files(root)?;
    let total = files.len();
    let mut articles = Vec::with_capacity(total);

    for (i, path) in files.into_iter().enumerate() {
        match read_article(&path) {
            Ok(article) => articles.push(article),
            Err(e) => warn!("skipping article: {}", e),
        }
        on_progress(i + 1, total);
    }

    sort_by_date_desc(&mut articles);
    info!(
        root = %root.display(),
        found = total,
        loaded = articles.len(),
        "corpus scan finished"
    );
    Ok(articles)
}

/// Every regular file under `root` whose name ends in `.md`, in file-name order.
///
/// Unreadable sub-directories are logged and skipped.
pub fn list_markdown_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(MARKDOWN_SUFFIX))
        .unwrap_or(false)
}

/// Read and decode one article file.
pub fn read_article(path: &Path) -> Result<Article, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = frontmatter::decode(&text).map_err(|source| ScanError::FrontMatter {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), has_front_matter = decoded.front_matter.is_some(), "decoded article");
    Ok(match decoded.front_matter {
        Some(fm) => Article::from_front_matter(path.to_path_buf(), fm),
        None => Article::bare(path.to_path_buf()),
    })
}
