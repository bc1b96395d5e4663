//! Export the article directory as a zip backup.
//!
//! Packs every Markdown file and image under the source directory into a
//! Deflate-compressed archive, keeping paths relative to the source root.
//! A file that cannot be added is logged and skipped; only a source that
//! cannot be listed or a destination that cannot be created fails the export.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::progress::{task_channel, TaskReceiver, TaskSink};
use crate::scanner::MARKDOWN_SUFFIX;

/// Image suffixes packed alongside articles. Compared case-insensitively.
pub const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg"];

/// An export that could not run, or a single file that could not be added.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot read source directory {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("cannot create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write archive entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("cannot finalize archive {path}: {source}")]
    Finish {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Start an export on a blocking worker.
///
/// Must be called from within a Tokio runtime. The receiver yields progress
/// percentages followed by `Completed(())` or `Failed(message)`.
pub fn spawn_export(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> TaskReceiver<()> {
    let source = source.into();
    let dest = dest.into();
    let (sink, rx) = task_channel();
    tokio::task::spawn_blocking(move || run_export(&source, &dest, sink));
    rx
}

fn run_export(source: &Path, dest: &Path, sink: TaskSink<()>) {
    let result = export_archive(source, dest, |done, total| sink.progress(done, total));
    sink.finish(result);
}

/// Whether a file name is packed: `.md` (exact case) or an image suffix (any case).
pub fn is_exportable(name: &str) -> bool {
    if name.ends_with(MARKDOWN_SUFFIX) {
        return true;
    }
    let lower = name.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Export synchronously, calling `on_progress(attempted, total)` after each file.
pub fn export_archive(
    source: &Path,
    dest: &Path,
    on_progress: impl FnMut(usize, usize),
) -> Result<(), ExportError> {
    let meta = std::fs::metadata(source).map_err(|e| ExportError::Source {
        path: source.to_path_buf(),
        source: e,
    })?;
    if !meta.is_dir() {
        return Err(ExportError::NotADirectory(source.to_path_buf()));
    }

    let file = File::create(dest).map_err(|e| ExportError::Create {
        path: dest.to_path_buf(),
        source: e,
    })?;
    let selected = select_files(source);
    write_archive(file, dest, &selected, on_progress)
}

/// Add each `(path, archive name)` pair, skipping files that fail.
fn write_archive(
    file: File,
    dest: &Path,
    selected: &[(PathBuf, String)],
    mut on_progress: impl FnMut(usize, usize),
) -> Result<(), ExportError> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let total = selected.len();
    let mut added = 0usize;

    for (i, (full, rel)) in selected.iter().enumerate() {
        match add_file(&mut zip, full, rel, options) {
            Ok(()) => added += 1,
            Err(e) => warn!("skipping file: {}", e),
        }
        on_progress(i + 1, total);
    }

    zip.finish().map_err(|e| ExportError::Finish {
        path: dest.to_path_buf(),
        source: e,
    })?;
    info!(
        archive = %dest.display(),
        selected = total,
        added,
        "export finished"
    );
    Ok(())
}

/// Selected files as `(absolute path, archive name)` pairs, in file-name order.
fn select_files(source: &Path) -> Vec<(PathBuf, String)> {
    let mut selected = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_exportable(&name) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let archive_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        selected.push((entry.path().to_path_buf(), archive_name));
    }
    selected
}

fn add_file(
    zip: &mut ZipWriter<File>,
    full: &Path,
    archive_name: &str,
    options: SimpleFileOptions,
) -> Result<(), ExportError> {
    // Read first so an unreadable file never leaves a half-written entry.
    let bytes = std::fs::read(full).map_err(|source| ExportError::ReadFile {
        path: full.to_path_buf(),
        source,
    })?;
    let entry = |source: zip::result::ZipError| ExportError::Entry {
        name: archive_name.to_string(),
        source,
    };
    zip.start_file(archive_name, options).map_err(entry)?;
    zip.write_all(&bytes)
        .map_err(|e| entry(zip::result::ZipError::from(e)))?;
    Ok(())
}
