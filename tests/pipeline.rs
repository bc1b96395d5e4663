//! Worker notification contract for scan and export.

use std::fs;
use std::path::Path;

use hexo_harness::draft::ArticleDraft;
use hexo_harness::export::spawn_export;
use hexo_harness::models::{upsert_article, Article};
use hexo_harness::progress::{TaskEvent, TaskReceiver};
use hexo_harness::scanner::spawn_scan;
use hexo_harness::taxonomy::{CategoryStore, TagStore};
use tempfile::TempDir;

/// Drain every event until the worker drops its sender.
async fn collect<T>(mut rx: TaskReceiver<T>) -> Vec<TaskEvent<T>> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn split<T>(events: Vec<TaskEvent<T>>) -> (Vec<u8>, Vec<T>, Vec<String>) {
    let mut progress = Vec::new();
    let mut completed = Vec::new();
    let mut failed = Vec::new();
    for event in events {
        match event {
            TaskEvent::Progress(p) => progress.push(p),
            TaskEvent::Completed(v) => completed.push(v),
            TaskEvent::Failed(e) => failed.push(e),
        }
    }
    (progress, completed, failed)
}

fn write(dir: &Path, rel: &str, text: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[tokio::test]
async fn scan_skips_bad_file_and_completes_once() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.md", "---\ntitle: A\ndate: 2024-01-01\ntags: [x]\n---\nbody");
    write(tmp.path(), "sub/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nbody");
    write(tmp.path(), "c.md", "---\ntitle: [unclosed\n---\nbody");

    let events = collect(spawn_scan(tmp.path())).await;
    assert!(matches!(events.last(), Some(TaskEvent::Completed(_))));
    let (progress, completed, failed) = split(events);

    assert!(failed.is_empty());
    assert_eq!(completed.len(), 1);
    let articles: &Vec<Article> = &completed[0];
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "B");

    assert_eq!(progress, vec![33, 66, 100]);
}

#[tokio::test]
async fn scan_of_missing_root_fails_once() {
    let tmp = TempDir::new().unwrap();
    let events = collect(spawn_scan(tmp.path().join("missing"))).await;
    let (progress, completed, failed) = split(events);
    assert!(progress.is_empty());
    assert!(completed.is_empty());
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("missing"));
}

#[tokio::test]
async fn export_packs_markdown_and_images_only() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("posts");
    write(&source, "a.md", "# a");
    write(&source, "b.txt", "b");
    write(&source, "img.PNG", "png");
    let dest = tmp.path().join("out.zip");

    let events = collect(spawn_export(&source, &dest)).await;
    let (progress, completed, failed) = split(events);
    assert!(failed.is_empty());
    assert_eq!(completed.len(), 1);
    assert_eq!(progress.last(), Some(&100));

    let archive = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["a.md", "img.PNG"]);
}

#[tokio::test]
async fn export_of_missing_source_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out.zip");
    let events = collect(spawn_export(tmp.path().join("missing"), &dest)).await;
    let (_, completed, failed) = split(events);
    assert!(completed.is_empty());
    assert_eq!(failed.len(), 1);
    assert!(!dest.exists());
}

#[tokio::test]
async fn scan_feeds_taxonomy_rescan() {
    let tmp = TempDir::new().unwrap();
    let posts = tmp.path().join("posts");
    write(
        &posts,
        "one.md",
        "---\ntitle: One\ncategories:\n  - Tech/Rust\ntags: [rust]\n---\n",
    );
    write(
        &posts,
        "two.md",
        "---\ntitle: Two\ncategories: Tech\ntags: [rust, cli]\n---\n",
    );

    let events = collect(spawn_scan(&posts)).await;
    let (_, mut completed, _) = split(events);
    let articles = completed.pop().unwrap();

    let mut categories = CategoryStore::open(tmp.path().join("category_config.json")).unwrap();
    let mut tags = TagStore::open(tmp.path().join("tag_config.json")).unwrap();
    categories.rescan(&articles).unwrap();
    tags.rescan(&articles).unwrap();

    assert_eq!(categories.enumeration(), vec!["Tech", "Tech/Rust"]);
    assert_eq!(categories.data().get("Tech").unwrap().count, 2);
    assert_eq!(tags.data().ranked(), vec![("rust", 2), ("cli", 1)]);

    // Running it again changes nothing.
    let before = categories.data().clone();
    categories.rescan(&articles).unwrap();
    assert_eq!(categories.data(), &before);
}

#[tokio::test]
async fn saved_drafts_update_the_scanned_index() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "old.md", "---\ntitle: Old\ndate: 2024-01-01\n---\nbody");

    let (_, mut completed, _) = split(collect(spawn_scan(tmp.path())).await);
    let mut index = completed.pop().unwrap();
    assert_eq!(index.len(), 1);

    let mut edited = ArticleDraft::load(&tmp.path().join("old.md")).unwrap();
    edited.title = "Old, revised".into();
    upsert_article(&mut index, edited.save(tmp.path()).unwrap());
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].title, "Old, revised");

    let mut fresh = ArticleDraft::new_now();
    fresh.title = "Fresh Post".into();
    upsert_article(&mut index, fresh.save(tmp.path()).unwrap());
    assert_eq!(index.len(), 2);
    assert_eq!(index[1].path, tmp.path().join("Fresh-Post.md"));

    // The index matches what a rescan would find.
    let (_, mut completed, _) = split(collect(spawn_scan(tmp.path())).await);
    let mut rescanned = completed.pop().unwrap();
    rescanned.sort_by(|a, b| a.path.cmp(&b.path));
    index.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(rescanned, index);
}
