//! # Hexo Harness CLI (`hxh`)
//!
//! The `hxh` binary manages a directory of Hexo-style Markdown articles:
//! scanning front matter, maintaining the category and tag statistics
//! files, and packing the corpus into a zip backup.
//!
//! ## Usage
//!
//! ```bash
//! hxh --config ./config/hxh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hxh scan` | List every article, newest first |
//! | `hxh find <query>` | List articles whose title contains the query |
//! | `hxh export` | Zip articles and images into a backup archive |
//! | `hxh show <file>` | Print one article's metadata |
//! | `hxh new <title>` | Create a new article dated now |
//! | `hxh stats` | Summarize the corpus |
//! | `hxh category <action>` | List, rescan, add, rename, merge or delete categories |
//! | `hxh tag <action>` | Same actions for tags |
//!
//! ## Examples
//!
//! ```bash
//! # Recount categories after editing posts
//! hxh category rescan --root ./source/_posts
//!
//! # Fold a subcategory into another main category
//! hxh category merge Notes/Rust Programming
//!
//! # Backup with machine-readable progress on stderr
//! hxh export --progress json --output backup.zip
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hexo_harness::config::{self, Config};
use hexo_harness::draft::{join_list, parse_list, ArticleDraft};
use hexo_harness::export::spawn_export;
use hexo_harness::filter::{filter_articles, filter_tags, filter_tree};
use hexo_harness::models::Article;
use hexo_harness::progress::{wait_for, ProgressMode, ProgressReporter};
use hexo_harness::scanner::spawn_scan;
use hexo_harness::stats;
use hexo_harness::taxonomy::{
    CategoryRef, CategoryStore, TagStore, Taxonomy, TaxonomyStore, TreeRow,
};

/// Hexo Harness CLI: manage article metadata, taxonomy statistics and
/// backups for a Hexo blog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "hxh",
    about = "Hexo Harness: article metadata, taxonomy and backup tool for Hexo blogs",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/hxh.toml`. Missing file means defaults.
    #[arg(long, global = true, default_value = "./config/hxh.toml")]
    config: PathBuf,

    /// Progress output on stderr: auto, human, json, or off.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan the corpus and list every article, newest first.
    Scan {
        /// Article directory (overrides `[corpus] root`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Print the article index as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List articles whose title contains the query (case-insensitive).
    Find {
        query: String,

        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Pack every `.md` file and image under the corpus into a zip archive.
    Export {
        #[arg(long)]
        root: Option<PathBuf>,

        /// Archive path (overrides `[export] output`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the metadata of one article file.
    Show { file: PathBuf },

    /// Create a new article dated now.
    New {
        title: String,

        /// Directory for the new file (defaults to the corpus root).
        #[arg(long)]
        dir: Option<PathBuf>,

        #[arg(long, default_value = "")]
        cover: String,

        /// Comma-separated, e.g. "Tech/Rust, Life".
        #[arg(long, default_value = "")]
        categories: String,

        /// Comma-separated.
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// Summarize the corpus.
    Stats {
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Manage the category tree (`Main` or `Main/Sub`).
    Category {
        #[command(subcommand)]
        action: TaxonomyAction,
    },

    /// Manage the tag table.
    Tag {
        #[command(subcommand)]
        action: TaxonomyAction,
    },
}

/// Actions shared by both taxonomies.
#[derive(Subcommand)]
enum TaxonomyAction {
    /// Show stored nodes and their counts.
    List {
        /// Only show nodes whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Recount from the articles under the corpus root.
    Rescan {
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Declare a node with a zero count.
    Add { name: String },
    /// Rename a node, keeping its count.
    Rename { name: String, new_name: String },
    /// Merge `source` into `target`; `source` disappears.
    Merge { source: String, target: String },
    /// Remove a node from the statistics file (articles are not touched).
    Delete { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;
    let reporter = ProgressMode::from_flag(&cli.progress)?.reporter();
    let reporter = reporter.as_ref();

    match cli.command {
        Commands::Scan { root, json } => {
            let articles = scan(&cfg, root.as_deref(), reporter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&articles)?);
            } else {
                for article in &articles {
                    println!("{}\t{}", article.display_label(), article.path.display());
                }
            }
        }
        Commands::Find { query, root } => {
            let articles = scan(&cfg, root.as_deref(), reporter).await?;
            let hits = filter_articles(&articles, &query);
            if hits.is_empty() {
                println!("No articles match '{}'.", query);
            }
            for (index, article) in hits.iter() {
                println!("{:>4}  {}", index, article.display_label());
            }
        }
        Commands::Export { root, output } => {
            let root = cfg.corpus_root(root.as_deref())?;
            let output = output.unwrap_or_else(|| cfg.export.output.clone());
            wait_for(spawn_export(&root, &output), "export", reporter).await?;
            println!("Exported {} to {}", root.display(), output.display());
        }
        Commands::Show { file } => {
            let draft = ArticleDraft::load(&file)?;
            println!("title:      {}", draft.title);
            println!("date:       {}", draft.date);
            println!("cover:      {}", draft.cover);
            println!("categories: {}", join_list(&draft.categories));
            println!("tags:       {}", join_list(&draft.tags));
            println!("body:       {} chars", draft.body.chars().count());
        }
        Commands::New {
            title,
            dir,
            cover,
            categories,
            tags,
        } => {
            let dir = cfg.corpus_root(dir.as_deref())?;
            let mut draft = ArticleDraft::new_now();
            draft.title = title;
            draft.cover = cover;
            draft.categories = parse_list(&categories);
            draft.tags = parse_list(&tags);
            let target = dir.join(draft.file_name()?);
            if target.exists() {
                bail!("Article already exists: {}", target.display());
            }
            let article = draft.save(&dir)?;
            println!("Created {}", article.path.display());
        }
        Commands::Stats { root } => {
            let root = cfg.corpus_root(root.as_deref())?;
            let articles = wait_for(spawn_scan(&root), "scan", reporter).await?;
            stats::print_stats(&root, &stats::summarize(&articles));
        }
        Commands::Category { action } => {
            let mut store = CategoryStore::open(&cfg.taxonomy.categories_path)?;
            match action {
                TaxonomyAction::List { filter } => {
                    let rows = store.data().rows();
                    let rows = match filter {
                        Some(query) => filter_tree(&rows, &query),
                        None => rows,
                    };
                    print_tree(&rows);
                }
                other => {
                    run_taxonomy_action(&cfg, &mut store, other, CategoryRef::parse, reporter)
                        .await?
                }
            }
        }
        Commands::Tag { action } => {
            let mut store = TagStore::open(&cfg.taxonomy.tags_path)?;
            match action {
                TaxonomyAction::List { filter } => {
                    let query = filter.unwrap_or_default();
                    for (name, count) in filter_tags(store.data(), &query) {
                        println!("{:<32} {:>6}", name, count);
                    }
                }
                other => {
                    run_taxonomy_action(&cfg, &mut store, other, parse_tag, reporter).await?
                }
            }
        }
    }

    Ok(())
}

async fn scan(
    cfg: &Config,
    root: Option<&Path>,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<Article>> {
    let root = cfg.corpus_root(root)?;
    wait_for(spawn_scan(&root), "scan", reporter).await
}

fn parse_tag(name: &str) -> String {
    name.to_string()
}

/// Every action except `list`, which renders differently per taxonomy.
async fn run_taxonomy_action<T: Taxonomy>(
    cfg: &Config,
    store: &mut TaxonomyStore<T>,
    action: TaxonomyAction,
    parse: fn(&str) -> T::Node,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    match action {
        TaxonomyAction::List { .. } => {
            // Handled by the caller
            unreachable!()
        }
        TaxonomyAction::Rescan { root } => {
            let articles = scan(cfg, root.as_deref(), reporter).await?;
            store.rescan(&articles)?;
            println!(
                "Rescanned {} articles: {} {} names",
                articles.len(),
                store.enumeration().len(),
                T::KIND
            );
        }
        TaxonomyAction::Add { name } => {
            store.add(&parse(&name))?;
            println!("Added {} '{}'", T::KIND, name);
        }
        TaxonomyAction::Rename { name, new_name } => {
            store.rename(&parse(&name), &new_name)?;
            println!("Renamed {} '{}' to '{}'", T::KIND, name, new_name);
        }
        TaxonomyAction::Merge { source, target } => {
            store.merge(&[parse(&source), parse(&target)])?;
            println!("Merged {} '{}' into '{}'", T::KIND, source, target);
        }
        TaxonomyAction::Delete { name } => {
            store.delete(&parse(&name))?;
            println!("Deleted {} '{}'", T::KIND, name);
        }
    }
    Ok(())
}

fn print_tree(rows: &[TreeRow]) {
    for row in rows {
        println!("{} ({})", row.name, row.count);
        for child in &row.children {
            println!("  {} ({})", child.name, child.count);
        }
    }
}
