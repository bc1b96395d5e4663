//! # Hexo Harness
//!
//! Metadata tooling for a directory of Hexo-style Markdown articles.
//!
//! Hexo Harness reads the YAML front matter of every article, keeps
//! category and tag usage statistics in two JSON files, and packs the
//! corpus into a zip backup. Scans and exports run on blocking workers and
//! report progress over a channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Articles   │──▶│   Scanner    │──▶│   Taxonomy    │
//! │  *.md tree  │   │ front matter │   │ category/tag  │
//! └──────┬──────┘   └──────┬──────┘   └──────┬───────┘
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐
//!   │  Export  │      │  Filter  │      │   JSON   │
//!   │   (zip)  │      │  (views) │      │  files   │
//!   └──────────┘      └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hxh scan --root ./source/_posts        # list articles, newest first
//! hxh category rescan                    # recount categories
//! hxh tag merge rs rust                  # fold one tag into another
//! hxh export --output backup.zip         # zip articles and images
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Article record and ordering |
//! | [`frontmatter`] | Front-matter decode / encode |
//! | [`scanner`] | Directory scan into the article index |
//! | [`export`] | Zip backup of articles and images |
//! | [`progress`] | Worker notifications and progress reporters |
//! | [`taxonomy`] | Category tree and tag table with persistence |
//! | [`filter`] | Substring filtering for list and tree views |
//! | [`draft`] | Single-article load, live parse and save |
//! | [`stats`] | Corpus summary |

pub mod config;
pub mod draft;
pub mod export;
pub mod filter;
pub mod frontmatter;
pub mod models;
pub mod progress;
pub mod scanner;
pub mod stats;
pub mod taxonomy;
