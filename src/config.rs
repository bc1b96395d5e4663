use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorpusConfig {
    /// Article directory used when a command gets no `--root`.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxonomyConfig {
    #[serde(default = "default_categories_path")]
    pub categories_path: PathBuf,
    #[serde(default = "default_tags_path")]
    pub tags_path: PathBuf,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            categories_path: default_categories_path(),
            tags_path: default_tags_path(),
        }
    }
}

fn default_categories_path() -> PathBuf {
    PathBuf::from("category_config.json")
}
fn default_tags_path() -> PathBuf {
    PathBuf::from("tag_config.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_output")]
    pub output: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output: default_export_output(),
        }
    }
}

fn default_export_output() -> PathBuf {
    PathBuf::from("hexo_articles_backup.zip")
}

impl Config {
    /// Defaults for every section, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// The corpus root: the explicit override, else `[corpus] root`.
    pub fn corpus_root(&self, root: Option<&Path>) -> Result<PathBuf> {
        match root.map(Path::to_path_buf).or_else(|| self.corpus.root.clone()) {
            Some(root) => Ok(root),
            None => anyhow::bail!("No corpus root: pass --root or set [corpus] root in the config"),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate taxonomy
    if config.taxonomy.categories_path.as_os_str().is_empty() {
        anyhow::bail!("taxonomy.categories_path must not be empty");
    }
    if config.taxonomy.tags_path.as_os_str().is_empty() {
        anyhow::bail!("taxonomy.tags_path must not be empty");
    }
    if config.taxonomy.categories_path == config.taxonomy.tags_path {
        anyhow::bail!(
            "taxonomy.categories_path and taxonomy.tags_path must differ (both are '{}')",
            config.taxonomy.tags_path.display()
        );
    }

    // Validate export
    if config.export.output.as_os_str().is_empty() {
        anyhow::bail!("export.output must not be empty");
    }

    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}
