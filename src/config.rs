use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Tool configuration, owned by the caller and read-only to the core.
///
/// The core never persists configuration; it is handed a fresh `Config` at
/// start-up and on every reconfiguration.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Absolute path to the folder tree being indexed.
    pub folder: PathBuf,
    /// Case-insensitive substrings matched against a file's stem; a match
    /// excludes the file from indexing and from search results.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Whether indexing descends into subfolders. Search-time subfolder
    /// scope is a separate per-query flag, independent of this.
    #[serde(default)]
    pub recurse_on_index: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Absolute path of the SQLite index file. Created on first run.
    pub path: PathBuf,
}

impl Config {
    /// True if the file's stem contains any exclusion pattern,
    /// case-insensitively. Applied at index time and re-applied at query
    /// time as a second check.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let stem = match path.file_stem() {
            Some(s) => s.to_string_lossy().to_lowercase(),
            None => return false,
        };
        self.source
            .exclude_patterns
            .iter()
            .any(|p| !p.is_empty() && stem.contains(&p.to_lowercase()))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if !config.source.folder.is_absolute() {
        anyhow::bail!(
            "source.folder must be an absolute path, got: {}",
            config.source.folder.display()
        );
    }

    if !config.index.path.is_absolute() {
        anyhow::bail!(
            "index.path must be an absolute path, got: {}",
            config.index.path.display()
        );
    }

    Ok(config)
}
