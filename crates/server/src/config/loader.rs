//! Configuration file loading and parsing

use super::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Standard config file names to search for
const CONFIG_FILENAMES: &[&str] = &["folio.ron", ".folio/config.ron"];

/// Load configuration from a specific file path
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_ron(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Where a configuration file was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The path named by `FOLIO_CONFIG_PATH`.
    Explicit(PathBuf),
    /// One of the standard names under the base directory.
    Discovered(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => path,
        }
    }
}

/// Picks the file to load. An explicit path that does not exist falls
/// through to the standard names under `base`.
pub fn discover_config(explicit: Option<&Path>, base: &Path) -> Option<ConfigSource> {
    if let Some(path) = explicit.filter(|path| path.exists()) {
        return Some(ConfigSource::Explicit(path.to_path_buf()));
    }
    CONFIG_FILENAMES
        .iter()
        .map(|name| base.join(name))
        .find(|path| path.exists())
        .map(ConfigSource::Discovered)
}

/// Load configuration from `FOLIO_CONFIG_PATH`, `folio.ron` or
/// `.folio/config.ron`, in that order. Defaults apply when none exists.
pub fn load_with_discovery() -> Result<Config> {
    let explicit = std::env::var_os("FOLIO_CONFIG_PATH").map(PathBuf::from);
    let base = std::env::current_dir().context("failed to read current working directory")?;

    if let Some(path) = explicit.as_deref().filter(|path| !path.exists()) {
        tracing::warn!(path = %path.display(), "FOLIO_CONFIG_PATH points at a missing file");
    }

    match discover_config(explicit.as_deref(), &base) {
        Some(source) => {
            tracing::info!(?source, "loading config");
            load_from_file(source.path())
        }
        None => {
            tracing::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Discovery followed by environment overrides.
pub fn load() -> Result<Config> {
    let mut config = load_with_discovery()?;
    config.apply_env_overrides();
    Ok(config)
}

fn parse_ron(content: &str) -> Result<Config> {
    ron::from_str(content).context("Failed to parse RON configuration")
}
