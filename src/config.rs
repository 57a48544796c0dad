//! # Configuration Module
//!
//! Runtime configuration for mixgrade: which genre unresolved labels fall
//! back to, an optional file of benchmark overrides, and the size of the
//! thread pool used for batch analysis.
//!
//! ## Configuration File
//!
//! The configuration is a JSON document stored in the platform-standard
//! configuration directory:
//! - Linux: `~/.config/mixgrade/config.json`
//! - macOS: `~/Library/Application Support/mixgrade/config.json`
//! - Windows: `%APPDATA%\mixgrade\config.json`
//!
//! Every field is optional:
//!
//! ```json
//! {
//!   "default_genre": "Rock",
//!   "benchmark_overrides": "benchmarks.json",
//!   "threads": 4
//! }
//! ```
//!
//! Scoring weights are deliberately absent: scores must stay comparable
//! between users and releases.

use crate::benchmark::{Benchmark, BenchmarkCatalog, DEFAULT_GENRE};
use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";

/// Returns the platform-appropriate mixgrade configuration directory.
///
/// The directory is not created: mixgrade only ever reads configuration.
///
/// # Errors
///
/// Returns an error if the platform has no standard configuration directory.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system configuration directory. Pass --config to point at a file explicitly."
        )
    })?;
    Ok(config_dir.join("mixgrade"))
}

/// Returns the platform-appropriate configuration file path.
///
/// # Platform Behavior
///
/// - **Linux**: `~/.config/mixgrade/config.json`
/// - **macOS**: `~/Library/Application Support/mixgrade/config.json`
/// - **Windows**: `%APPDATA%\mixgrade\config.json`
///
/// # Errors
///
/// See [`get_config_dir`].
///
/// # Examples
///
/// ```no_run
/// use mixgrade::config::get_config_path;
///
/// let path = get_config_path()?;
/// println!("Configuration location: {}", path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Genre whose benchmark is used for unresolvable labels
    pub default_genre: String,
    /// JSON file holding an array of benchmarks that replace or extend the
    /// built-in table. Relative paths are resolved against the directory of
    /// the configuration file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_overrides: Option<PathBuf>,
    /// Worker threads for batch analysis; rayon's default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_genre: DEFAULT_GENRE.to_string(),
            benchmark_overrides: None,
            threads: None,
            base_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the
    /// default location is tried and a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = get_config_path()?;
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            debug!(
                "No configuration at {}, using defaults",
                default_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Absolute path of the benchmark override file, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory is needed to absolutize a
    /// relative path and cannot be determined.
    pub fn overrides_path(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.benchmark_overrides else {
            return Ok(None);
        };
        let joined = match &self.base_dir {
            Some(base) => base.join(path),
            None => path.clone(),
        };
        let absolute = joined
            .absolutize()
            .with_context(|| format!("Failed to resolve path {}", joined.display()))?;
        Ok(Some(absolute.into_owned()))
    }

    /// Builds the benchmark catalog this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the override file cannot be read or parsed, holds
    /// an invalid benchmark, or `default_genre` is not in the result.
    pub fn build_catalog(&self) -> Result<BenchmarkCatalog> {
        let builtin = BenchmarkCatalog::builtin();
        let catalog = match self.overrides_path()? {
            Some(path) => {
                let contents = fs::read_to_string(&path).with_context(|| {
                    format!("Failed to read benchmark overrides {}", path.display())
                })?;
                let overrides: Vec<Benchmark> = serde_json::from_str(&contents)
                    .with_context(|| format!("Invalid benchmark overrides in {}", path.display()))?;
                debug!(
                    "Applying {} benchmark override(s) from {}",
                    overrides.len(),
                    path.display()
                );
                builtin
                    .with_overrides(overrides)
                    .with_context(|| format!("Rejected benchmark overrides in {}", path.display()))?
            }
            None => builtin.clone(),
        };
        catalog
            .with_default_genre(&self.default_genre)
            .context("Invalid default_genre in configuration")
    }
}
