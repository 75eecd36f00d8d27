//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. The TOML config file (`<config_dir>/hashdiff/config.toml` or `--config`)
//! 3. `HASHDIFF_*` environment variables
//! 4. CLI flags (applied by the caller)
//!
//! The registered source list lives in the same file, so `hashdiff source add`
//! and `hashdiff init` persist their changes through [`Config::save_to`].
//!
//! # Example
//!
//! ```toml
//! sources = ["/srv/photos", "/mnt/backup/photos"]
//! database = "/var/lib/hashdiff/inventory.db"
//! algorithm = "md5"
//! on_read_error = "abort"
//! follow_symlinks = false
//! skip_hidden = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::crawler::ReadErrorPolicy;
use crate::scanner::HashAlgorithm;
use crate::sources::SourceList;

/// Prefix for environment overrides (`HASHDIFF_ALGORITHM=blake3`).
pub const ENV_PREFIX: &str = "HASHDIFF_";

/// File name of the inventory database inside the data directory.
pub const DEFAULT_DATABASE_NAME: &str = "inventory.db";

/// Configuration and source registration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source path does not exist.
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// A source path is not a directory.
    #[error("Source path is not a directory: {0}")]
    SourceNotADirectory(PathBuf),

    /// The source is already registered.
    #[error("Source already registered: {0}")]
    DuplicateSource(PathBuf),

    /// No source at the given index.
    #[error("No source registered at index {0}")]
    UnknownSource(usize),

    /// Fewer than two sources are registered.
    #[error("At least two sources are required to compare, {0} registered")]
    NotEnoughSources(usize),

    /// No sources are registered at all.
    #[error("No sources registered. Run `hashdiff init` or `hashdiff source add <PATH>`")]
    NoSources,

    /// The layered configuration could not be extracted.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write configuration {path}: {source}")]
    Write {
        /// Target path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No home directory to derive default paths from.
    #[error("Failed to determine project directories")]
    NoProjectDirs,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registered sources, in partition order.
    pub sources: SourceList,

    /// Inventory database path. Defaults to `<data_dir>/inventory.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Content digest used while crawling.
    pub algorithm: HashAlgorithm,

    /// What to do when a file cannot be read during a crawl.
    pub on_read_error: ReadErrorPolicy,

    /// Follow symbolic links while walking sources.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories.
    pub skip_hidden: bool,
}

impl Config {
    /// Load from the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or environment holds invalid values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Load from a specific file, layered over defaults and under the environment.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if extraction fails.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {}", path.display());
        Self::figment(path).extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// The figment stack used by [`load_from_path`](Self::load_from_path).
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Persist a changed source list without baking environment overrides
    /// into the file.
    ///
    /// The file is re-read on its own (defaults < TOML), its sources are
    /// replaced, and the result is written back.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the existing file cannot be read or the
    /// new one cannot be written.
    pub fn save_sources_to(path: &Path, sources: &SourceList) -> Result<(), ConfigError> {
        let mut stored: Self = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        stored.sources = sources.clone();
        stored.save_to(path)
    }

    /// Save to a specific file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no home directory is known.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Inventory database path, falling back to the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no path is configured and
    /// no home directory is known.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DEFAULT_DATABASE_NAME)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "hashdiff", "hashdiff").ok_or(ConfigError::NoProjectDirs)
}
