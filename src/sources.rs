//! Source registration.
//!
//! A [`SourceList`] is the ordered, duplicate-free list of directories to
//! inventory. A source's position in the list is its partition in the
//! inventory store, so removing a source shifts every later partition.
//! Callers should `reset` and re-crawl afterwards.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::store::PartitionId;

/// A registered source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Position in the source list
    pub index: usize,
    /// Root directory
    pub root: PathBuf,
}

impl Source {
    /// Partition holding this source's records.
    #[must_use]
    pub fn partition(&self) -> PartitionId {
        PartitionId(self.index)
    }
}

/// Ordered list of registered source roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceList {
    paths: Vec<PathBuf>,
}

impl SourceList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory.
    ///
    /// The path is stored canonicalized so later runs resolve it the same
    /// way regardless of the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the path does not exist, is not a
    /// directory, or is already registered.
    pub fn register(&mut self, path: impl AsRef<Path>) -> Result<Source, ConfigError> {
        let path = path.as_ref();
        let root = check_directory(path)?;

        if self.paths.iter().any(|existing| same_directory(existing, &root)) {
            return Err(ConfigError::DuplicateSource(path.to_path_buf()));
        }

        self.paths.push(root.clone());
        let source = Source {
            index: self.paths.len() - 1,
            root,
        };
        log::info!("Registered source {}: {}", source.index, source.root.display());
        Ok(source)
    }

    /// Remove the source at `index`; later sources move up by one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSource`] if no source has that index.
    pub fn remove(&mut self, index: usize) -> Result<PathBuf, ConfigError> {
        if index >= self.paths.len() {
            return Err(ConfigError::UnknownSource(index));
        }
        Ok(self.paths.remove(index))
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no source is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The source at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Source> {
        self.paths.get(index).map(|root| Source {
            index,
            root: root.clone(),
        })
    }

    /// All sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = Source> + '_ {
        self.paths.iter().enumerate().map(|(index, root)| Source {
            index,
            root: root.clone(),
        })
    }

    /// All sources, collected.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Source> {
        self.iter().collect()
    }

    /// Check that every source is still an existing directory and that no
    /// directory is listed twice.
    ///
    /// Lists loaded from a config file never went through
    /// [`register`](Self::register), so both are checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSources`] for an empty list, otherwise the
    /// first failing source's error or [`ConfigError::DuplicateSource`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for (index, root) in self.paths.iter().enumerate() {
            check_directory(root)?;
            if self.paths[..index]
                .iter()
                .any(|earlier| same_directory(earlier, root))
            {
                return Err(ConfigError::DuplicateSource(root.clone()));
            }
        }
        Ok(())
    }

    /// The two sources that get compared (indices 0 and 1).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotEnoughSources`] with fewer than two sources,
    /// or [`ConfigError::DuplicateSource`] if both name the same directory.
    pub fn compared_pair(&self) -> Result<(Source, Source), ConfigError> {
        match (self.get(0), self.get(1)) {
            (Some(left), Some(right)) if same_directory(&left.root, &right.root) => {
                Err(ConfigError::DuplicateSource(right.root))
            }
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(ConfigError::NotEnoughSources(self.len())),
        }
    }
}

fn check_directory(path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::SourceNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ConfigError::SourceNotADirectory(path.to_path_buf()));
    }
    Ok(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Prompt for source paths until an empty line.
///
/// Each accepted path is registered immediately; rejected paths are
/// reported and the prompt continues. Returns the number of sources added.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing the prompt fails.
pub fn prompt_sources<R: BufRead, W: Write>(
    sources: &mut SourceList,
    mut input: R,
    mut output: W,
) -> io::Result<usize> {
    let mut added = 0;
    let mut line = String::new();

    loop {
        write!(output, "\n  Source path : ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let entry = line.trim();
        if entry.is_empty() {
            break;
        }

        match sources.register(entry) {
            Ok(source) => {
                writeln!(output, "  added: {}", source.root.display())?;
                added += 1;
            }
            Err(e) => writeln!(output, "  rejected: {}", e)?,
        }
    }

    Ok(added)
}
