//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] enumerates every regular file below a source root. Entries are
//! sorted by file name at each level and visited depth-first, so the list
//! produced for a given tree is the same on every run.
//!
//! Symlinked directories are not descended into unless
//! [`WalkerConfig::follow_symlinks`] is set; cycles are not detected either
//! way. Symlinks to regular files are always listed under the link's path.
//! A dangling link is reported as [`ScanError::NotFound`].
//!
//! # Example
//!
//! ```no_run
//! use hashdiff::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/srv/backup"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Sorted, single-threaded file enumerator.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the tree, yielding the path of every regular file.
    ///
    /// Errors are yielded as [`ScanError`] values rather than ending the
    /// iteration; the caller decides whether they are fatal.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !(skip_hidden && Self::is_hidden(entry)))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        Some(Ok(entry.into_path()))
                    } else if entry.path_is_symlink() && !self.config.follow_symlinks {
                        Self::resolve_symlink(entry)
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    /// A link that is not followed still counts when it points at a regular
    /// file; links to directories are not descended into.
    fn resolve_symlink(entry: DirEntry) -> Option<Result<PathBuf, ScanError>> {
        match std::fs::metadata(entry.path()) {
            Ok(target) if target.is_file() => Some(Ok(entry.into_path())),
            Ok(_) => {
                log::trace!("Skipping symlinked directory: {}", entry.path().display());
                None
            }
            Err(e) => Some(Err(convert_io_error(entry.into_path(), e))),
        }
    }

    /// Collect all files, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScanError`] encountered.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, ScanError> {
        self.walk().collect()
    }

    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.into_io_error() {
            Some(io) => convert_io_error(path, io),
            None => {
                log::warn!("Symlink loop at {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("symlink loop detected"),
                }
            }
        }
    }
}

fn convert_io_error(path: PathBuf, io: std::io::Error) -> ScanError {
    match io.kind() {
        std::io::ErrorKind::PermissionDenied => {
            log::warn!("Permission denied: {}", path.display());
            ScanError::PermissionDenied(path)
        }
        std::io::ErrorKind::NotFound => {
            log::debug!("Path not found (may have been deleted): {}", path.display());
            ScanError::NotFound(path)
        }
        _ => {
            log::warn!("I/O error for {}: {}", path.display(), io);
            ScanError::Io { path, source: io }
        }
    }
}
