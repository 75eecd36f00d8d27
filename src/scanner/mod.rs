//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Deterministic directory walking using walkdir
//! - Content fingerprinting (MD5 or BLAKE3, 128-bit)
//! - Human-readable size rendering
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Whole-file fingerprinting
//! - [`size`]: Byte count rendering (`1.5 MB`)
//!
//! # Example
//!
//! ```no_run
//! use hashdiff::scanner::{Fingerprinter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new();
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for path in walker.walk().filter_map(Result::ok) {
//!     let fp = fingerprinter.fingerprint(&path).unwrap();
//!     println!("{} {} {}", fp.hash, fp.size_hr, fp.filepath.display());
//! }
//! ```

pub mod hasher;
pub mod size;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{hash_to_hex, Fingerprint, Fingerprinter, HashAlgorithm};
pub use size::human_size;
pub use walker::Walker;

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Create a new walker configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file changed size while it was being read.
    #[error("File changed while reading {path}: expected {expected} bytes, read {read}")]
    SizeMismatch {
        /// Path of the file
        path: PathBuf,
        /// Size reported by metadata
        expected: u64,
        /// Number of bytes actually read
        read: u64,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
