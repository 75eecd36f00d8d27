//! File fingerprinting.
//!
//! # Overview
//! [`Fingerprinter`] reads a whole file into memory and produces a
//! [`Fingerprint`]: a 128-bit content digest rendered as lowercase hex,
//! the file name, the path as discovered, the exact size from metadata,
//! and a human-readable size string.
//!
//! Two digests are available. [`HashAlgorithm::Md5`] is the default and
//! matches inventories written by earlier hashdiff releases;
//! [`HashAlgorithm::Blake3`] uses the first 16 bytes of the BLAKE3 XOF.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::size::human_size;
use super::HashError;

/// Length of a content digest in bytes (128 bits).
pub const DIGEST_LEN: usize = 16;

/// Content digest used for fingerprints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5, compatible with existing inventories
    #[default]
    Md5,
    /// BLAKE3 truncated to 128 bits
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

impl HashAlgorithm {
    /// Digest a buffer.
    #[must_use]
    pub fn digest(self, bytes: &[u8]) -> [u8; DIGEST_LEN] {
        let mut out = [0u8; DIGEST_LEN];
        match self {
            HashAlgorithm::Md5 => out.copy_from_slice(&Md5::digest(bytes)),
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(bytes);
                hasher.finalize_xof().fill(&mut out);
            }
        }
        out
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &[u8]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Everything recorded about one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprint {
    /// Content digest (32 hex chars)
    pub hash: String,
    /// Last path component, converted lossily if it is not valid UTF-8
    pub filename: String,
    /// Path as discovered during the walk
    ///
    /// The inventory stores paths as text, so a non-UTF-8 path is written
    /// with U+FFFD in place of the invalid bytes; two such paths differing
    /// only in those bytes end up with the same stored text.
    pub filepath: PathBuf,
    /// Exact size in bytes, from metadata
    pub size: u64,
    /// Human-readable size
    pub size_hr: String,
}

/// Computes [`Fingerprint`]s with a fixed algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
}

impl Fingerprinter {
    /// Create a fingerprinter using the default algorithm (MD5).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fingerprinter for a specific algorithm.
    #[must_use]
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Fingerprint a single file.
    ///
    /// The whole file is read into memory. The size comes from filesystem
    /// metadata and must agree with the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read or changed size
    /// while it was being read.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let metadata = fs::metadata(path).map_err(|e| map_io_error(path, e))?;
        let bytes = fs::read(path).map_err(|e| map_io_error(path, e))?;

        let size = metadata.len();
        if bytes.len() as u64 != size {
            return Err(HashError::SizeMismatch {
                path: path.to_path_buf(),
                expected: size,
                read: bytes.len() as u64,
            });
        }

        let hash = hash_to_hex(&self.algorithm.digest(&bytes));
        if path.to_str().is_none() {
            log::warn!("Path is not valid UTF-8, recorded lossily: {}", path.display());
        }
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::trace!("{} {} ({} bytes)", hash, path.display(), size);

        Ok(Fingerprint {
            hash,
            filename,
            filepath: path.to_path_buf(),
            size,
            size_hr: human_size(size),
        })
    }
}

fn map_io_error(path: &Path, error: std::io::Error) -> HashError {
    match error.kind() {
        ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
