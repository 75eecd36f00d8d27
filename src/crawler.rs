//! Source crawler.
//!
//! # Overview
//!
//! [`Crawler::crawl`] processes sources in registration order. For source
//! `i` it creates partition `i`, enumerates every regular file under the
//! root with [`Walker`], fingerprints each one and appends the record.
//! Crawls are append-only: running twice over the same partition duplicates
//! its rows unless [`CrawlerConfig::fresh`] is set.
//!
//! # Read errors
//!
//! A file that cannot be read is handled according to [`ReadErrorPolicy`]:
//! `Abort` (the default) stops the crawl with [`CrawlError::Read`], `Skip`
//! logs a warning, records the error in the [`SourceSummary`] and carries
//! on. The policy is fixed for the whole crawl.
//!
//! # Example
//!
//! ```no_run
//! use hashdiff::crawler::{Crawler, CrawlerConfig};
//! use hashdiff::sources::SourceList;
//! use hashdiff::store::InventoryStore;
//!
//! let mut sources = SourceList::new();
//! sources.register("/srv/a").unwrap();
//! sources.register("/srv/b").unwrap();
//!
//! let store = InventoryStore::open_in_memory().unwrap();
//! let summary = Crawler::new(&store, CrawlerConfig::default())
//!     .crawl(&sources.to_vec())
//!     .unwrap();
//! println!("{} files recorded", summary.total_files());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::progress::{ProgressCallback, PHASE_CRAWL};
use crate::scanner::{
    Fingerprinter, HashAlgorithm, HashError, ScanError, Walker, WalkerConfig,
};
use crate::sources::Source;
use crate::store::{InventoryStore, PartitionId, StoreError};

/// How unreadable files are handled during a crawl.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    /// Stop the crawl at the first unreadable file
    #[default]
    Abort,
    /// Log the file, leave it out of the inventory and continue
    Skip,
}

/// A file that could not be enumerated or fingerprinted.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// Failure while walking the directory tree.
    #[error(transparent)]
    Walk(#[from] ScanError),

    /// Failure while reading a file's content.
    #[error(transparent)]
    Fingerprint(#[from] HashError),
}

/// Errors that end a crawl.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// The crawl was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Crawl interrupted by user")]
    Interrupted,

    /// The source root is gone or no longer a directory.
    #[error("Source {index} is not a readable directory: {root}")]
    SourceUnavailable {
        /// Source index
        index: usize,
        /// Root path
        root: PathBuf,
    },

    /// A file could not be read and the policy is [`ReadErrorPolicy::Abort`].
    #[error("Failed to read file in source {partition}: {source}")]
    Read {
        /// Partition being crawled
        partition: PartitionId,
        /// The underlying read error
        #[source]
        source: ReadError,
    },

    /// The inventory store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration for a crawl.
#[derive(Clone, Default)]
pub struct CrawlerConfig {
    /// Directory walking options.
    pub walker: WalkerConfig,
    /// Content digest.
    pub algorithm: HashAlgorithm,
    /// Read error handling.
    pub on_read_error: ReadErrorPolicy,
    /// Clear each partition before crawling it.
    pub fresh: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CrawlerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlerConfig")
            .field("walker", &self.walker)
            .field("algorithm", &self.algorithm)
            .field("on_read_error", &self.on_read_error)
            .field("fresh", &self.fresh)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl CrawlerConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker = config;
        self
    }

    /// Set the content digest.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read error policy.
    #[must_use]
    pub fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.on_read_error = policy;
        self
    }

    /// Clear partitions before crawling them.
    #[must_use]
    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Result of crawling one source.
#[derive(Debug, Default)]
pub struct SourceSummary {
    /// Partition written
    pub partition: PartitionId,
    /// Source root
    pub root: PathBuf,
    /// Records appended
    pub files_recorded: usize,
    /// Sum of recorded file sizes
    pub total_bytes: u64,
    /// Rows removed by a fresh crawl
    pub cleared: usize,
    /// Files left out under [`ReadErrorPolicy::Skip`]
    pub skipped: Vec<ReadError>,
}

/// Result of a full crawl.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    /// One entry per source, in order
    pub sources: Vec<SourceSummary>,
    /// Wall time of the crawl
    pub duration: Duration,
}

impl CrawlSummary {
    /// Records appended across all sources.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.sources.iter().map(|s| s.files_recorded).sum()
    }

    /// Files skipped across all sources.
    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.sources.iter().map(|s| s.skipped.len()).sum()
    }
}

/// Walks sources and writes their fingerprints into the store.
pub struct Crawler<'a> {
    store: &'a InventoryStore,
    fingerprinter: Fingerprinter,
    config: CrawlerConfig,
}

impl<'a> Crawler<'a> {
    /// Create a crawler writing into `store`.
    #[must_use]
    pub fn new(store: &'a InventoryStore, config: CrawlerConfig) -> Self {
        Self {
            store,
            fingerprinter: Fingerprinter::with_algorithm(config.algorithm),
            config,
        }
    }

    /// Crawl every source in order.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError`] on interruption, an unavailable source root,
    /// an unreadable file under [`ReadErrorPolicy::Abort`], or a store
    /// failure. Records written before the error stay committed.
    pub fn crawl(&self, sources: &[Source]) -> Result<CrawlSummary, CrawlError> {
        let start = Instant::now();
        let mut summary = CrawlSummary::default();

        for source in sources {
            summary.sources.push(self.crawl_source(source)?);
        }

        summary.duration = start.elapsed();
        log::info!(
            "Crawl finished: {} files from {} sources in {:.2?}",
            summary.total_files(),
            summary.sources.len(),
            summary.duration
        );
        Ok(summary)
    }

    /// Crawl a single source into its partition.
    ///
    /// # Errors
    ///
    /// See [`crawl`](Self::crawl).
    pub fn crawl_source(&self, source: &Source) -> Result<SourceSummary, CrawlError> {
        let partition = source.partition();
        if !source.root.is_dir() {
            return Err(CrawlError::SourceUnavailable {
                index: source.index,
                root: source.root.clone(),
            });
        }

        log::info!(
            "Crawling source {}: {}",
            source.index,
            source.root.display()
        );

        let mut summary = SourceSummary {
            partition,
            root: source.root.clone(),
            ..Default::default()
        };

        self.store.create_partition(partition)?;
        if self.config.fresh {
            summary.cleared = self.store.clear_partition(partition)?;
        }

        let files = self.enumerate(source, &mut summary)?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_message(&format!("source {}", source.index));
            callback.on_phase_start(PHASE_CRAWL, files.len());
        }

        let result = self.record_files(partition, &files, &mut summary);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_CRAWL);
        }
        result?;

        log::info!(
            "Source {}: recorded {} files ({}), skipped {}",
            source.index,
            summary.files_recorded,
            crate::scanner::human_size(summary.total_bytes),
            summary.skipped.len()
        );
        Ok(summary)
    }

    fn enumerate(
        &self,
        source: &Source,
        summary: &mut SourceSummary,
    ) -> Result<Vec<PathBuf>, CrawlError> {
        let mut walker = Walker::new(&source.root, self.config.walker.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => self.handle_read_error(summary, e.into())?,
            }
        }

        if self.config.is_shutdown_requested() {
            return Err(CrawlError::Interrupted);
        }

        log::debug!(
            "Source {}: {} files discovered",
            source.index,
            files.len()
        );
        Ok(files)
    }

    fn record_files(
        &self,
        partition: PartitionId,
        files: &[PathBuf],
        summary: &mut SourceSummary,
    ) -> Result<(), CrawlError> {
        for (idx, path) in files.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::debug!("Crawler: Shutdown requested after {} files", idx);
                return Err(CrawlError::Interrupted);
            }

            match self.fingerprinter.fingerprint(path) {
                Ok(fingerprint) => {
                    self.store.append(partition, &fingerprint)?;
                    summary.files_recorded += 1;
                    summary.total_bytes += fingerprint.size;
                }
                Err(e) => self.handle_read_error(summary, e.into())?,
            }

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(idx + 1, &display_path(path));
            }
        }
        Ok(())
    }

    fn handle_read_error(
        &self,
        summary: &mut SourceSummary,
        error: ReadError,
    ) -> Result<(), CrawlError> {
        match self.config.on_read_error {
            ReadErrorPolicy::Abort => Err(CrawlError::Read {
                partition: summary.partition,
                source: error,
            }),
            ReadErrorPolicy::Skip => {
                log::warn!("Skipping unreadable file: {}", error);
                summary.skipped.push(error);
                Ok(())
            }
        }
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
