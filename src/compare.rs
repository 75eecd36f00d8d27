//! Two-partition comparison.
//!
//! # Overview
//!
//! [`Comparator::compare`] loads the hash lists of partitions A and B, and
//! for every hash of A (in insertion order) that also occurs in B, flags
//! every record carrying that hash as [`Flag::Shared`] on both sides.
//! Records whose hash occurs on one side only keep [`Flag::Diff`] and are
//! never written.
//!
//! Flags are set by hash, so duplicates fan out: three records in A and one
//! in B with the same content all end up shared. Flags are never reset to
//! `diff` by a comparison; run a fresh crawl to start over.
//!
//! # Example
//!
//! ```no_run
//! use hashdiff::compare::compare;
//! use hashdiff::store::{InventoryStore, PartitionId};
//!
//! let store = InventoryStore::open_in_memory().unwrap();
//! store.create_partition(PartitionId(0)).unwrap();
//! store.create_partition(PartitionId(1)).unwrap();
//! let summary = compare(&store, PartitionId(0), PartitionId(1)).unwrap();
//! println!("{} hashes in both sources", summary.matched_hashes);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::progress::{ProgressCallback, PHASE_COMPARE};
use crate::store::{Flag, InventoryStore, PartitionId, StoreError};

/// Errors that end a comparison.
#[derive(thiserror::Error, Debug)]
pub enum CompareError {
    /// The comparison was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Compare interrupted by user")]
    Interrupted,

    /// Both sides name the same partition.
    #[error("Cannot compare partition {0} with itself")]
    SamePartition(PartitionId),

    /// The inventory store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration for a comparison.
#[derive(Clone, Default)]
pub struct CompareConfig {
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CompareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareConfig")
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl CompareConfig {
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

/// Outcome of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareSummary {
    /// Left partition
    pub left: PartitionId,
    /// Right partition
    pub right: PartitionId,
    /// Records in the left partition
    pub left_hashes: usize,
    /// Records in the right partition
    pub right_hashes: usize,
    /// Distinct hashes present on both sides
    pub matched_hashes: usize,
    /// Left rows flagged shared
    pub left_flagged: usize,
    /// Right rows flagged shared
    pub right_flagged: usize,
}

/// Flags content shared between two partitions.
pub struct Comparator<'a> {
    store: &'a InventoryStore,
    config: CompareConfig,
}

impl<'a> Comparator<'a> {
    /// Create a comparator over `store`.
    #[must_use]
    pub fn new(store: &'a InventoryStore, config: CompareConfig) -> Self {
        Self { store, config }
    }

    /// Compare partition `left` against partition `right`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::SamePartition`] if both sides are the same,
    /// [`CompareError::Store`] if either partition is missing or a query
    /// fails, and [`CompareError::Interrupted`] on shutdown. Flags written
    /// before an interruption stay committed.
    pub fn compare(
        &self,
        left: PartitionId,
        right: PartitionId,
    ) -> Result<CompareSummary, CompareError> {
        if left == right {
            return Err(CompareError::SamePartition(left));
        }

        let left_hashes = self.store.list_hashes(left)?;
        let right_hashes = self.store.list_hashes(right)?;
        let right_set: HashSet<&str> = right_hashes.iter().map(String::as_str).collect();

        log::info!(
            "Comparing partition {} ({} records) with partition {} ({} records)",
            left,
            left_hashes.len(),
            right,
            right_hashes.len()
        );

        let mut summary = CompareSummary {
            left,
            right,
            left_hashes: left_hashes.len(),
            right_hashes: right_hashes.len(),
            ..Default::default()
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_COMPARE, left_hashes.len());
        }

        let result = self.flag_matches(&left_hashes, &right_set, &mut summary);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_COMPARE);
        }
        result?;

        log::info!(
            "Compare finished: {} shared hashes, {} + {} records flagged",
            summary.matched_hashes,
            summary.left_flagged,
            summary.right_flagged
        );
        Ok(summary)
    }

    fn flag_matches(
        &self,
        left_hashes: &[String],
        right_set: &HashSet<&str>,
        summary: &mut CompareSummary,
    ) -> Result<(), CompareError> {
        let mut flagged: HashSet<&str> = HashSet::new();

        for (idx, hash) in left_hashes.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::debug!("Comparator: Shutdown requested after {} hashes", idx);
                return Err(CompareError::Interrupted);
            }

            if right_set.contains(hash.as_str()) && flagged.insert(hash.as_str()) {
                let store = self.store;
                summary.left_flagged += store.set_flag_by_hash(summary.left, hash, Flag::Shared)?;
                summary.right_flagged += store.set_flag_by_hash(summary.right, hash, Flag::Shared)?;
                summary.matched_hashes += 1;
                log::trace!("Shared: {}", hash);
            }

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(idx + 1, hash);
            }
        }
        Ok(())
    }
}

/// Compare two partitions with the default configuration.
///
/// # Errors
///
/// See [`Comparator::compare`].
pub fn compare(
    store: &InventoryStore,
    left: PartitionId,
    right: PartitionId,
) -> Result<CompareSummary, CompareError> {
    Comparator::new(store, CompareConfig::default()).compare(left, right)
}
