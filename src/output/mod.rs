//! Output formatters for diff reports.
//!
//! A [`Report`] holds, per compared partition, the records still flagged
//! `diff` after a comparison: the files whose content exists on one side
//! only. It can be rendered as:
//! - an aligned console table ([`TableOutput`])
//! - JSON for automation and scripting ([`JsonOutput`])
//! - CSV for spreadsheet import ([`CsvOutput`])
//!
//! # Example
//!
//! ```no_run
//! use hashdiff::output::{Report, TableOutput};
//! use hashdiff::sources::SourceList;
//! use hashdiff::store::InventoryStore;
//!
//! let store = InventoryStore::open_in_memory().unwrap();
//! let sources = SourceList::new();
//! let report = Report::collect(&store, &sources.to_vec()).unwrap();
//! TableOutput::new(&report).write_to(std::io::stdout()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod table;

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::sources::Source;
use crate::store::{FileRecord, Flag, InventoryStore, PartitionId, StoreResult};

// Re-export main types
pub use self::csv::CsvOutput;
pub use json::JsonOutput;
pub use table::TableOutput;

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Diff records of one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionReport {
    /// Partition the records come from
    pub partition: PartitionId,
    /// Source root of the partition
    pub root: PathBuf,
    /// Records flagged `diff`, ordered by id
    pub records: Vec<FileRecord>,
}

/// Diff records of every compared partition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// One entry per source, in partition order
    pub partitions: Vec<PartitionReport>,
}

impl Report {
    /// Gather the `diff` records of each given source.
    ///
    /// # Errors
    ///
    /// Returns [`crate::store::StoreError`] if a partition is missing or a
    /// query fails.
    pub fn collect(store: &InventoryStore, sources: &[Source]) -> StoreResult<Self> {
        let partitions = sources
            .iter()
            .map(|source| {
                Ok(PartitionReport {
                    partition: source.partition(),
                    root: source.root.clone(),
                    records: store.list_by_flag(source.partition(), Flag::Diff)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { partitions })
    }

    /// Number of diff records across all partitions.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.partitions.iter().map(|p| p.records.len()).sum()
    }

    /// `true` if no partition has a diff record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    /// Every record with its partition, in partition then id order.
    pub fn rows(&self) -> impl Iterator<Item = (PartitionId, &FileRecord)> {
        self.partitions
            .iter()
            .flat_map(|p| p.records.iter().map(move |r| (p.partition, r)))
    }
}
