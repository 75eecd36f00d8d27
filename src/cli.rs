//! Command-line interface definitions for hashdiff.
//!
//! All arguments and subcommands use the clap derive API. Global options
//! (verbosity, color, config and database paths) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Register the two trees to compare
//! hashdiff source add /srv/photos /mnt/backup/photos
//!
//! # Crawl, compare and print the files without a counterpart
//! hashdiff run
//!
//! # Start over and export as CSV
//! hashdiff run --fresh --output csv > diff.csv
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::crawler::ReadErrorPolicy;
use crate::scanner::HashAlgorithm;

/// Inventory two directory trees and list the files unique to each.
///
/// Every file is fingerprinted by content and stored per source; files whose
/// content exists in both sources are flagged shared, the rest are reported.
#[derive(Debug, Parser)]
#[command(name = "hashdiff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, value_name = "PATH", env = "HASHDIFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Inventory database (overrides the configured path)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register sources interactively, one path per line
    Init,
    /// Manage registered sources
    #[command(subcommand)]
    Source(SourceCommand),
    /// Fingerprint every file of every source into the inventory
    Crawl(CrawlArgs),
    /// Flag content present in both of the first two sources
    Compare,
    /// List files of the first two sources that have no counterpart
    Report(ReportArgs),
    /// Crawl, compare and report in one go
    Run(RunArgs),
    /// Delete every inventoried record
    Reset,
}

/// Source management subcommands.
#[derive(Debug, Subcommand)]
pub enum SourceCommand {
    /// Register one or more directories
    Add {
        /// Directories to register, in order
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show registered sources with their index
    List,
    /// Unregister the source at INDEX (later sources move up)
    Remove {
        /// Index shown by `source list`
        #[arg(value_name = "INDEX")]
        index: usize,
    },
}

/// Arguments for crawling.
#[derive(Debug, Clone, Default, Args)]
pub struct CrawlArgs {
    /// Clear each partition before crawling it
    #[arg(long)]
    pub fresh: bool,

    /// Skip unreadable files instead of aborting
    #[arg(long)]
    pub skip_unreadable: bool,

    /// Content digest to use
    #[arg(long, value_enum, value_name = "ALGO")]
    pub algorithm: Option<HashAlgorithm>,

    /// Follow symbolic links during the crawl
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

impl CrawlArgs {
    /// Read error policy requested on the command line, if any.
    #[must_use]
    pub fn read_error_policy(&self) -> Option<ReadErrorPolicy> {
        self.skip_unreadable.then_some(ReadErrorPolicy::Skip)
    }
}

/// Arguments for reporting.
#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for a full run.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub crawl: CrawlArgs,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Report output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned console table
    #[default]
    Table,
    /// JSON document
    Json,
    /// CSV, one row per file
    Csv,
}
