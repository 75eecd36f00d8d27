//! hashdiff - content-based directory tree comparison
//!
//! Inventories every file under the registered source directories into a
//! SQLite database (one table per source), flags content present in both of
//! the first two sources as shared, and reports the files left without a
//! counterpart.
//!
//! The pipeline is strictly sequential: [`crawler`] → [`compare`] →
//! [`output`]. One [`store::InventoryStore`] is opened per run and handed to
//! each phase.

pub mod cli;
pub mod compare;
pub mod config;
pub mod crawler;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod sources;
pub mod store;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, CrawlArgs, OutputFormat, SourceCommand};
use crate::compare::{CompareConfig, CompareSummary, Comparator};
use crate::config::Config;
use crate::crawler::{CrawlSummary, Crawler, CrawlerConfig};
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, Report, TableOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;
use crate::sources::prompt_sources;
use crate::store::InventoryStore;

/// Run the application for parsed arguments.
///
/// Initializes logging, loads the layered configuration, then dispatches the
/// subcommand.
///
/// # Errors
///
/// Returns any configuration, crawl, compare, store or output error with
/// context attached. [`ExitCode::from_error`] classifies it.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, !cli.no_color);
    if cli.no_color {
        yansi::disable();
    }

    let config_path = match cli.config {
        Some(ref path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;

    let mut app = App {
        config,
        config_path,
        db_override: cli.db,
        quiet: cli.quiet,
        color: !cli.no_color,
    };

    match cli.command {
        Commands::Init => app.init(),
        Commands::Source(command) => app.source(command),
        Commands::Crawl(args) => {
            let store = app.open_store()?;
            app.crawl(&store, &args, &install_signal_handler()?)?;
            Ok(ExitCode::Success)
        }
        Commands::Compare => {
            let store = app.open_store()?;
            app.compare(&store, &install_signal_handler()?)?;
            Ok(ExitCode::Success)
        }
        Commands::Report(args) => {
            let store = app.open_store()?;
            app.report(&store, args.output)
        }
        Commands::Run(args) => {
            let store = app.open_store()?;
            let shutdown = install_signal_handler()?;
            app.crawl(&store, &args.crawl, &shutdown)?;
            app.compare(&store, &shutdown)?;
            app.report(&store, args.report.output)
        }
        Commands::Reset => {
            let store = app.open_store()?;
            app.reset(&store)?;
            Ok(ExitCode::Success)
        }
    }
}

fn install_signal_handler() -> anyhow::Result<ShutdownHandler> {
    signal::install_handler().context("Failed to install Ctrl+C handler")
}

/// Write a report in the requested format.
///
/// # Errors
///
/// Returns [`output::OutputError`] if rendering or writing fails.
pub fn write_report<W: Write>(
    report: &Report,
    format: OutputFormat,
    color: bool,
    writer: W,
) -> Result<(), output::OutputError> {
    match format {
        OutputFormat::Table => TableOutput::new(report).with_color(color).write_to(writer),
        OutputFormat::Json => JsonOutput::new(report).write_to(writer),
        OutputFormat::Csv => CsvOutput::new(report).write_to(writer),
    }
}

struct App {
    config: Config,
    config_path: PathBuf,
    db_override: Option<PathBuf>,
    quiet: bool,
    color: bool,
}

impl App {
    fn open_store(&self) -> anyhow::Result<InventoryStore> {
        let path = match self.db_override {
            Some(ref path) => path.clone(),
            None => self.config.database_path()?,
        };
        log::debug!("Using inventory database {}", path.display());
        InventoryStore::open(&path)
            .with_context(|| format!("Failed to open inventory database {}", path.display()))
    }

    fn save_config(&self) -> anyhow::Result<()> {
        Config::save_sources_to(&self.config_path, &self.config.sources)
            .with_context(|| format!("Failed to save configuration {}", self.config_path.display()))
    }

    fn progress(&self) -> Arc<dyn ProgressCallback> {
        Arc::new(Progress::new(self.quiet))
    }

    fn init(&mut self) -> anyhow::Result<ExitCode> {
        let stdin = io::stdin();
        let added = prompt_sources(&mut self.config.sources, stdin.lock(), io::stdout())
            .context("Failed to read source paths")?;
        self.save_config()?;
        log::info!(
            "{} sources added, {} registered in {}",
            added,
            self.config.sources.len(),
            self.config_path.display()
        );
        Ok(ExitCode::Success)
    }

    fn source(&mut self, command: SourceCommand) -> anyhow::Result<ExitCode> {
        let mut stdout = io::stdout().lock();
        match command {
            SourceCommand::Add { paths } => {
                for path in paths {
                    let source = self.config.sources.register(&path)?;
                    writeln!(stdout, "{}  {}", source.index, source.root.display())?;
                }
                self.save_config()?;
            }
            SourceCommand::List => {
                if self.config.sources.is_empty() {
                    writeln!(stdout, "No sources registered.")?;
                }
                for source in self.config.sources.iter() {
                    writeln!(stdout, "{}  {}", source.index, source.root.display())?;
                }
            }
            SourceCommand::Remove { index } => {
                let removed = self.config.sources.remove(index)?;
                self.save_config()?;
                writeln!(stdout, "Removed {}", removed.display())?;
                if index < self.config.sources.len() {
                    log::warn!(
                        "Sources after index {} moved up; run `hashdiff reset` before the next crawl",
                        index
                    );
                }
            }
        }
        Ok(ExitCode::Success)
    }

    fn crawl(
        &self,
        store: &InventoryStore,
        args: &CrawlArgs,
        shutdown: &ShutdownHandler,
    ) -> anyhow::Result<CrawlSummary> {
        self.config.sources.validate()?;

        let walker = WalkerConfig::new(
            args.follow_symlinks || self.config.follow_symlinks,
            args.skip_hidden || self.config.skip_hidden,
        );
        let config = CrawlerConfig::default()
            .with_walker_config(walker)
            .with_algorithm(args.algorithm.unwrap_or(self.config.algorithm))
            .with_read_error_policy(
                args.read_error_policy()
                    .unwrap_or(self.config.on_read_error),
            )
            .with_fresh(args.fresh)
            .with_shutdown_flag(shutdown.get_flag())
            .with_progress_callback(self.progress());

        let summary = Crawler::new(store, config)
            .crawl(&self.config.sources.to_vec())
            .context("Crawl failed")?;

        if summary.skipped_files() > 0 {
            log::warn!(
                "{} unreadable files were left out of the inventory",
                summary.skipped_files()
            );
        }
        Ok(summary)
    }

    fn compare(
        &self,
        store: &InventoryStore,
        shutdown: &ShutdownHandler,
    ) -> anyhow::Result<CompareSummary> {
        let (left, right) = self.config.sources.compared_pair()?;
        self.warn_uncompared();

        let config = CompareConfig::default()
            .with_shutdown_flag(shutdown.get_flag())
            .with_progress_callback(self.progress());

        let summary = Comparator::new(store, config)
            .compare(left.partition(), right.partition())
            .context("Compare failed")?;
        Ok(summary)
    }

    fn report(&self, store: &InventoryStore, format: OutputFormat) -> anyhow::Result<ExitCode> {
        let (left, right) = self.config.sources.compared_pair()?;
        let report =
            Report::collect(store, &[left, right]).context("Failed to read diff records")?;

        write_report(&report, format, self.color, io::stdout().lock())
            .context("Failed to write report")?;

        if report.is_empty() {
            Ok(ExitCode::NoDifferences)
        } else {
            Ok(ExitCode::Success)
        }
    }

    fn reset(&self, store: &InventoryStore) -> anyhow::Result<()> {
        let mut removed = 0;
        for partition in store.partitions()? {
            removed += store.clear_partition(partition)?;
        }
        log::info!("Removed {} records", removed);
        Ok(())
    }

    fn warn_uncompared(&self) {
        for source in self.config.sources.iter().skip(2) {
            log::warn!(
                "Source {} ({}) is crawled but not compared; only sources 0 and 1 are compared",
                source.index,
                source.root.display()
            );
        }
    }
}
