//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display a bar per pipeline phase: one `crawl`
//! bar per source and one `compare` bar.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Name of the crawl phase.
pub const PHASE_CRAWL: &str = "crawl";
/// Name of the compare phase.
pub const PHASE_COMPARE: &str = "compare";

/// Progress callback for the crawl and compare phases.
///
/// Implement this trait to receive progress updates while the inventory
/// is built and compared.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_CRAWL`] or [`PHASE_COMPARE`])
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of items processed so far (1-based)
    /// * `item` - Path or hash being processed
    fn on_progress(&self, current: usize, item: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    prefix: Mutex<String>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashdiff::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            prefix: Mutex::new(String::new()),
            quiet,
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prefix(&self) -> MutexGuard<'_, String> {
        self.prefix.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn style(phase: &str) -> ProgressStyle {
        let template = match phase {
            PHASE_CRAWL => {
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} (ETA: {eta})"
            }
            _ => "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} hashes ({percent}%) {msg}",
        };
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        pb.set_style(Self::style(phase));
        let prefix = self.prefix().clone();
        pb.set_message(if prefix.is_empty() {
            phase.to_string()
        } else {
            prefix
        });

        if let Some(previous) = self.bar().replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, current: usize, item: &str) {
        if self.quiet {
            return;
        }

        let prefix = self.prefix().clone();
        let display_msg = if prefix.is_empty() {
            truncate_path(item, 30)
        } else {
            format!("{}: {}", prefix, truncate_path(item, 30))
        };

        if let Some(ref pb) = *self.bar() {
            pb.set_position(current as u64);
            pb.set_message(display_msg);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bar().take() {
            let message = match phase {
                PHASE_CRAWL => "Crawl complete",
                PHASE_COMPARE => "Compare complete",
                _ => "Done",
            };
            pb.finish_with_message(message);
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }

        *self.prefix() = message.to_string();

        if let Some(ref pb) = *self.bar() {
            pb.set_message(message.to_string());
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
