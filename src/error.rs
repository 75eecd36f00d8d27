//! Structured error handling and exit codes.

use serde::Serialize;

use crate::compare::CompareError;
use crate::config::ConfigError;
use crate::crawler::CrawlError;

/// Exit codes for the hashdiff application.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: No differences (report completed, every file has a counterpart)
/// - 3: Configuration error (bad source, malformed config)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No differences: the report found no file unique to either source.
    NoDifferences = 2,
    /// Configuration error: sources or settings are invalid.
    ConfigError = 3,
    /// Interrupted: the run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HD000",
            Self::GeneralError => "HD001",
            Self::NoDifferences => "HD002",
            Self::ConfigError => "HD003",
            Self::Interrupted => "HD130",
        }
    }

    /// Classify an application error.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<CrawlError>() {
                if matches!(e, CrawlError::Interrupted) {
                    return Self::Interrupted;
                }
            }
            if let Some(e) = cause.downcast_ref::<CompareError>() {
                if matches!(e, CompareError::Interrupted) {
                    return Self::Interrupted;
                }
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::ConfigError;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
