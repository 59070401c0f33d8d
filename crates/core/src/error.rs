//! Error types for pagesift operations.
//!
//! This module defines the main error type [`PagesiftError`] which covers
//! every failure of a scrape batch: empty input, fetching, parsing and
//! writing. Only [`PagesiftError::EmptyInput`] is fatal for a batch; the
//! others are reported per URL and the batch moves on.
//!
//! # Example
//!
//! ```rust
//! use pagesift_core::{PagesiftError, SourceList};
//!
//! match SourceList::parse("  ,\n ") {
//!     Err(PagesiftError::EmptyInput) => println!("nothing to scrape"),
//!     Err(e) => println!("Error: {}", e),
//!     Ok(sources) => println!("{} URL(s)", sources.len()),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scrape operations.
#[derive(Error, Debug)]
pub enum PagesiftError {
    /// No usable URL was found in the input.
    #[error("No valid URLs found in the input")]
    EmptyInput,

    /// The page could not be fetched.
    ///
    /// Wraps network failures (DNS, refused connections, timeouts) and
    /// non-success HTTP statuses.
    #[error("Failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: FetchFailure },

    /// The fetched body could not be turned into a document tree.
    #[error("Failed to parse HTML for {url}: {reason}")]
    Parse { url: String, reason: String },

    /// The output file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },

    /// Configuration file errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background worker could not be started or did not finish.
    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl PagesiftError {
    /// Label used for this error in status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PagesiftError::EmptyInput => "EmptyInputError",
            PagesiftError::Fetch { .. } => "FetchError",
            PagesiftError::Parse { .. } => "ParseError",
            PagesiftError::Write { .. } => "WriteError",
            PagesiftError::Config(_) => "ConfigError",
            PagesiftError::Worker(_) => "WorkerError",
        }
    }

    pub(crate) fn fetch(url: impl Into<String>, cause: FetchFailure) -> Self {
        PagesiftError::Fetch { url: url.into(), cause }
    }

    pub(crate) fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        PagesiftError::Parse { url: url.into(), reason: reason.into() }
    }
}

/// Underlying cause of a [`PagesiftError::Fetch`].
#[derive(Error, Debug)]
pub enum FetchFailure {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL ({0})")]
    InvalidUrl(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Any other transport error from reqwest.
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for PagesiftError.
pub type Result<T> = std::result::Result<T, PagesiftError>;
