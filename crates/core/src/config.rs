//! Batch configuration.
//!
//! [`ScrapeConfig`] groups the fetch, extract and output settings of a batch.
//! It can be built in code with [`ScrapeConfig::builder`] or loaded from a
//! TOML file, by default `<config dir>/pagesift/config.toml`:
//!
//! ```toml
//! [fetch]
//! timeout = 30
//!
//! [extract]
//! min_text_chunk_len = 20
//!
//! [output]
//! output_dir = "scraped"
//! byte_order_mark = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::extract::ExtractConfig;
use crate::fetch::FetchConfig;
use crate::output::OutputConfig;
use crate::{PagesiftError, Result};

/// Configuration for one scrape batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

impl ScrapeConfig {
    /// Creates a new builder for ScrapeConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagesift_core::ScrapeConfig;
    ///
    /// let config = ScrapeConfig::builder().timeout(30).min_text_chunk_len(20).build();
    /// assert_eq!(config.fetch.timeout, 30);
    /// ```
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::new()
    }

    /// Parses configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PagesiftError::Config(e.to_string()))
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PagesiftError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            PagesiftError::Config(msg) => PagesiftError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Loads the default config file if it exists, defaults otherwise.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/pagesift/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pagesift").join("config.toml"))
    }
}

/// Builder for ScrapeConfig.
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ScrapeConfig::default() }
    }

    /// Starts from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: ScrapeConfig) -> Self {
        Self { config }
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.fetch.timeout = secs;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets the text chunk length threshold.
    pub fn min_text_chunk_len(mut self, value: usize) -> Self {
        self.config.extract.min_text_chunk_len = value;
        self
    }

    /// Sets whether nested primary elements are recorded.
    pub fn include_nested(mut self, value: bool) -> Self {
        self.config.extract.include_nested = value;
        self
    }

    /// Sets the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.output_dir = dir.into();
        self
    }

    /// Sets whether files start with a UTF-8 byte order mark.
    pub fn byte_order_mark(mut self, value: bool) -> Self {
        self.config.output.byte_order_mark = value;
        self
    }

    /// Sets whether file names get a URL hash suffix.
    pub fn disambiguate_names(mut self, value: bool) -> Self {
        self.config.output.disambiguate_names = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ScrapeConfig {
        self.config
    }
}

impl Default for ScrapeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
