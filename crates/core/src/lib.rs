pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod sources;

pub use config::{ScrapeConfig, ScrapeConfigBuilder};
pub use error::{FetchFailure, PagesiftError, Result};
#[doc(hidden)]
pub use extract::{NON_CONTENT_TAGS, PRIMARY_TAGS};
pub use extract::{ExtractConfig, Extraction, Record, RecordData, RecordKind, clean_text, extract_records};
pub use fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, FetchConfig, FetchedPage, Fetcher};
pub use output::{HEADER, OutputConfig, write_records, write_records_to};
pub use parse::{Document, Element};
pub use pipeline::{
    BatchHandle, BatchSummary, Scraper, Stage, StatusEvent, StatusLevel, StatusSender, UrlOutcome, spawn_batch,
    spawn_sources,
};
pub use sources::{SourceList, disambiguated_file_name, ensure_scheme, has_http_scheme, output_file_name};
