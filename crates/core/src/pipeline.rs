//! Batch orchestration.
//!
//! A batch runs every URL of a [`SourceList`] through fetch → parse →
//! extract → write, one URL at a time, on a single background worker.
//! Progress is reported as [`StatusEvent`]s over a channel; the caller drains
//! the channel on its own thread and decides how to render them.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesift_core::{ScrapeConfig, spawn_batch};
//!
//! let batch = spawn_batch("https://example.com, https://example.org", ScrapeConfig::default()).unwrap();
//! let summary = batch.drain(|event| println!("{}", event)).unwrap();
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::ScrapeConfig;
use crate::extract::extract_records;
use crate::fetch::Fetcher;
use crate::output::write_records;
use crate::parse::Document;
use crate::sources::{SourceList, ensure_scheme};
use crate::{PagesiftError, Result};

const WORKER_THREAD_NAME: &str = "pagesift-worker";

/// Where a URL is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Fetching,
    Parsing,
    Extracting,
    Writing,
    Done,
    Failed,
}

impl Stage {
    /// The stage a URL was in when `err` stopped it.
    pub fn failed_at(err: &PagesiftError) -> Self {
        match err {
            PagesiftError::Fetch { .. } => Stage::Fetching,
            PagesiftError::Parse { .. } => Stage::Parsing,
            PagesiftError::Write { .. } => Stage::Writing,
            _ => Stage::Pending,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Fetching => "fetching",
            Stage::Parsing => "parsing",
            Stage::Extracting => "extracting",
            Stage::Writing => "writing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// URLs whose records were written.
    pub succeeded: usize,
    /// URLs that failed to fetch, parse or write.
    pub failed: usize,
    /// URLs that were fetched but yielded no records; nothing is written.
    pub empty: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.empty
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scraping finished: {} succeeded, {} failed, {} without content",
            self.succeeded, self.failed, self.empty
        )
    }
}

/// Severity of a status line, for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Step,
    Success,
    Warning,
    Error,
}

/// One line of the status stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    BatchStarted { total: usize },
    UrlStarted { index: usize, total: usize, url: String },
    /// The source had no scheme; `url` is the `https://` form being fetched.
    SchemeAdded { url: String },
    Stage { url: String, stage: Stage },
    Fetched { status: u16, final_url: String, bytes: usize },
    Parsed { title: Option<String> },
    /// The document has no `<body>`; the whole tree is scanned instead.
    NoBody,
    Extracted { records: usize, text_chunks: usize, elapsed: Duration },
    NoContent { url: String },
    Written { path: PathBuf, rows: usize },
    Failed { url: String, stage: Stage, kind: &'static str, error: String },
    /// The worker could not start; no URL was processed.
    Aborted { error: String },
    BatchFinished(BatchSummary),
}

impl StatusEvent {
    pub fn level(&self) -> StatusLevel {
        match self {
            StatusEvent::UrlStarted { .. } | StatusEvent::Stage { .. } => StatusLevel::Step,
            StatusEvent::Written { .. } => StatusLevel::Success,
            StatusEvent::BatchFinished(summary) if summary.failed == 0 => StatusLevel::Success,
            StatusEvent::BatchFinished(_) => StatusLevel::Warning,
            StatusEvent::SchemeAdded { .. } | StatusEvent::NoBody | StatusEvent::NoContent { .. } => {
                StatusLevel::Warning
            }
            StatusEvent::Failed { .. } | StatusEvent::Aborted { .. } => StatusLevel::Error,
            _ => StatusLevel::Info,
        }
    }

    fn failed(url: &str, err: &PagesiftError) -> Self {
        StatusEvent::Failed {
            url: url.to_string(),
            stage: Stage::failed_at(err),
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::BatchStarted { total } => write!(f, "Starting scrape for {} URL(s)", total),
            StatusEvent::UrlStarted { index, total, url } => write!(f, "[{}/{}] Processing {}", index, total, url),
            StatusEvent::SchemeAdded { url } => write!(f, "URL has no http/https scheme, trying {}", url),
            StatusEvent::Stage { url, stage } => match stage {
                Stage::Pending => write!(f, "Queued {}", url),
                Stage::Fetching => write!(f, "Fetching {}", url),
                Stage::Parsing => f.write_str("Parsing HTML"),
                Stage::Extracting => f.write_str("Extracting content"),
                Stage::Writing => f.write_str("Writing CSV"),
                Stage::Done => write!(f, "Done with {}", url),
                Stage::Failed => write!(f, "Giving up on {}", url),
            },
            StatusEvent::Fetched { status, final_url, bytes } => {
                write!(f, "Fetched {} bytes (status {}) from {}", bytes, status, final_url)
            }
            StatusEvent::Parsed { title: Some(title) } => write!(f, "Parsed document \"{}\"", title),
            StatusEvent::Parsed { title: None } => f.write_str("Parsed untitled document"),
            StatusEvent::NoBody => f.write_str("No <body> tag found, scanning the whole document"),
            StatusEvent::Extracted { records, text_chunks, elapsed } => write!(
                f,
                "Found {} content items ({} loose text chunks) in {:.2}s",
                records,
                text_chunks,
                elapsed.as_secs_f64()
            ),
            StatusEvent::NoContent { url } => write!(f, "No scrapable content found for {}, nothing written", url),
            StatusEvent::Written { path, rows } => write!(f, "Saved {} rows to {}", rows, path.display()),
            StatusEvent::Failed { url, stage, kind, error } => {
                write!(f, "{} for {} while {}: {}", kind, url, stage, error)
            }
            StatusEvent::Aborted { error } => write!(f, "Could not start scraping: {}", error),
            StatusEvent::BatchFinished(summary) => write!(f, "{}", summary),
        }
    }
}

/// Sending half of the status stream.
///
/// Sends never fail from the worker's point of view: if the receiver is gone
/// the batch keeps running and the events are dropped.
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: Sender<StatusEvent>,
}

impl StatusSender {
    /// Creates a connected sender/receiver pair.
    pub fn channel() -> (Self, Receiver<StatusEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: StatusEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("status receiver dropped");
        }
    }
}

/// What happened to one URL that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    Written { path: PathBuf, rows: usize },
    /// Nothing was extracted, so no file was written.
    Empty,
}

/// Runs URLs through the pipeline.
pub struct Scraper {
    config: ScrapeConfig,
    fetcher: Fetcher,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetch)?;
        Ok(Self { config, fetcher })
    }

    /// Processes every source in order and reports a summary.
    ///
    /// A failing URL is reported with one [`StatusEvent::Failed`] and the
    /// batch continues with the next one.
    pub async fn run(&self, sources: &SourceList, status: &StatusSender) -> BatchSummary {
        let total = sources.len();
        let mut summary = BatchSummary::default();

        status.emit(StatusEvent::BatchStarted { total });

        for (index, source) in sources.iter().enumerate() {
            status.emit(StatusEvent::UrlStarted { index: index + 1, total, url: source.clone() });

            match self.scrape_url(source, status).await {
                Ok(UrlOutcome::Written { .. }) => summary.succeeded += 1,
                Ok(UrlOutcome::Empty) => summary.empty += 1,
                Err(err) => {
                    tracing::warn!(url = %source, error = %err, "url failed");
                    status.emit(StatusEvent::failed(source, &err));
                    status.emit(StatusEvent::Stage { url: source.clone(), stage: Stage::Failed });
                    summary.failed += 1;
                }
            }
        }

        status.emit(StatusEvent::BatchFinished(summary));
        summary
    }

    /// Fetches, extracts and writes a single URL.
    pub async fn scrape_url(&self, source: &str, status: &StatusSender) -> Result<UrlOutcome> {
        let url = ensure_scheme(source);
        if let Cow::Owned(url) = &url {
            status.emit(StatusEvent::SchemeAdded { url: url.clone() });
        }
        let stage = |stage| StatusEvent::Stage { url: url.to_string(), stage };

        status.emit(stage(Stage::Fetching));
        let page = self.fetcher.fetch(&url).await?;
        status.emit(StatusEvent::Fetched {
            status: page.status,
            final_url: page.final_url.to_string(),
            bytes: page.body.len(),
        });

        status.emit(stage(Stage::Parsing));
        let doc = Document::parse_with_url(&page.body, page.final_url)?;
        status.emit(StatusEvent::Parsed { title: doc.title() });

        status.emit(stage(Stage::Extracting));
        let started = Instant::now();
        let extraction = extract_records(&doc, &self.config.extract)?;
        if !extraction.has_body {
            status.emit(StatusEvent::NoBody);
        }
        status.emit(StatusEvent::Extracted {
            records: extraction.records.len(),
            text_chunks: extraction.text_chunks,
            elapsed: started.elapsed(),
        });

        if extraction.is_empty() {
            status.emit(StatusEvent::NoContent { url: url.to_string() });
            status.emit(stage(Stage::Done));
            return Ok(UrlOutcome::Empty);
        }

        status.emit(stage(Stage::Writing));
        let path = self.config.output.path_for(&url);
        let rows = write_records(&path, &extraction.records, self.config.output.byte_order_mark)?;
        status.emit(StatusEvent::Written { path: path.clone(), rows });
        status.emit(stage(Stage::Done));

        Ok(UrlOutcome::Written { path, rows })
    }
}

/// A batch running on the background worker.
pub struct BatchHandle {
    events: Receiver<StatusEvent>,
    worker: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// The receiving half of the status stream.
    ///
    /// The stream ends when the worker finishes.
    pub fn events(&self) -> &Receiver<StatusEvent> {
        &self.events
    }

    /// Non-blocking poll for the next event, for callers with their own loop.
    pub fn try_next(&self) -> Option<StatusEvent> {
        self.events.try_recv().ok()
    }

    /// Whether the worker has finished.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Hands every event to `on_event` until the batch ends, then returns the summary.
    pub fn drain(self, mut on_event: impl FnMut(StatusEvent)) -> Result<BatchSummary> {
        for event in self.events.iter() {
            on_event(event);
        }
        self.join_worker()
    }

    /// Waits for the worker, discarding events still queued.
    pub fn join(self) -> Result<BatchSummary> {
        self.join_worker()
    }

    fn join_worker(self) -> Result<BatchSummary> {
        self.worker.join().map_err(|_| PagesiftError::Worker("worker thread panicked".to_string()))
    }
}

/// Parses `input` and starts the batch on a background thread.
///
/// # Errors
///
/// Returns [`PagesiftError::EmptyInput`] without starting anything when the
/// input holds no URL.
pub fn spawn_batch(input: &str, config: ScrapeConfig) -> Result<BatchHandle> {
    let sources = SourceList::parse(input)?;
    spawn_sources(sources, config)
}

/// Starts a batch for an already parsed source list.
pub fn spawn_sources(sources: SourceList, config: ScrapeConfig) -> Result<BatchHandle> {
    let (status, events) = StatusSender::channel();

    let worker = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_worker(&sources, config, &status))
        .map_err(|e| PagesiftError::Worker(e.to_string()))?;

    Ok(BatchHandle { events, worker })
}

fn run_worker(sources: &SourceList, config: ScrapeConfig, status: &StatusSender) -> BatchSummary {
    let aborted = |error: String| {
        status.emit(StatusEvent::Aborted { error });
        let summary = BatchSummary { failed: sources.len(), ..Default::default() };
        status.emit(StatusEvent::BatchFinished(summary));
        summary
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return aborted(format!("failed to start async runtime: {}", e)),
    };

    let scraper = match Scraper::new(config) {
        Ok(scraper) => scraper,
        Err(e) => return aborted(e.to_string()),
    };

    runtime.block_on(scraper.run(sources, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;

    #[test]
    fn test_spawn_batch_empty_input() {
        let result = spawn_batch(" \n , ", ScrapeConfig::default());
        assert!(matches!(result, Err(PagesiftError::EmptyInput)));
    }

    #[test]
    fn test_failed_at() {
        let fetch = PagesiftError::fetch("https://a.test", FetchFailure::Status { status: 404 });
        let parse = PagesiftError::parse("https://a.test", "document is empty");
        let write = PagesiftError::Write { path: PathBuf::from("x.csv"), source: std::io::Error::other("disk full") };

        assert_eq!(Stage::failed_at(&fetch), Stage::Fetching);
        assert_eq!(Stage::failed_at(&parse), Stage::Parsing);
        assert_eq!(Stage::failed_at(&write), Stage::Writing);
    }

    #[test]
    fn test_failed_event_line() {
        let err = PagesiftError::fetch("https://a.test/missing", FetchFailure::Status { status: 404 });
        let event = StatusEvent::failed("https://a.test/missing", &err);
        let line = event.to_string();

        assert!(line.starts_with("FetchError for https://a.test/missing while fetching"));
        assert!(line.contains("404"));
        assert_eq!(event.level(), StatusLevel::Error);
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary { succeeded: 2, failed: 1, empty: 0 };
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "Scraping finished: 2 succeeded, 1 failed, 0 without content");
        assert_eq!(StatusEvent::BatchFinished(summary).level(), StatusLevel::Warning);
        assert_eq!(StatusEvent::BatchFinished(BatchSummary::default()).level(), StatusLevel::Success);
    }

    #[test]
    fn test_event_lines() {
        assert_eq!(
            StatusEvent::UrlStarted { index: 2, total: 5, url: "https://a.test".into() }.to_string(),
            "[2/5] Processing https://a.test"
        );
        assert_eq!(
            StatusEvent::Written { path: PathBuf::from("a.test.csv"), rows: 12 }.to_string(),
            "Saved 12 rows to a.test.csv"
        );
        assert_eq!(
            StatusEvent::Stage { url: "https://a.test".into(), stage: Stage::Fetching }.to_string(),
            "Fetching https://a.test"
        );
        assert_eq!(StatusEvent::NoBody.level(), StatusLevel::Warning);
    }

    #[test]
    fn test_batch_handle_polling() {
        let config = ScrapeConfig::builder().timeout(2).build();
        let batch = spawn_batch("http://127.0.0.1:1/a, http://127.0.0.1:1/b", config).unwrap();

        let mut events = Vec::new();
        while !batch.is_finished() {
            match batch.try_next() {
                Some(event) => events.push(event),
                None => std::thread::sleep(Duration::from_millis(5)),
            }
        }
        events.extend(batch.events().try_iter());

        let summary = batch.join().unwrap();
        assert_eq!(summary, BatchSummary { succeeded: 0, failed: 2, empty: 0 });
        assert!(matches!(events.first(), Some(StatusEvent::BatchStarted { total: 2 })));
        assert_eq!(events.last(), Some(&StatusEvent::BatchFinished(summary)));
    }

    #[test]
    fn test_status_sender_survives_dropped_receiver() {
        let (status, events) = StatusSender::channel();
        drop(events);
        status.emit(StatusEvent::BatchStarted { total: 1 });
    }

    #[test]
    fn test_batch_reports_unreachable_url() {
        let config = ScrapeConfig::builder().timeout(2).build();
        let batch = spawn_batch("http://127.0.0.1:1/", config).unwrap();

        let mut lines = Vec::new();
        let summary = batch.drain(|event| lines.push(event)).unwrap();

        assert_eq!(summary, BatchSummary { succeeded: 0, failed: 1, empty: 0 });
        let failures: Vec<_> = lines.iter().filter(|e| matches!(e, StatusEvent::Failed { .. })).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(lines.last(), Some(StatusEvent::BatchFinished(_))));
    }
}
