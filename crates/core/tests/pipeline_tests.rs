//! Batch pipeline tests against a local HTTP server
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::routing::get;
use pagesift_core::*;
use tempfile::TempDir;

const ARTICLE: &str = include_str!("../../../tests/fixtures/article.html");
const EMPTY: &str = include_str!("../../../tests/fixtures/empty_content.html");

/// Serves the test routes on 127.0.0.1 and returns the base URL.
fn serve() -> String {
    let router = Router::new()
        .route("/", get(|| async { Html(r#"<h1>Title</h1><p>Hello <b>world</b></p><a href="/x">link</a>"#) }))
        .route("/article", get(|| async { Html(ARTICLE) }))
        .route("/empty", get(|| async { Html(EMPTY) }))
        .route("/blank", get(|| async { Html("   \n") }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, Html("<h1>Not found</h1>")) }))
        .route("/a/b", get(|| async { Html("<p>first</p>") }))
        .route("/a_b", get(|| async { Html("<p>second</p>") }))
        .route("/docs/page", get(|| async { Html(r#"<a href="intro">Intro</a>"#) }))
        .route("/old", get(|| async { Redirect::permanent("/docs/page") }));

    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });

    format!("http://{}", rx.recv().unwrap())
}

fn config_for(dir: &Path) -> ScrapeConfig {
    ScrapeConfig::builder().timeout(5).output_dir(dir).build()
}

fn run(input: &str, config: ScrapeConfig) -> (BatchSummary, Vec<StatusEvent>) {
    let batch = spawn_batch(input, config).unwrap();
    let mut events = Vec::new();
    let summary = batch.drain(|event| events.push(event)).unwrap();
    (summary, events)
}

fn csv_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".csv"))
        .collect();
    names.sort();
    names
}

fn failure_lines(events: &[StatusEvent]) -> Vec<String> {
    events.iter().filter(|e| matches!(e, StatusEvent::Failed { .. })).map(ToString::to_string).collect()
}

#[test]
fn test_scrape_simple_page() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let url = format!("{}/", base);

    let (summary, events) = run(&url, config_for(tmp.path()));
    assert_eq!(summary, BatchSummary { succeeded: 1, failed: 0, empty: 0 });

    let path = tmp.path().join(output_file_name(&url));
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "type,data".to_string(),
            "heading_h1,Title".to_string(),
            "paragraph,Hello world".to_string(),
            format!("link,\"{{'text': 'link', 'url': '{}/x'}}\"", base),
        ]
    );

    assert!(events.contains(&StatusEvent::Written { path, rows: 3 }));
    assert!(matches!(events.first(), Some(StatusEvent::BatchStarted { total: 1 })));
    assert!(matches!(events.last(), Some(StatusEvent::BatchFinished(_))));
}

#[test]
fn test_missing_page_does_not_stop_batch() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let input = format!("{base}/missing\n{base}/article");

    let (summary, events) = run(&input, config_for(tmp.path()));
    assert_eq!(summary, BatchSummary { succeeded: 1, failed: 1, empty: 0 });

    let failures = failure_lines(&events);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with(&format!("FetchError for {}/missing while fetching", base)));
    assert!(failures[0].contains("404"));

    let fetch_error_lines = events.iter().filter(|e| e.to_string().contains("FetchError")).count();
    assert_eq!(fetch_error_lines, 1);

    assert_eq!(csv_files(tmp.path()), [output_file_name(&format!("{}/article", base))]);
}

#[test]
fn test_shared_file_name_keeps_later_page() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let first = format!("{}/a/b", base);
    let second = format!("{}/a_b", base);
    assert_eq!(output_file_name(&first), output_file_name(&second));

    let (summary, events) = run(&format!("{}, {}", first, second), config_for(tmp.path()));
    assert_eq!(summary.succeeded, 2);
    assert!(failure_lines(&events).is_empty());

    let files = csv_files(tmp.path());
    assert_eq!(files.len(), 1);
    let text = std::fs::read_to_string(tmp.path().join(&files[0])).unwrap();
    assert!(text.contains("paragraph,second"));
    assert!(!text.contains("first"));
}

#[test]
fn test_unique_names_keep_both_pages() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let config = ScrapeConfigBuilder::from_config(config_for(tmp.path())).disambiguate_names(true).build();

    let (summary, _) = run(&format!("{base}/a/b\n{base}/a_b"), config);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(csv_files(tmp.path()).len(), 2);
}

#[test]
fn test_redirect_keeps_source_file_name() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let url = format!("{}/old", base);

    let (summary, events) = run(&url, config_for(tmp.path()));
    assert_eq!(summary.succeeded, 1);
    assert!(events.contains(&StatusEvent::Fetched {
        status: 200,
        final_url: format!("{}/docs/page", base),
        bytes: r#"<a href="intro">Intro</a>"#.len(),
    }));

    assert_eq!(csv_files(tmp.path()), [output_file_name(&url)]);
    let text = std::fs::read_to_string(tmp.path().join(output_file_name(&url))).unwrap();
    assert!(text.contains(&format!("'url': '{}/docs/intro'", base)));
}

#[test]
fn test_page_without_content_writes_nothing() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let url = format!("{}/empty", base);

    let (summary, events) = run(&url, config_for(tmp.path()));
    assert_eq!(summary, BatchSummary { succeeded: 0, failed: 0, empty: 1 });
    assert!(events.contains(&StatusEvent::NoContent { url }));
    assert!(csv_files(tmp.path()).is_empty());
}

#[test]
fn test_blank_body_is_parse_error() {
    let base = serve();
    let tmp = TempDir::new().unwrap();

    let (summary, events) = run(&format!("{}/blank", base), config_for(tmp.path()));
    assert_eq!(summary.failed, 1);

    let failures = failure_lines(&events);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("ParseError"));
    assert!(failures[0].contains("while parsing"));
}

#[test]
fn test_write_failure_is_reported() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let config = config_for(&tmp.path().join("does-not-exist"));

    let (summary, events) = run(&format!("{}/", base), config);
    assert_eq!(summary.failed, 1);

    let failures = failure_lines(&events);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("WriteError"));
}

#[test]
fn test_stages_in_order() {
    let base = serve();
    let tmp = TempDir::new().unwrap();

    let (_, events) = run(&format!("{}/article", base), config_for(tmp.path()));
    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::Stage { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();

    assert_eq!(stages, [Stage::Fetching, Stage::Parsing, Stage::Extracting, Stage::Writing, Stage::Done]);
}

#[test]
fn test_empty_input_starts_nothing() {
    let tmp = TempDir::new().unwrap();
    let result = spawn_batch("  \n\n , ", config_for(tmp.path()));

    match result {
        Err(err @ PagesiftError::EmptyInput) => assert_eq!(err.kind(), "EmptyInputError"),
        _ => panic!("expected empty input error"),
    }
    assert!(csv_files(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_scraper_scrape_url() {
    let base = serve();
    let tmp = TempDir::new().unwrap();
    let scraper = Scraper::new(config_for(tmp.path())).unwrap();
    let (status, events) = StatusSender::channel();

    let outcome = scraper.scrape_url(&format!("{}/article", base), &status).await.unwrap();
    match outcome {
        UrlOutcome::Written { path, rows } => {
            assert_eq!(rows, 19);
            assert!(path.exists());
        }
        UrlOutcome::Empty => panic!("expected records"),
    }

    drop(status);
    let events: Vec<StatusEvent> = events.iter().collect();
    assert!(events.iter().any(|e| matches!(e, StatusEvent::Extracted { records: 19, text_chunks: 2, .. })));
}
