use std::fs;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use pagesift_core::{PagesiftError, ScrapeConfig, ScrapeConfigBuilder, spawn_batch};
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scrape common content elements from web pages into one CSV per URL
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(author = "pagesift contributors")]
#[command(version)]
#[command(about = "Scrape headings, text, links, images and tables from web pages into CSV", long_about = None)]
struct Args {
    /// URLs to scrape (comma or newline separated), or "-" to read them from stdin
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Read URLs from a file, or "-" for stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<String>,

    /// Prompt for URLs; a blank line starts scraping, EOF quits
    #[arg(long, conflicts_with_all = ["urls", "input"])]
    interactive: bool,

    /// Directory for the CSV files (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Only keep loose text longer than this many characters
    #[arg(long, value_name = "NUM")]
    min_chunk_len: Option<usize>,

    /// Skip elements nested inside an already recorded element
    #[arg(long)]
    no_nested: bool,

    /// Start CSV files with a UTF-8 byte order mark
    #[arg(long)]
    bom: bool,

    /// Add a short URL hash to file names so different URLs never overwrite each other
    #[arg(long)]
    unique_names: bool,

    /// Config file (default: <config dir>/pagesift/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pagesift=debug,pagesift_core=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file and apply command line overrides
fn load_config(args: &Args) -> anyhow::Result<ScrapeConfig> {
    let base = match &args.config {
        Some(path) => ScrapeConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ScrapeConfig::load_default().context("Failed to load default config")?,
    };

    let mut builder = ScrapeConfigBuilder::from_config(base);
    if let Some(dir) = &args.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if let Some(len) = args.min_chunk_len {
        builder = builder.min_text_chunk_len(len);
    }
    if args.no_nested {
        builder = builder.include_nested(false);
    }
    if args.bom {
        builder = builder.byte_order_mark(true);
    }
    if args.unique_names {
        builder = builder.disambiguate_names(true);
    }

    Ok(builder.build())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
    Ok(buffer)
}

/// Gather the raw URL text from arguments, the input file and stdin
fn collect_input(args: &Args) -> anyhow::Result<String> {
    let mut text = String::new();

    for url in &args.urls {
        if url == "-" {
            text.push_str(&read_stdin()?);
        } else {
            text.push_str(url);
        }
        text.push('\n');
    }

    match args.input.as_deref() {
        Some("-") => text.push_str(&read_stdin()?),
        Some(path) => {
            let content = fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path))?;
            text.push_str(&content);
        }
        None => {}
    }

    Ok(text)
}

/// Run one batch to completion, rendering its status stream
fn run_batch(input: &str, config: ScrapeConfig, verbose: bool) -> anyhow::Result<()> {
    let batch = match spawn_batch(input, config) {
        Ok(batch) => batch,
        Err(err @ PagesiftError::EmptyInput) => {
            echo::print_batch_error(&err);
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to start scraping"),
    };

    batch.drain(|event| echo::print_event(&event, verbose))?;
    Ok(())
}

fn run_interactive(config: &ScrapeConfig, verbose: bool) -> anyhow::Result<()> {
    echo::print_info("Enter URLs, one per line or comma separated. A blank line starts scraping, Ctrl-D quits.");

    let mut pending = String::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            run_batch(&pending, config.clone(), verbose)?;
            pending.clear();
            eprintln!();
            echo::print_info("Ready for more URLs");
        } else {
            pending.push_str(&line);
            pending.push('\n');
        }
    }

    if !pending.trim().is_empty() {
        run_batch(&pending, config.clone(), verbose)?;
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "pagesift", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
    }

    let config = load_config(&args)?;

    if args.verbose {
        echo::print_detail("Output", &config.output.output_dir.display().to_string());
        echo::print_detail("Timeout", &format!("{}s", config.fetch.timeout));
    }

    if args.interactive {
        return run_interactive(&config, args.verbose);
    }

    let input = collect_input(&args)?;
    run_batch(&input, config, args.verbose)
}
