use std::time::Duration;

use owo_colors::OwoColorize;
use pagesift_core::{BatchSummary, PagesiftError, StatusEvent, StatusLevel};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "pagesift".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Scrape headings, text, links, images and tables into CSV\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print an indented detail line under the current step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print a batch-level error as `<Kind>: <message>`
pub fn print_batch_error(err: &PagesiftError) {
    print_error(&format!("{}: {}", err.kind(), err));
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 250.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print the end-of-batch summary
pub fn print_summary(summary: &BatchSummary) {
    eprintln!("{}", "═".repeat(60).dimmed());
    if summary.failed == 0 {
        print_success(&summary.to_string());
    } else {
        print_warning(&summary.to_string());
    }
    eprintln!("{}", "═".repeat(60).dimmed());
}

/// Render one status event on stderr
///
/// Detail events (fetch size, title, timing) are only shown with `verbose`.
pub fn print_event(event: &StatusEvent, verbose: bool) {
    match event {
        StatusEvent::UrlStarted { index, total, url } => {
            eprintln!();
            print_step(*index, *total, &format!("Processing {}", url.bright_white().underline()));
        }
        StatusEvent::Fetched { status, final_url, bytes } => {
            if verbose {
                print_detail("URL", final_url);
                print_detail("Status", &status.to_string());
                print_detail("Size", &format_size(*bytes));
            }
        }
        StatusEvent::Parsed { title } => {
            if verbose && let Some(title) = title {
                print_detail("Title", title);
            }
        }
        StatusEvent::Extracted { elapsed, .. } => {
            print_info(&event.to_string());
            if verbose {
                print_timing("Extraction", *elapsed);
            }
        }
        StatusEvent::Stage { .. } if !verbose => {}
        StatusEvent::BatchFinished(summary) => {
            eprintln!();
            print_summary(summary);
        }
        _ => match event.level() {
            StatusLevel::Step => eprintln!("  {}", event.to_string().cyan()),
            StatusLevel::Info => print_info(&event.to_string()),
            StatusLevel::Success => print_success(&event.to_string()),
            StatusLevel::Warning => print_warning(&event.to_string()),
            StatusLevel::Error => print_error(&event.to_string()),
        },
    }
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
