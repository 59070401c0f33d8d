//! Source list parsing and output file naming.
//!
//! Users paste URLs one per line or separated by commas. [`SourceList::parse`]
//! turns that text into the ordered list a batch runs over, and
//! [`output_file_name`] derives the CSV name each URL is written to.
//!
//! # Example
//!
//! ```rust
//! use pagesift_core::sources::{SourceList, output_file_name};
//!
//! let sources = SourceList::parse("https://example.com/a, https://example.com/b\nexample.org").unwrap();
//! assert_eq!(sources.len(), 3);
//! assert_eq!(output_file_name("https://www.example.com/a?page=2"), "example.com_a_page_2.csv");
//! ```

use std::borrow::Cow;

use sha2::{Digest, Sha256};

use crate::{PagesiftError, Result};

/// Maximum length of a derived file stem, in characters.
pub const MAX_FILE_STEM_LEN: usize = 100;

/// Stem used when nothing usable is left of a URL.
const FALLBACK_STEM: &str = "scraped_data";

const OUTPUT_EXTENSION: &str = "csv";

/// Ordered list of URLs to scrape, in the order the user supplied them.
///
/// Entries are trimmed and empty entries are dropped. Repeated or
/// equivalent URLs (`https://a.test` vs `https://a.test/`) are kept as
/// separate entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList {
    urls: Vec<String>,
}

impl SourceList {
    /// Parses newline- or comma-separated URLs.
    ///
    /// # Errors
    ///
    /// Returns [`PagesiftError::EmptyInput`] when no non-empty entry remains.
    pub fn parse(text: &str) -> Result<Self> {
        let urls: Vec<String> = text
            .lines()
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();

        if urls.is_empty() { Err(PagesiftError::EmptyInput) } else { Ok(Self { urls }) }
    }

    /// Number of URLs in the list.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}

/// Returns `true` if the URL already starts with `http://` or `https://`.
pub fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Prefixes `https://` to URLs typed without a scheme.
pub fn ensure_scheme(url: &str) -> Cow<'_, str> {
    if has_http_scheme(url) { Cow::Borrowed(url) } else { Cow::Owned(format!("https://{}", url)) }
}

/// Derives the CSV file name for a URL.
///
/// The scheme and a leading `www.` are dropped, every run of characters other
/// than ASCII alphanumerics, `-` and `.` becomes a single `_`, and the stem is
/// capped at [`MAX_FILE_STEM_LEN`] characters. The mapping is not injective:
/// `https://a.test/x?y` and `https://a.test/x/y` share a name.
pub fn output_file_name(url: &str) -> String {
    format!("{}.{}", file_stem(url), OUTPUT_EXTENSION)
}

/// Like [`output_file_name`], with a short SHA-256 of the full URL appended
/// so distinct URLs never share a file.
pub fn disambiguated_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let suffix: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}_{}.{}", file_stem(url), suffix, OUTPUT_EXTENSION)
}

fn file_stem(url: &str) -> String {
    let rest = strip_scheme(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let mut stem = String::with_capacity(rest.len());
    let mut last_us = false;
    for ch in rest.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
            stem.push(ch);
            last_us = false;
        } else if !last_us {
            stem.push('_');
            last_us = true;
        }
    }

    let capped: String = trim_separators(&stem).chars().take(MAX_FILE_STEM_LEN).collect();
    let capped = trim_separators(&capped);

    if capped.is_empty() { FALLBACK_STEM.to_string() } else { capped.to_string() }
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c| c == '_' || c == '.')
}

fn strip_scheme(url: &str) -> &str {
    match url.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            rest
        }
        _ => url,
    }
}
