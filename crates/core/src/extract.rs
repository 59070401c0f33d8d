use crate::Result;
use crate::parse::{Document, Element};

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Tags whose elements become records in the first pass
pub const PRIMARY_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "a", "img", "th", "td"];

/// Text under these elements is never a text chunk
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title", "meta", "link"];

/// Text sitting directly under these is page chrome, not a text chunk
const STRAY_TEXT_PARENTS: &[&str] = &["html", "body"];

/// Configuration for content extraction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// A stray text node becomes a `text_chunk` only when its cleaned text
    /// is longer than this many characters
    pub min_text_chunk_len: usize,
    /// Emit records for primary elements nested inside another recorded
    /// primary element (an `<a>` inside an `<li>`, a `<p>` inside a `<td>`)
    pub include_nested: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_text_chunk_len: 0, include_nested: true }
    }
}

impl ExtractConfig {
    /// Sets the text chunk length threshold.
    pub fn min_text_chunk_len(mut self, value: usize) -> Self {
        self.min_text_chunk_len = value;
        self
    }

    /// Sets whether nested primary elements are recorded.
    pub fn include_nested(mut self, value: bool) -> Self {
        self.include_nested = value;
        self
    }
}

/// The `type` column of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `h1`..`h6`, carrying the level
    Heading(u8),
    Paragraph,
    ListItem,
    Link,
    Image,
    TableHeader,
    TableData,
    TextChunk,
}

impl RecordKind {
    /// Maps a primary tag name to its record kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::Paragraph),
            "li" => Some(Self::ListItem),
            "a" => Some(Self::Link),
            "img" => Some(Self::Image),
            "th" => Some(Self::TableHeader),
            "td" => Some(Self::TableData),
            _ => {
                let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
                (1..=6).contains(&level).then_some(Self::Heading(level))
            }
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heading(level) => write!(f, "heading_h{}", level),
            Self::Paragraph => f.write_str("paragraph"),
            Self::ListItem => f.write_str("list_item"),
            Self::Link => f.write_str("link"),
            Self::Image => f.write_str("image"),
            Self::TableHeader => f.write_str("table_header"),
            Self::TableData => f.write_str("table_data"),
            Self::TextChunk => f.write_str("text_chunk"),
        }
    }
}

/// The `data` column of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// Cleaned text
    Text(String),
    /// An anchor with its resolved target
    Link { text: String, url: String },
    /// An image with its resolved source
    Image { src: String, alt: String },
}

impl RecordData {
    /// Renders the value as it appears in the `data` column.
    ///
    /// Text is written as-is. Links and images are written as a literal
    /// key/value mapping, e.g. `{'text': 'Docs', 'url': 'https://a.test/docs'}`.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Link { text, url } => format!("{{'text': {}, 'url': {}}}", quote_literal(text), quote_literal(url)),
            Self::Image { src, alt } => format!("{{'src': {}, 'alt': {}}}", quote_literal(src), quote_literal(alt)),
        }
    }
}

/// Quotes a string the way the mapping literal expects: double quotes when
/// the value holds a `'` but no `"`, single quotes with escapes otherwise.
fn quote_literal(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        format!("\"{}\"", value.replace('\\', "\\\\"))
    } else {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// One extracted content element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub data: RecordData,
}

impl Record {
    pub fn text(kind: RecordKind, text: impl Into<String>) -> Self {
        Self { kind, data: RecordData::Text(text.into()) }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { kind: RecordKind::Link, data: RecordData::Link { text: text.into(), url: url.into() } }
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self { kind: RecordKind::Image, data: RecordData::Image { src: src.into(), alt: alt.into() } }
    }
}

/// The result of content extraction for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Records in traversal order: primary elements, then text chunks
    pub records: Vec<Record>,
    /// Number of primary elements found, including skipped ones
    pub primary_elements: usize,
    /// Number of records produced by the primary pass
    pub primary_records: usize,
    /// Number of records produced by the text chunk pass
    pub text_chunks: usize,
    /// Whether a `<body>` was found; the whole document is scanned otherwise
    pub has_body: bool,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Collapses whitespace runs into single spaces and trims the result
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract records from a parsed document
///
/// Runs two passes over the same tree. The first visits every element whose
/// tag is in [`PRIMARY_TAGS`], in document order. The second visits text
/// nodes outside any primary tag and keeps the ones longer than
/// [`ExtractConfig::min_text_chunk_len`]. The first pass finishes before the
/// second starts, so all primary records precede all text chunks.
pub fn extract_records(doc: &Document, config: &ExtractConfig) -> Result<Extraction> {
    let body = doc.body();
    let has_body = body.is_some();
    let container = body.unwrap_or_else(|| doc.root());

    let mut extraction = Extraction { has_body, ..Default::default() };

    extract_primary(doc, container, config, &mut extraction)?;
    extract_text_chunks(container, config, &mut extraction);

    tracing::debug!(
        primary_elements = extraction.primary_elements,
        primary_records = extraction.primary_records,
        text_chunks = extraction.text_chunks,
        has_body,
        "extracted records"
    );

    Ok(extraction)
}

fn extract_primary(doc: &Document, container: Element<'_>, config: &ExtractConfig, out: &mut Extraction) -> Result<()> {
    let elements = container.select(&PRIMARY_TAGS.join(", "))?;
    out.primary_elements = elements.len();

    let mut recorded = HashSet::new();

    for element in elements {
        let node = element.element_ref();

        if !config.include_nested && node.ancestors().any(|ancestor| recorded.contains(&ancestor.id())) {
            continue;
        }

        if let Some(record) = primary_record(doc, &element) {
            out.records.push(record);
            out.primary_records += 1;
            recorded.insert(node.id());
        }
    }

    Ok(())
}

/// Build the record for one primary element, if it has any content
fn primary_record(doc: &Document, element: &Element<'_>) -> Option<Record> {
    let tag = element.tag_name();
    let kind = RecordKind::from_tag(&tag)?;

    match kind {
        RecordKind::Link => {
            let href = element.attr("href").map(str::trim).filter(|h| !h.is_empty())?;
            let url = doc.resolve(href);
            let text = Some(clean_text(&element.text()))
                .filter(|t| !t.is_empty())
                .or_else(|| element.attr("title").map(clean_text).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| url.clone());
            Some(Record::link(text, url))
        }
        RecordKind::Image => {
            let src = ["data-src", "src"]
                .iter()
                .filter_map(|name| element.attr(name))
                .map(str::trim)
                .find(|src| !src.is_empty())?;
            let alt = element.attr("alt").map(clean_text).unwrap_or_default();
            Some(Record::image(doc.resolve(src), alt))
        }
        _ => {
            let text = clean_text(&element.text());
            (!text.is_empty()).then(|| Record::text(kind, text))
        }
    }
}

fn extract_text_chunks(container: Element<'_>, config: &ExtractConfig, out: &mut Extraction) {
    for node in container.element_ref().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let stray = node
            .parent()
            .and_then(scraper::ElementRef::wrap)
            .is_some_and(|parent| STRAY_TEXT_PARENTS.contains(&parent.value().name()));
        if stray {
            continue;
        }

        let excluded = node.ancestors().filter_map(scraper::ElementRef::wrap).any(|ancestor| {
            let name = ancestor.value().name();
            PRIMARY_TAGS.contains(&name) || NON_CONTENT_TAGS.contains(&name)
        });
        if excluded {
            continue;
        }

        let cleaned = clean_text(text);
        if !cleaned.is_empty() && cleaned.chars().count() > config.min_text_chunk_len {
            out.records.push(Record::text(RecordKind::TextChunk, cleaned));
            out.text_chunks += 1;
        }
    }
}
