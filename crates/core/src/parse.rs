//! HTML parsing and DOM access.
//!
//! This module provides the [`Document`] and [`Element`] types used by the
//! extractor. Parsing is delegated to `scraper` (html5ever), which recovers
//! from almost any malformed markup; the only inputs rejected here are bodies
//! with nothing to build a tree from.
//!
//! # Example
//!
//! ```rust
//! use pagesift_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{PagesiftError, Result};

/// Represents a parsed HTML document.
///
/// A Document wraps an HTML page together with the base URL that relative
/// `href` and `src` attributes resolve against.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string with no base URL.
    ///
    /// # Errors
    ///
    /// Returns [`PagesiftError::Parse`] if the input is blank or binary.
    pub fn parse(html: &str) -> Result<Self> {
        Self::build(html, None)
    }

    /// Parses HTML fetched from `base_url`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagesift_core::parse::Document;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/docs/").unwrap();
    /// let doc = Document::parse_with_url("<a href='intro'>Intro</a>", base).unwrap();
    /// assert_eq!(doc.resolve("intro"), "https://example.com/docs/intro");
    /// ```
    pub fn parse_with_url(html: &str, base_url: Url) -> Result<Self> {
        Self::build(html, Some(base_url))
    }

    fn build(html: &str, base_url: Option<Url>) -> Result<Self> {
        let source = || base_url.as_ref().map(Url::to_string).unwrap_or_default();

        if html.trim().is_empty() {
            return Err(PagesiftError::parse(source(), "document is empty"));
        }
        if html.contains('\0') {
            return Err(PagesiftError::parse(source(), "response is binary, not HTML"));
        }

        let html = Html::parse_document(html);
        Ok(Self { html, base_url })
    }

    /// Gets the base URL used for link resolution.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The `<body>` element, if the document has one.
    ///
    /// html5ever synthesizes a body for ordinary documents; frameset pages
    /// are the common case without one.
    pub fn body(&self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|element| Element { element })
    }

    /// The root `<html>` element.
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagesiftError::Parse`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| crate::extract::clean_text(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty())
    }

    /// Resolves a possibly relative reference against the base URL.
    ///
    /// Falls back to the reference unchanged when there is no base URL or
    /// the two cannot be joined.
    pub fn resolve(&self, reference: &str) -> String {
        match &self.base_url {
            Some(base) => match base.join(reference) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!(reference, base = %base, error = %e, "keeping unresolvable reference as-is");
                    reference.to_string()
                }
            },
            None => reference.to_string(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PagesiftError::parse("", format!("invalid selector '{}': {}", selector, e)))
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the text content of this element.
    ///
    /// Returns the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the underlying `scraper::ElementRef`.
    pub fn element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>  Test
              Page </title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.body().is_some());
        assert!(doc.base_url().is_none());
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_element_attributes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("a").unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].attr("href"), Some("https://example.com"));
        assert_eq!(elements[0].tag_name(), "a");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PagesiftError::Parse { .. })));
    }

    #[test]
    fn test_blank_document_is_parse_error() {
        let base = Url::parse("https://example.com/").unwrap();
        let result = Document::parse_with_url(" \n\t ", base);
        match result {
            Err(PagesiftError::Parse { url, reason }) => {
                assert_eq!(url, "https://example.com/");
                assert!(reason.contains("empty"));
            }
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_binary_document_is_parse_error() {
        assert!(matches!(Document::parse("\u{0}\u{1}PNG"), Err(PagesiftError::Parse { .. })));
    }

    #[test]
    fn test_frameset_has_no_body() {
        let html = r#"<html><head></head><frameset><frame src="a.html"></frameset></html>"#;
        let doc = Document::parse(html).unwrap();
        assert!(doc.body().is_none());
        assert_eq!(doc.root().tag_name(), "html");
    }

    #[test]
    fn test_resolve() {
        let base = Url::parse("https://example.com/docs/guide.html").unwrap();
        let doc = Document::parse_with_url("<p>x</p>", base).unwrap();
        assert_eq!(doc.resolve("/x"), "https://example.com/x");
        assert_eq!(doc.resolve("next.html"), "https://example.com/docs/next.html");
        assert_eq!(doc.resolve("https://other.test/"), "https://other.test/");

        let doc = Document::parse("<p>x</p>").unwrap();
        assert_eq!(doc.resolve("/x"), "/x");
    }
}
