//! HTML parsing and DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types used by the
//! structured-data and meta-tag extractors to query listing pages with CSS
//! selectors.
//!
//! # Example
//!
//! ```rust
//! use annonce_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><meta property="og:title" content="Appartement 3 pièces"></head>
//!         <body><h1>Appartement 3 pièces</h1></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.meta_content("og:title").as_deref(), Some("Appartement 3 pièces"));
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{AnnonceError, Result};

/// Tags whose text never belongs to the visible page.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup still yields a document.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`AnnonceError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use annonce_core::parse::Document;
    ///
    /// let doc = Document::parse(r#"<span class="price">250 000 €</span>"#);
    /// let elements = doc.select("span.price").unwrap();
    /// assert_eq!(elements.len(), 1);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel =
            Selector::parse(selector).map_err(|e| AnnonceError::HtmlParseError(format!("Invalid selector: {}", e)))?;

        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets meta tag content by `name` or `property` attribute.
    pub fn meta_content(&self, attr: &str) -> Option<String> {
        for key in ["property", "name"] {
            let selector = format!("meta[{}=\"{}\"]", key, attr);
            if let Ok(elements) = self.select(&selector)
                && let Some(content) = elements.iter().find_map(|el| el.attr("content"))
            {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
        None
    }

    /// Parses every `application/ld+json` script block that holds valid JSON.
    pub fn json_ld_blocks(&self) -> Vec<serde_json::Value> {
        let mut blocks = Vec::new();
        if let Ok(elements) = self.select("script[type=\"application/ld+json\"]") {
            for el in elements.iter() {
                let text = el.text();
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(text.trim()) {
                    blocks.push(value);
                }
            }
        }
        blocks
    }

    /// Gets the visible text of the document.
    ///
    /// Text inside script, style and similar tags is skipped; block boundaries
    /// become newlines so line-oriented heuristics keep working.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self.html.root_element(), &mut out);
        out
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if NON_CONTENT_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    let block = matches!(
                        el.name(),
                        "p" | "div" | "li" | "br" | "h1" | "h2" | "h3" | "h4" | "tr" | "section" | "article"
                    );
                    collect_text(child_el, out);
                    if block && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }
}
