//! Multi-source parsing of raw listing content.
//!
//! Raw content coming out of a transport is run through up to four
//! independent techniques, each yielding a partial [`ListingFields`]:
//!
//! 1. [`structured`]: embedded JSON-LD (highest trust)
//! 2. [`patterns`]: regexes keyed to known markup
//! 3. [`meta`]: OpenGraph / Twitter-card tags
//! 4. [`text`]: heuristics over unstructured prose (lowest trust)
//!
//! The free-text pass only runs when the higher-trust techniques found
//! neither price nor surface. When a transport returned HTML only, the
//! visible text of the page is used for that pass.

pub mod meta;
pub mod patterns;
pub mod structured;
pub mod text;
pub mod values;

use url::Url;

use crate::parse::Document;
use crate::record::{ListingFields, Provenance};

pub use meta::extract_meta;
pub use patterns::extract_patterns;
pub use structured::extract_structured;
pub use text::extract_free_text;

/// Content fetched by one transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawContent {
    /// Page markup, when the transport returns it.
    pub html: Option<String>,
    /// Plain text or markdown, when the transport returns it.
    pub text: Option<String>,
    /// Fields the provider reported alongside the content (title, image, ...).
    pub side_channel: ListingFields,
}

impl RawContent {
    pub fn from_html(html: impl Into<String>) -> Self {
        Self { html: Some(html.into()), ..Default::default() }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_side_channel(mut self, fields: ListingFields) -> Self {
        self.side_channel = fields;
        self
    }
}

/// Candidate field sets produced by each technique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSources {
    pub structured: ListingFields,
    pub patterns: ListingFields,
    pub meta: ListingFields,
    pub side_channel: ListingFields,
    /// `None` when the free-text pass was not needed.
    pub free_text: Option<ListingFields>,
}

impl ParsedSources {
    /// Candidates in trust order, ready for fusion.
    pub fn candidates(&self) -> Vec<(Provenance, &ListingFields)> {
        let mut out = vec![
            (Provenance::StructuredData, &self.structured),
            (Provenance::HtmlPattern, &self.patterns),
            (Provenance::MetaTag, &self.meta),
            (Provenance::SideChannel, &self.side_channel),
        ];
        if let Some(free_text) = &self.free_text {
            out.push((Provenance::FreeText, free_text));
        }
        out
    }

    fn found_price_or_surface(&self) -> bool {
        self.structured.has_price_or_surface()
            || self.patterns.has_price_or_surface()
            || self.meta.has_price_or_surface()
            || self.side_channel.has_price_or_surface()
    }
}

/// Runs every applicable technique over `raw`.
pub fn parse_sources(raw: &RawContent, url: Option<&Url>) -> ParsedSources {
    let mut parsed = ParsedSources { side_channel: raw.side_channel.clone(), ..Default::default() };

    let doc = raw.html.as_deref().map(Document::parse);
    if let (Some(html), Some(doc)) = (raw.html.as_deref(), doc.as_ref()) {
        parsed.structured = extract_structured(doc);
        parsed.patterns = extract_patterns(html, doc, url);
        parsed.meta = extract_meta(doc);
    }

    if !parsed.found_price_or_surface() {
        let text = match (&raw.text, &doc) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(doc)) => Some(doc.text_content()),
            (None, None) => None,
        };
        parsed.free_text = text.map(|t| extract_free_text(&t));
    }

    parsed
}
