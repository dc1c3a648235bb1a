//! Extraction strategies.
//!
//! A strategy is one transport plus the side-channel metadata that transport
//! reports. Every strategy hands its raw content to the same multi-source
//! parser; they differ only in how the content is obtained.

use std::fmt;

use serde::Serialize;
use url::Url;

use crate::config::ExtractorConfig;
use crate::providers::{CrawlOptions, HttpRequest, ProviderAvailability, Providers};
use crate::record::ListingFields;
use crate::site::{ProtectionTier, SiteClassification};
use crate::sources::RawContent;
use crate::sources::values::{DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS, clean_text};
use crate::{AnnonceError, Result};

/// The four transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Remote headless rendering with per-site proxy options.
    Rendering,
    /// Remote readability service returning cleaned text.
    ReadableContent,
    /// Remote crawler returning markdown, HTML and metadata.
    CrawlRender,
    /// Plain GET with browser-like headers.
    DirectFetch,
}

const PROTECTED_ORDER: &[StrategyKind] = &[
    StrategyKind::Rendering,
    StrategyKind::CrawlRender,
    StrategyKind::ReadableContent,
    StrategyKind::DirectFetch,
];

const STANDARD_ORDER: &[StrategyKind] = &[
    StrategyKind::ReadableContent,
    StrategyKind::CrawlRender,
    StrategyKind::Rendering,
    StrategyKind::DirectFetch,
];

impl StrategyKind {
    pub const fn name(self) -> &'static str {
        match self {
            StrategyKind::Rendering => "rendering",
            StrategyKind::ReadableContent => "readable-content",
            StrategyKind::CrawlRender => "crawl-render",
            StrategyKind::DirectFetch => "direct-fetch",
        }
    }

    /// Strategy order for a tier: heavyweight first on protected sites,
    /// cheapest first everywhere else.
    pub fn order(tier: ProtectionTier) -> &'static [StrategyKind] {
        match tier {
            ProtectionTier::Protected => PROTECTED_ORDER,
            ProtectionTier::Standard => STANDARD_ORDER,
        }
    }

    pub fn is_available(self, availability: &ProviderAvailability) -> bool {
        match self {
            StrategyKind::Rendering => availability.rendering,
            StrategyKind::ReadableContent => availability.readable,
            StrategyKind::CrawlRender => availability.crawl,
            StrategyKind::DirectFetch => availability.direct,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub strategy: StrategyKind,
    pub success: bool,
    pub fields_extracted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StrategyOutcome {
    pub fn succeeded(strategy: StrategyKind, fields_extracted: usize) -> Self {
        Self { strategy, success: true, fields_extracted, error: None }
    }

    pub fn failed(strategy: StrategyKind, error: &AnnonceError) -> Self {
        Self { strategy, success: false, fields_extracted: 0, error: Some(error.to_string()) }
    }
}

/// Fetches raw content for `kind` through its provider.
pub(crate) async fn fetch_raw(
    kind: StrategyKind, providers: &Providers, url: &Url, classification: &SiteClassification,
    config: &ExtractorConfig,
) -> Result<RawContent> {
    let unavailable = || AnnonceError::ProviderUnavailable(kind.name());

    match kind {
        StrategyKind::Rendering => {
            let provider = providers.rendering.as_ref().ok_or_else(unavailable)?;
            let html = provider.render(url, &classification.options).await?;
            require_length(kind, &html, 1)?;
            Ok(RawContent::from_html(html))
        }
        StrategyKind::ReadableContent => {
            let provider = providers.readable.as_ref().ok_or_else(unavailable)?;
            let content = provider.read(url).await?;
            require_length(kind, &content.content, config.readable_min_chars)?;
            let side_channel = side_channel(
                content.title.as_deref(),
                content.description.as_deref(),
                content.images.first().map(String::as_str),
            );
            Ok(RawContent::from_text(content.content).with_side_channel(side_channel))
        }
        StrategyKind::CrawlRender => {
            let provider = providers.crawl.as_ref().ok_or_else(unavailable)?;
            let page = provider.crawl(url, &CrawlOptions { wait: config.crawl_wait }).await?;
            require_length(kind, &page.markdown, config.crawl_min_chars)?;
            let side_channel = side_channel(
                page.metadata.title.as_deref(),
                page.metadata.description.as_deref(),
                page.metadata.image.as_deref(),
            );
            let mut raw = RawContent::from_text(page.markdown).with_side_channel(side_channel);
            if let Some(html) = page.html {
                raw = raw.with_html(html);
            }
            Ok(raw)
        }
        StrategyKind::DirectFetch => {
            let http = providers.http.as_ref().ok_or_else(unavailable)?;
            let request = HttpRequest::browser(&config.user_agent, config.direct_timeout);
            let html = http.get(url, &request).await?;
            require_length(kind, &html, 1)?;
            Ok(RawContent::from_html(html))
        }
    }
}

fn require_length(kind: StrategyKind, content: &str, min_chars: usize) -> Result<()> {
    let len = content.trim().chars().count();
    if len < min_chars.max(1) {
        return Err(AnnonceError::ProviderError {
            provider: kind.name(),
            message: format!("content too short ({} chars)", len),
        });
    }
    Ok(())
}

fn side_channel(title: Option<&str>, description: Option<&str>, image: Option<&str>) -> ListingFields {
    ListingFields {
        title: title.map(|t| clean_text(t, TITLE_MAX_CHARS)).filter(|t| !t.is_empty()),
        description: description
            .map(|d| clean_text(d, DESCRIPTION_MAX_CHARS))
            .filter(|d| !d.is_empty()),
        image_url: image.filter(|i| i.starts_with("http")).map(str::to_string),
        ..Default::default()
    }
}
