//! External transports.
//!
//! Each strategy talks to the outside world through one of the traits
//! below. The reqwest-backed clients live behind the `fetch` feature; tests
//! plug in their own implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::Result;
use crate::site::TransportOptions;

#[cfg(feature = "fetch")]
pub mod firecrawl;
#[cfg(feature = "fetch")]
pub mod jina;
#[cfg(feature = "fetch")]
pub mod scrapingbee;

#[cfg(feature = "fetch")]
pub use firecrawl::FirecrawlClient;
#[cfg(feature = "fetch")]
pub use jina::JinaReader;
#[cfg(feature = "fetch")]
pub use scrapingbee::ScrapingBeeClient;

/// Remote headless browser returning rendered HTML.
#[async_trait]
pub trait RenderingProvider: Send + Sync {
    async fn render(&self, url: &Url, options: &TransportOptions) -> Result<String>;
}

/// Text returned by a readability service, with whatever metadata it found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadableContent {
    pub content: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

/// Remote readability service returning cleaned page text.
#[async_trait]
pub trait ReadableContentProvider: Send + Sync {
    async fn read(&self, url: &Url) -> Result<ReadableContent>;
}

/// Page metadata reported by a crawl service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Rendered page returned by a crawl service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlPage {
    pub markdown: String,
    pub html: Option<String>,
    pub metadata: CrawlMetadata,
}

/// Per-call crawl settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Time the crawler waits after load before capturing the page.
    pub wait: Duration,
}

/// Remote crawler returning markdown, HTML and page metadata.
#[async_trait]
pub trait CrawlProvider: Send + Sync {
    async fn crawl(&self, url: &Url, options: &CrawlOptions) -> Result<CrawlPage>;
}

/// One plain GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub headers: Vec<(&'static str, String)>,
    pub timeout: Duration,
    /// Stop reading the body after this many bytes.
    pub max_bytes: Option<usize>,
}

impl HttpRequest {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, ..Default::default() }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn max_bytes(mut self, limit: usize) -> Self {
        self.max_bytes = Some(limit);
        self
    }

    /// Header set of a desktop browser asking for a French page.
    pub fn browser(user_agent: &str, timeout: Duration) -> Self {
        Self::new(timeout)
            .header("User-Agent", user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8")
            .header("Accept-Language", "fr-FR,fr;q=0.9,en;q=0.8")
            .header("Cache-Control", "no-cache")
    }
}

/// Plain HTTP GET performed by the extractor itself.
#[async_trait]
pub trait PlainHttp: Send + Sync {
    async fn get(&self, url: &Url, request: &HttpRequest) -> Result<String>;
}

/// Which transports are configured. Fixed for the life of an extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderAvailability {
    pub rendering: bool,
    pub readable: bool,
    pub crawl: bool,
    pub direct: bool,
}

/// The set of transports an extractor may use. `None` means not configured.
#[derive(Clone, Default)]
pub struct Providers {
    pub rendering: Option<Arc<dyn RenderingProvider>>,
    pub readable: Option<Arc<dyn ReadableContentProvider>>,
    pub crawl: Option<Arc<dyn CrawlProvider>>,
    pub http: Option<Arc<dyn PlainHttp>>,
}

impl Providers {
    pub fn availability(&self) -> ProviderAvailability {
        ProviderAvailability {
            rendering: self.rendering.is_some(),
            readable: self.readable.is_some(),
            crawl: self.crawl.is_some(),
            direct: self.http.is_some(),
        }
    }

    pub fn with_rendering(mut self, provider: Arc<dyn RenderingProvider>) -> Self {
        self.rendering = Some(provider);
        self
    }

    pub fn with_readable(mut self, provider: Arc<dyn ReadableContentProvider>) -> Self {
        self.readable = Some(provider);
        self
    }

    pub fn with_crawl(mut self, provider: Arc<dyn CrawlProvider>) -> Self {
        self.crawl = Some(provider);
        self
    }

    pub fn with_http(mut self, http: Arc<dyn PlainHttp>) -> Self {
        self.http = Some(http);
        self
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").field("availability", &self.availability()).finish()
    }
}

/// Maps a reqwest failure to a provider error, keeping timeouts distinct.
#[cfg(feature = "fetch")]
pub(crate) fn transport_error(provider: &'static str, timeout: Duration, err: reqwest::Error) -> crate::AnnonceError {
    if err.is_timeout() {
        crate::AnnonceError::Timeout { provider, timeout }
    } else {
        crate::AnnonceError::ProviderError { provider, message: err.to_string() }
    }
}

/// Rejects non-success responses with the status in the message.
#[cfg(feature = "fetch")]
pub(crate) fn check_status(provider: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(crate::AnnonceError::ProviderError { provider, message: format!("HTTP {}", status) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Static(&'static str);

    #[async_trait]
    impl PlainHttp for Static {
        async fn get(&self, _url: &Url, _request: &HttpRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_availability_follows_configured_providers() {
        let providers = Providers::default();
        assert_eq!(providers.availability(), ProviderAvailability::default());

        let providers = providers.with_http(Arc::new(Static("<html></html>")));
        let availability = providers.availability();
        assert!(availability.direct);
        assert!(!availability.rendering);
        assert!(format!("{:?}", providers).contains("direct: true"));
    }

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(Duration::from_secs(5))
            .header("Range", "bytes=0-65535")
            .max_bytes(65_536);
        assert_eq!(request.headers, vec![("Range", "bytes=0-65535".to_string())]);
        assert_eq!(request.max_bytes, Some(65_536));
    }

    #[test]
    fn test_browser_request_headers() {
        let request = HttpRequest::browser("Mozilla/5.0", Duration::from_secs(10));
        let names: Vec<&str> = request.headers.iter().map(|(n, _)| *n).collect();

        assert_eq!(names, vec!["User-Agent", "Accept", "Accept-Language", "Cache-Control"]);
        assert!(request.headers[2].1.starts_with("fr-FR"));
        assert_eq!(request.timeout, Duration::from_secs(10));
        assert_eq!(request.max_bytes, None);
    }
}
