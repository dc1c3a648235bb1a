//! Main extraction API.
//!
//! The entry point is the [`Extractor`]: it owns the request gate, the site
//! table and the configured transports, and turns a listing URL into an
//! [`ExtractionResponse`]. [`parse_listing`] and [`parse_listing_text`] run
//! the parser and fusion alone on content the caller already has.
//!
//! # Example
//!
//! ```rust,no_run
//! use annonce_core::{ExtractionRequest, Extractor, ExtractorConfig, ProviderKeys};
//!
//! # #[tokio::main]
//! # async fn main() -> annonce_core::Result<()> {
//! let extractor = Extractor::from_keys(ExtractorConfig::default(), &ProviderKeys::from_env())?;
//! let request = ExtractionRequest::new("https://www.pap.fr/annonces/appartement-paris-r1", "cli");
//! let response = extractor.extract(&request).await?;
//! println!("{} via {}", response.message, response.method);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{Instrument, debug, info_span};
use url::Url;

use crate::config::ExtractorConfig;
use crate::fusion::fuse;
use crate::gate::RequestGate;
use crate::image::resolve_image;
use crate::orchestrator::Orchestrator;
use crate::providers::{ProviderAvailability, Providers};
use crate::record::{ExtractedRecord, ListingFields, Provenance};
use crate::response::ExtractionResponse;
use crate::site::SiteTable;
use crate::sources::{RawContent, parse_sources};
use crate::{AnnonceError, Result};

/// One call to [`Extractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub url: String,
    /// Rate-limit bucket of the caller, usually its IP address.
    pub client_key: String,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self { url: url.into(), client_key: client_key.into() }
    }
}

/// Adaptive listing extractor.
///
/// Safe to share between tasks; the rate limiter is the only mutable state.
#[derive(Debug)]
pub struct Extractor {
    config: Arc<ExtractorConfig>,
    gate: RequestGate,
    sites: SiteTable,
    orchestrator: Orchestrator,
}

impl Extractor {
    /// Creates an extractor over explicitly supplied transports.
    pub fn new(config: ExtractorConfig, sites: SiteTable, providers: Providers) -> Self {
        let config = Arc::new(config);
        Self {
            gate: RequestGate::new(config.rate_limit),
            sites,
            orchestrator: Orchestrator::new(providers, Arc::clone(&config)),
            config,
        }
    }

    /// Creates an extractor with the built-in site table and the reqwest
    /// clients `keys` allow.
    ///
    /// # Errors
    ///
    /// Returns [`AnnonceError::HttpError`] if an HTTP client cannot be built.
    #[cfg(feature = "fetch")]
    pub fn from_keys(config: ExtractorConfig, keys: &crate::config::ProviderKeys) -> Result<Self> {
        let providers = build_providers(&config, keys)?;
        Ok(Self::new(config, SiteTable::builtin(), providers))
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn availability(&self) -> ProviderAvailability {
        self.orchestrator.availability()
    }

    /// Extracts a listing: gate, classify, run strategies, then look for an
    /// image if none was found.
    ///
    /// # Errors
    ///
    /// `RateLimited`, `InvalidInput` and `BlockedHost` come from the gate
    /// before any network call. `AllStrategiesExhausted` means no transport
    /// produced a sufficient record.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse> {
        let url = self.gate.admit(&request.url, &request.client_key).inspect_err(|err| {
            debug!(url = %request.url, client = %request.client_key, error = %err, "request rejected");
        })?;
        let classification = self.sites.classify(&url);
        let span = info_span!("extract", url = %url, site = classification.source_label(), tier = ?classification.tier);

        async {
            let mut extraction = self.orchestrator.run(&url, &classification).await?;

            if extraction.record.fields.image_url.is_none()
                && let Some(http) = &self.orchestrator.providers().http
                && let Some(image) = resolve_image(http.as_ref(), &url, &self.config).await
            {
                let found = ListingFields { image_url: Some(image), ..Default::default() };
                extraction.record.fill_from(&found, Provenance::MetaTag);
            }

            Ok(ExtractionResponse::new(&classification, extraction))
        }
        .instrument(span)
        .await
    }
}

/// Builds the reqwest-backed transports allowed by `keys`.
///
/// The direct transport is always present. The reader runs keyless unless
/// disabled.
#[cfg(feature = "fetch")]
pub fn build_providers(config: &ExtractorConfig, keys: &crate::config::ProviderKeys) -> Result<Providers> {
    use crate::fetch::HttpClient;
    use crate::providers::{FirecrawlClient, JinaReader, ScrapingBeeClient};

    let mut providers = Providers::default().with_http(Arc::new(HttpClient::new(&config.user_agent)?));
    if let Some(key) = &keys.rendering {
        providers = providers.with_rendering(Arc::new(ScrapingBeeClient::new(key, config.rendering_timeout)?));
    }
    if keys.reader_enabled {
        providers = providers.with_readable(Arc::new(JinaReader::new(keys.readable.clone(), config.readable_timeout)?));
    }
    if let Some(key) = &keys.crawl {
        providers = providers.with_crawl(Arc::new(FirecrawlClient::new(key, config.crawl_timeout)?));
    }
    Ok(providers)
}

/// Parses already-fetched HTML into a fused record.
///
/// No sufficiency check is applied; the record holds whatever was found.
///
/// # Errors
///
/// Returns [`AnnonceError::InvalidInput`] if `url` is given but not a valid URL.
///
/// # Example
///
/// ```rust
/// use annonce_core::parse_listing;
///
/// let html = r#"<html><head><title>Maison 5 pièces 120 m²</title></head>
///     <body><span itemprop="price" content="420000"></span></body></html>"#;
/// let record = parse_listing(html, None).unwrap();
/// assert_eq!(record.fields.price, Some(420000.0));
/// assert_eq!(record.fields.surface, Some(120.0));
/// ```
pub fn parse_listing(html: &str, url: Option<&str>) -> Result<ExtractedRecord> {
    let url = url
        .map(|u| Url::parse(u).map_err(|e| AnnonceError::InvalidInput(format!("{}: {}", u, e))))
        .transpose()?;
    let sources = parse_sources(&RawContent::from_html(html), url.as_ref());
    Ok(fuse(url.map(String::from), &sources.candidates()))
}

/// Parses pasted listing text into a fused record.
pub fn parse_listing_text(text: &str) -> ExtractedRecord {
    let sources = parse_sources(&RawContent::from_text(text), None);
    fuse(None, &sources.candidates())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RateLimitPolicy;
    use crate::orchestrator::mocks::{MockProvider, Reply, SUFFICIENT_HTML, SURFACE_ONLY_HTML};
    use crate::strategy::StrategyKind;
    use std::time::Duration;

    fn extractor(providers: Providers) -> Extractor {
        Extractor::new(ExtractorConfig::default(), SiteTable::builtin(), providers)
    }

    #[tokio::test]
    async fn test_gate_rejects_before_any_call() {
        let http = Arc::new(MockProvider::new(Reply::Body(SUFFICIENT_HTML)));
        let extractor = extractor(Providers::default().with_http(http.clone()));

        for url in ["http://example.fr/a", "not a url", "https://10.1.2.3/a", "https://foo.internal/"] {
            let err = extractor.extract(&ExtractionRequest::new(url, "client")).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "{url}");
        }
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_per_client() {
        let config = ExtractorConfig::builder()
            .rate_limit(RateLimitPolicy { max_requests: 1, window: Duration::from_secs(60) })
            .build();
        let extractor = Extractor::new(config, SiteTable::builtin(), Providers::default());
        let request = ExtractionRequest::new("https://example.fr/annonce/1", "1.2.3.4");

        assert!(matches!(
            extractor.extract(&request).await,
            Err(AnnonceError::AllStrategiesExhausted { .. })
        ));
        assert!(matches!(extractor.extract(&request).await, Err(AnnonceError::RateLimited { .. })));

        let other = ExtractionRequest::new("https://example.fr/annonce/1", "5.6.7.8");
        assert!(!matches!(extractor.extract(&other).await, Err(AnnonceError::RateLimited { .. })));
    }

    /// Serves a page without image, and a head with one for ranged requests.
    struct PageWithHead {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::providers::PlainHttp for PageWithHead {
        async fn get(&self, _url: &Url, request: &crate::providers::HttpRequest) -> Result<String> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(match request.max_bytes {
                Some(_) => r#"<head><meta property="og:image" content="https://cdn.example.fr/p.jpg"></head>"#,
                None => r#"<html><body><span itemprop="price" content="310000"></span><p>Maison 95 m²</p></body></html>"#,
            }
            .to_string())
        }
    }

    #[tokio::test]
    async fn test_extract_resolves_missing_image() {
        let http = Arc::new(PageWithHead { calls: Default::default() });
        let extractor = extractor(Providers::default().with_http(http.clone()));

        let response = extractor
            .extract(&ExtractionRequest::new("https://example.fr/annonce/7", "client"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.source, "web");
        assert_eq!(response.method, StrategyKind::DirectFetch);
        assert_eq!(response.data.fields.image_url.as_deref(), Some("https://cdn.example.fr/p.jpg"));
        assert_eq!(response.data.url.as_deref(), Some("https://example.fr/annonce/7"));
        assert_eq!(http.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_image_lookup_when_image_known() {
        let html: &'static str = concat!(
            r#"<html><head><meta property="og:image" content="https://cdn.example.fr/p.jpg"></head>"#,
            r#"<body><span itemprop="price" content="310000"></span><p>Maison 95 m²</p></body></html>"#
        );
        let http = Arc::new(MockProvider::new(Reply::Body(html)));
        let extractor = extractor(Providers::default().with_http(http.clone()));

        let response = extractor.extract(&ExtractionRequest::new("https://example.fr/a", "c")).await.unwrap();
        assert_eq!(response.data.fields.image_url.as_deref(), Some("https://cdn.example.fr/p.jpg"));
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_surfaces_hint() {
        let http = Arc::new(MockProvider::new(Reply::Body(SURFACE_ONLY_HTML)));
        let extractor = extractor(Providers::default().with_http(http));

        let err = extractor
            .extract(&ExtractionRequest::new("https://www.pap.fr/annonces/1", "client"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 502);
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_parse_listing_is_idempotent() {
        let first = parse_listing(SUFFICIENT_HTML, Some("https://www.pap.fr/annonces/1")).unwrap();
        let second = parse_listing(SUFFICIENT_HTML, Some("https://www.pap.fr/annonces/1")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fields.price, Some(245_000.0));
        assert_eq!(first.fields.city.as_deref(), Some("Bordeaux"));
        assert_eq!(first.fields.department_code.as_deref(), Some("33"));
    }

    #[test]
    fn test_parse_listing_rejects_bad_url() {
        assert!(matches!(parse_listing("<html></html>", Some("::")), Err(AnnonceError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_listing_text() {
        let record = parse_listing_text("Maison 5 pièces de 120 m² à vendre 420 000 €, DPE C");
        assert_eq!(record.fields.price, Some(420_000.0));
        assert_eq!(record.fields.surface, Some(120.0));
        assert_eq!(record.fields.rooms, Some(5));
        assert_eq!(record.provenance_of(crate::record::Field::Price), Some(Provenance::FreeText));
    }
}
