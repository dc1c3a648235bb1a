pub mod config;
pub mod error;
pub mod extractor;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod fusion;
pub mod gate;
pub mod image;
pub mod orchestrator;
pub mod parse;
pub mod providers;
pub mod record;
pub mod response;
pub mod site;
pub mod sources;
pub mod strategy;

pub use config::{DEFAULT_USER_AGENT, ExtractorConfig, ExtractorConfigBuilder, ProviderKeys};
pub use error::{AnnonceError, Result};
#[cfg(feature = "fetch")]
pub use extractor::build_providers;
pub use extractor::{ExtractionRequest, Extractor, parse_listing, parse_listing_text};
#[cfg(feature = "fetch")]
pub use fetch::{HttpClient, guarded_redirect_policy};
pub use fusion::{complete, department_code, fuse, merge};
pub use gate::{RateDecision, RateLimitPolicy, RateLimiter, RequestGate, is_blocked_host, validate_url};
pub use image::{find_image, resolve_image};
pub use orchestrator::{Extraction, Orchestrator};
pub use parse::Document;
pub use providers::{
    CrawlMetadata, CrawlOptions, CrawlPage, CrawlProvider, HttpRequest, PlainHttp, ProviderAvailability, Providers,
    ReadableContent, ReadableContentProvider, RenderingProvider,
};
pub use record::{EnergyRating, ExtractedRecord, Field, ListingFields, PropertyType, Provenance};
pub use response::{ErrorResponse, ExtractionResponse, retry_after_secs};
pub use site::{ProtectionTier, SiteClassification, SiteEntry, SiteTable, TransportOptions};
#[doc(hidden)]
pub use sources::{ParsedSources, RawContent, parse_sources};
pub use strategy::{StrategyKind, StrategyOutcome};
