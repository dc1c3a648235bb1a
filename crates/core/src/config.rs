//! Extractor configuration.
//!
//! [`ExtractorConfig`] holds the tunable policy of the pipeline (timeouts,
//! thresholds, rate limit) and [`ProviderKeys`] the credentials of the paid
//! transports. Both are resolved once and injected into the
//! [`Extractor`](crate::Extractor).
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use annonce_core::ExtractorConfig;
//!
//! let config = ExtractorConfig::builder()
//!     .rendering_timeout(Duration::from_secs(60))
//!     .min_core_fields(1)
//!     .build();
//! assert_eq!(config.min_core_fields, 1);
//! ```

use std::env;
use std::time::Duration;

use crate::gate::RateLimitPolicy;

/// Browser-like User-Agent sent by the direct transport.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tunable policy of the extraction pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Timeout of the rendering transport (default: 45 s).
    pub rendering_timeout: Duration,

    /// Timeout of the readable-content transport (default: 15 s).
    pub readable_timeout: Duration,

    /// Timeout of the crawl transport (default: 20 s).
    pub crawl_timeout: Duration,

    /// Post-load wait requested from the crawl service (default: 3 s).
    pub crawl_wait: Duration,

    /// Timeout of the direct transport (default: 10 s).
    pub direct_timeout: Duration,

    /// Timeout of the image resolver request (default: 5 s).
    pub image_timeout: Duration,

    /// Bytes requested by the image resolver (default: 64 KiB).
    pub image_byte_limit: usize,

    /// Shortest readable-content text worth parsing (default: 100 chars).
    pub readable_min_chars: usize,

    /// Shortest crawl markdown worth parsing (default: 50 chars).
    pub crawl_min_chars: usize,

    /// Core fields a record needs to be accepted (default: 2).
    pub min_core_fields: usize,

    /// User-Agent of the direct transport and image resolver.
    pub user_agent: String,

    /// Per-client request quota.
    pub rate_limit: RateLimitPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            rendering_timeout: Duration::from_secs(45),
            readable_timeout: Duration::from_secs(15),
            crawl_timeout: Duration::from_secs(20),
            crawl_wait: Duration::from_secs(3),
            direct_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(5),
            image_byte_limit: 64 * 1024,
            readable_min_chars: 100,
            crawl_min_chars: 50,
            min_core_fields: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_limit: RateLimitPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}

/// Builder for ExtractorConfig.
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractorConfig::default() }
    }

    pub fn rendering_timeout(mut self, value: Duration) -> Self {
        self.config.rendering_timeout = value;
        self
    }

    pub fn readable_timeout(mut self, value: Duration) -> Self {
        self.config.readable_timeout = value;
        self
    }

    pub fn crawl_timeout(mut self, value: Duration) -> Self {
        self.config.crawl_timeout = value;
        self
    }

    pub fn crawl_wait(mut self, value: Duration) -> Self {
        self.config.crawl_wait = value;
        self
    }

    pub fn direct_timeout(mut self, value: Duration) -> Self {
        self.config.direct_timeout = value;
        self
    }

    pub fn image_timeout(mut self, value: Duration) -> Self {
        self.config.image_timeout = value;
        self
    }

    pub fn image_byte_limit(mut self, value: usize) -> Self {
        self.config.image_byte_limit = value;
        self
    }

    pub fn readable_min_chars(mut self, value: usize) -> Self {
        self.config.readable_min_chars = value;
        self
    }

    pub fn crawl_min_chars(mut self, value: usize) -> Self {
        self.config.crawl_min_chars = value;
        self
    }

    /// Sets the sufficiency threshold; clamped to the two core fields.
    pub fn min_core_fields(mut self, value: usize) -> Self {
        self.config.min_core_fields = value.clamp(1, 2);
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    pub fn rate_limit(mut self, value: RateLimitPolicy) -> Self {
        self.config.rate_limit = value;
        self
    }

    /// Applies the same timeout to every transport.
    pub fn timeout(self, value: Duration) -> Self {
        self.rendering_timeout(value)
            .readable_timeout(value)
            .crawl_timeout(value)
            .direct_timeout(value)
    }

    /// Builds the config.
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl Default for ExtractorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Credentials of the external transports.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderKeys {
    /// ScrapingBee key; rendering is unavailable without it.
    pub rendering: Option<String>,
    /// Jina reader key; optional, the reader also works keyless.
    pub readable: Option<String>,
    /// Firecrawl key; crawling is unavailable without it.
    pub crawl: Option<String>,
    /// Whether the readable-content transport may be used at all.
    pub reader_enabled: bool,
}

impl ProviderKeys {
    pub const RENDERING_ENV: &'static str = "SCRAPINGBEE_API_KEY";
    pub const READABLE_ENV: &'static str = "JINA_API_KEY";
    pub const CRAWL_ENV: &'static str = "FIRECRAWL_API_KEY";
    pub const READER_ENABLED_ENV: &'static str = "ENABLE_READER";

    /// Reads keys from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolves keys through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let key = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let reader_enabled = key(Self::READER_ENABLED_ENV)
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Self {
            rendering: key(Self::RENDERING_ENV),
            readable: key(Self::READABLE_ENV),
            crawl: key(Self::CRAWL_ENV),
            reader_enabled,
        }
    }

    /// Keys for a process with no paid provider configured.
    pub fn none() -> Self {
        Self { reader_enabled: true, ..Default::default() }
    }
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |k: &Option<String>| if k.is_some() { "set" } else { "unset" };
        f.debug_struct("ProviderKeys")
            .field("rendering", &set(&self.rendering))
            .field("readable", &set(&self.readable))
            .field("crawl", &set(&self.crawl))
            .field("reader_enabled", &self.reader_enabled)
            .finish()
    }
}
