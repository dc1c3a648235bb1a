//! Error types for listing extraction.
//!
//! This module defines [`AnnonceError`], which covers every failure the
//! pipeline can produce: gate rejections (rate limiting, invalid input,
//! blocked hosts), per-strategy soft failures that only ever advance the
//! fallback chain, and the terminal exhaustion error surfaced to callers.
//!
//! # Example
//!
//! ```rust
//! use annonce_core::{AnnonceError, Result};
//!
//! fn require_https(url: &str) -> Result<()> {
//!     if !url.starts_with("https://") {
//!         return Err(AnnonceError::InvalidInput("HTTPS required".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;

/// Main error type for extraction operations.
#[derive(Error, Debug)]
pub enum AnnonceError {
    /// The client key exceeded its request quota for the current window.
    #[error("Too many requests, retry after {reset_at}")]
    RateLimited { reset_at: OffsetDateTime },

    /// The URL is missing, malformed or uses a scheme other than HTTPS.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The URL targets a loopback, private, link-local or internal host.
    #[error("Blocked host: {0}")]
    BlockedHost(String),

    /// The provider backing a strategy is not configured.
    #[error("Provider {0} is not configured")]
    ProviderUnavailable(&'static str),

    /// Transport failure reported by a provider or by the direct fetch.
    #[error("Provider {provider} failed: {message}")]
    ProviderError { provider: &'static str, message: String },

    /// A provider call exceeded its timeout.
    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: &'static str, timeout: Duration },

    /// Content was fetched and parsed but too few core fields were found.
    #[error("Only {found} of {required} core fields extracted")]
    ParseInsufficient { found: usize, required: usize },

    /// Every strategy in the tier's order failed.
    #[error("All extraction strategies failed ({})", .tried.join(", "))]
    AllStrategiesExhausted { tried: Vec<&'static str> },

    /// HTTP client errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// HTML could not be queried, usually because of an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// JSON payload errors from a provider response.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected internal fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnnonceError {
    /// HTTP status code a service should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AnnonceError::InvalidInput(_) | AnnonceError::BlockedHost(_) => 400,
            AnnonceError::RateLimited { .. } => 429,
            AnnonceError::AllStrategiesExhausted { .. } | AnnonceError::Timeout { .. } => 502,
            _ => 500,
        }
    }

    /// Soft errors are swallowed at the strategy boundary and advance the chain.
    pub fn is_soft(&self) -> bool {
        match self {
            AnnonceError::ProviderUnavailable(_)
            | AnnonceError::ProviderError { .. }
            | AnnonceError::Timeout { .. }
            | AnnonceError::ParseInsufficient { .. }
            | AnnonceError::HtmlParseError(_)
            | AnnonceError::Json(_) => true,
            #[cfg(feature = "fetch")]
            AnnonceError::HttpError(_) => true,
            _ => false,
        }
    }

    /// Hint shown to the user when every strategy failed or ran out of time.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AnnonceError::AllStrategiesExhausted { .. } | AnnonceError::Timeout { .. } => Some(
                "Use the \"paste content\" tab: copy the listing page text (Ctrl+A, Ctrl+C) and paste it instead.",
            ),
            _ => None,
        }
    }
}

/// Result type alias for AnnonceError.
pub type Result<T> = std::result::Result<T, AnnonceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnnonceError::InvalidInput("not a url".to_string());
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AnnonceError::BlockedHost("localhost".into()).status_code(), 400);
        assert_eq!(AnnonceError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(
            AnnonceError::RateLimited { reset_at: OffsetDateTime::now_utc() }.status_code(),
            429
        );
        assert_eq!(AnnonceError::AllStrategiesExhausted { tried: vec!["direct"] }.status_code(), 502);
        assert_eq!(
            AnnonceError::Timeout { provider: "extraction", timeout: Duration::from_secs(120) }.status_code(),
            502
        );
        assert_eq!(AnnonceError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_soft_errors() {
        assert!(AnnonceError::ProviderUnavailable("crawl").is_soft());
        assert!(AnnonceError::ParseInsufficient { found: 1, required: 2 }.is_soft());
        assert!(AnnonceError::Timeout { provider: "rendering", timeout: Duration::from_secs(45) }.is_soft());
        assert!(!AnnonceError::BlockedHost("10.0.0.1".into()).is_soft());
        assert!(!AnnonceError::AllStrategiesExhausted { tried: vec![] }.is_soft());
    }

    #[test]
    fn test_exhausted_lists_strategies() {
        let err = AnnonceError::AllStrategiesExhausted { tried: vec!["readable", "direct"] };
        assert!(err.to_string().contains("readable, direct"));
        assert!(err.hint().is_some());
    }
}
