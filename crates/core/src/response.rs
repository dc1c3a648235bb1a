//! Response bodies of the extraction operation.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::AnnonceError;
use crate::orchestrator::Extraction;
use crate::record::ExtractedRecord;
use crate::site::SiteClassification;
use crate::strategy::{StrategyKind, StrategyOutcome};

/// Body of a successful extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub success: bool,
    /// Portal id, or `"web"` for unknown hosts.
    pub source: &'static str,
    pub data: ExtractedRecord,
    pub fields_extracted: usize,
    pub method: StrategyKind,
    pub message: String,
    #[serde(skip)]
    pub outcomes: Vec<StrategyOutcome>,
}

impl ExtractionResponse {
    pub fn new(classification: &SiteClassification, extraction: Extraction) -> Self {
        let fields_extracted = extraction.record.fields_extracted();
        let source = classification.source_label();
        Self {
            success: true,
            source,
            fields_extracted,
            method: extraction.strategy,
            message: format!("{} fields extracted from {}", fields_extracted, source),
            data: extraction.record,
            outcomes: extraction.outcomes,
        }
    }
}

/// Body of a failed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    /// RFC 3339 end of the rate-limit window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: false, error: message.into(), hint: None, reset_at: None }
    }
}

impl From<&AnnonceError> for ErrorResponse {
    fn from(err: &AnnonceError) -> Self {
        // Internal details stay in the logs.
        let message = match err {
            AnnonceError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        let reset_at = match err {
            AnnonceError::RateLimited { reset_at } => reset_at.format(&Rfc3339).ok(),
            _ => None,
        };
        Self { success: false, error: message, hint: err.hint(), reset_at }
    }
}

/// Whole seconds until `reset_at`, for a `Retry-After` header.
pub fn retry_after_secs(reset_at: OffsetDateTime) -> u64 {
    let remaining = (reset_at - OffsetDateTime::now_utc()).whole_seconds();
    remaining.max(1) as u64
}
