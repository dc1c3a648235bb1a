//! Route handlers for the extraction API.

use std::any::Any;

use annonce_core::{AnnonceError, ErrorResponse, ExtractionRequest, ProviderAvailability, retry_after_secs};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};

use crate::app::AppState;

/// Body of `POST /api/annonces/extract`.
#[derive(Debug, Deserialize)]
pub struct ExtractBody {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    started_at: String,
    providers: ProviderAvailability,
}

/// Rate-limit key of the caller.
///
/// Priority:
/// 1. first `X-Forwarded-For` entry
/// 2. `X-Real-IP`
/// 3. `"unknown"`
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

/// Maps a pipeline error to its status code and JSON body.
pub fn error_response(err: &AnnonceError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match status {
        StatusCode::INTERNAL_SERVER_ERROR => error!(error = %err, "extraction failed"),
        StatusCode::BAD_GATEWAY => warn!(error = %err, "no strategy produced a listing"),
        _ => debug!(error = %err, "request rejected"),
    }

    let mut response = (status, Json(ErrorResponse::from(err))).into_response();
    if let AnnonceError::RateLimited { reset_at } = err {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(*reset_at)));
    }
    response
}

/// Answers a panicking handler with a 500 body instead of a dropped connection.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());
    error_response(&AnnonceError::Internal(detail))
}

/// `POST /api/annonces/extract`
pub async fn extract_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ExtractBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let message = format!("Invalid input: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response();
        }
    };

    let request = ExtractionRequest::new(body.url, client_key(&headers));
    let outcome = tokio::time::timeout(state.request_timeout, state.extractor.extract(&request))
        .await
        .unwrap_or_else(|_| Err(AnnonceError::Timeout { provider: "extraction", timeout: state.request_timeout }));
    match outcome {
        Ok(response) => {
            info!(
                url = %request.url,
                source = response.source,
                method = %response.method,
                fields = response.fields_extracted,
                "listing extracted"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.format(&Rfc3339).unwrap_or_default(),
        providers: state.extractor.availability(),
    })
}
