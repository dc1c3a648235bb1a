//! Firecrawl client (`/v1/scrape`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{CrawlMetadata, CrawlOptions, CrawlPage, CrawlProvider, check_status, transport_error};
use crate::{AnnonceError, Result};

const PROVIDER: &str = "crawl-render";
const API_ENDPOINT: &str = "https://api.firecrawl.dev/v1/scrape";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 2],
    only_main_content: bool,
    wait_for: u64,
    timeout: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeData {
    markdown: Option<String>,
    raw_html: Option<String>,
    html: Option<String>,
    #[serde(default)]
    metadata: ScrapeMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    title: Option<String>,
    description: Option<String>,
    og_image: Option<String>,
}

/// Crawl provider backed by Firecrawl.
#[derive(Debug, Clone)]
pub struct FirecrawlClient {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build().map_err(AnnonceError::HttpError)?;
        Ok(Self { client, api_key: api_key.into(), timeout })
    }
}

#[async_trait]
impl CrawlProvider for FirecrawlClient {
    async fn crawl(&self, url: &Url, options: &CrawlOptions) -> Result<CrawlPage> {
        // The service gets its own budget, a little under ours.
        let service_timeout = self.timeout.saturating_sub(Duration::from_secs(5)).max(options.wait);
        let body = ScrapeRequest {
            url: url.as_str(),
            formats: ["markdown", "rawHtml"],
            only_main_content: true,
            wait_for: options.wait.as_millis() as u64,
            timeout: service_timeout.as_millis() as u64,
        };

        let response = self
            .client
            .post(API_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;
        let text = check_status(PROVIDER, response)?
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        parse_scrape_response(&text)
    }
}

fn parse_scrape_response(body: &str) -> Result<CrawlPage> {
    let response: ScrapeResponse = serde_json::from_str(body)?;
    let data = match response.data {
        Some(data) if response.success => data,
        _ => {
            return Err(AnnonceError::ProviderError {
                provider: PROVIDER,
                message: response.error.unwrap_or_else(|| "scrape unsuccessful".to_string()),
            });
        }
    };

    Ok(CrawlPage {
        markdown: data.markdown.unwrap_or_default(),
        html: data.raw_html.or(data.html),
        metadata: CrawlMetadata {
            title: data.metadata.title,
            description: data.metadata.description,
            image: data.metadata.og_image,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = ScrapeRequest {
            url: "https://www.leboncoin.fr/ad/ventes_immobilieres/1",
            formats: ["markdown", "rawHtml"],
            only_main_content: true,
            wait_for: 3000,
            timeout: 15000,
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["onlyMainContent"], true);
        assert_eq!(json["waitFor"], 3000);
        assert_eq!(json["formats"][1], "rawHtml");
    }

    #[test]
    fn test_successful_response() {
        let body = r##"{"success": true, "data": {
            "markdown": "# Maison 4 pièces\n\n95 m² - 320 000 €",
            "rawHtml": "<html><head><title>Maison</title></head></html>",
            "metadata": {"title": "Maison 4 pièces", "ogImage": "https://img.example.com/m.jpg", "statusCode": 200}
        }}"##;
        let page = parse_scrape_response(body).unwrap();

        assert!(page.markdown.contains("95 m²"));
        assert!(page.html.unwrap().contains("<title>Maison</title>"));
        assert_eq!(page.metadata.title.as_deref(), Some("Maison 4 pièces"));
        assert_eq!(page.metadata.image.as_deref(), Some("https://img.example.com/m.jpg"));
    }

    #[test]
    fn test_unsuccessful_response() {
        let err = parse_scrape_response(r#"{"success": false, "error": "blocked"}"#).unwrap_err();
        assert!(err.to_string().contains("blocked"));
        assert!(err.is_soft());
    }

    #[test]
    fn test_malformed_response_is_soft() {
        let err = parse_scrape_response("<html>gateway error</html>").unwrap_err();
        assert!(matches!(err, AnnonceError::Json(_)));
        assert!(err.is_soft());
    }
}
