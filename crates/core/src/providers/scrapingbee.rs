//! ScrapingBee client: remote headless Chrome with optional premium proxies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{RenderingProvider, check_status, transport_error};
use crate::site::TransportOptions;
use crate::{AnnonceError, Result};

const PROVIDER: &str = "rendering";
const API_ENDPOINT: &str = "https://app.scrapingbee.com/api/v1/";

/// Rendering provider backed by ScrapingBee.
#[derive(Debug, Clone)]
pub struct ScrapingBeeClient {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl ScrapingBeeClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build().map_err(AnnonceError::HttpError)?;
        Ok(Self { client, api_key: api_key.into(), timeout })
    }

    fn query(&self, url: &Url, options: &TransportOptions) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("api_key", self.api_key.clone()),
            ("url", url.to_string()),
            ("render_js", options.render_js.to_string()),
        ];
        if options.premium_proxy {
            query.push(("premium_proxy", "true".to_string()));
        }
        if let Some(country) = &options.country {
            query.push(("country_code", country.clone()));
        }
        if options.render_js && !options.wait.is_zero() {
            query.push(("wait", options.wait.as_millis().to_string()));
        }
        query
    }
}

#[async_trait]
impl RenderingProvider for ScrapingBeeClient {
    async fn render(&self, url: &Url, options: &TransportOptions) -> Result<String> {
        let response = self
            .client
            .get(API_ENDPOINT)
            .query(&self.query(url, options))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        check_status(PROVIDER, response)?
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))
    }
}
