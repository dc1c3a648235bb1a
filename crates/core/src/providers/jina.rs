//! Jina reader client (`r.jina.ai`).
//!
//! The reader works without a key; a key only raises the rate limit. JSON
//! output is requested so the page title, description and images come back
//! alongside the text. A plain-text body is accepted as well.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{ReadableContent, ReadableContentProvider, check_status, transport_error};
use crate::{AnnonceError, Result};

const PROVIDER: &str = "readable-content";
const READER_ENDPOINT: &str = "https://r.jina.ai/";

#[derive(Debug, Deserialize)]
struct ReaderEnvelope {
    data: ReaderData,
}

#[derive(Debug, Deserialize)]
struct ReaderData {
    #[serde(default)]
    content: String,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Value,
}

/// Readable-content provider backed by the Jina reader.
#[derive(Debug, Clone)]
pub struct JinaReader {
    client: Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl JinaReader {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build().map_err(AnnonceError::HttpError)?;
        Ok(Self { client, api_key, timeout })
    }
}

#[async_trait]
impl ReadableContentProvider for JinaReader {
    async fn read(&self, url: &Url) -> Result<ReadableContent> {
        let mut request = self
            .client
            .get(format!("{}{}", READER_ENDPOINT, url))
            .timeout(self.timeout)
            .header("Accept", "application/json")
            .header("X-Return-Format", "text")
            .header("X-With-Images-Summary", "true");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;
        let body = check_status(PROVIDER, response)?
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        Ok(parse_reader_body(&body))
    }
}

fn parse_reader_body(body: &str) -> ReadableContent {
    match serde_json::from_str::<ReaderEnvelope>(body) {
        Ok(envelope) => ReadableContent {
            content: envelope.data.content,
            title: envelope.data.title.filter(|t| !t.trim().is_empty()),
            description: envelope.data.description.filter(|d| !d.trim().is_empty()),
            images: image_urls(&envelope.data.images),
        },
        Err(_) => ReadableContent { content: body.to_string(), ..Default::default() },
    }
}

/// Images come back either as a list or as a caption-to-URL map.
fn image_urls(images: &Value) -> Vec<String> {
    let values: Vec<&Value> = match images {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter_map(Value::as_str)
        .filter(|u| u.starts_with("http"))
        .map(str::to_string)
        .collect()
}
