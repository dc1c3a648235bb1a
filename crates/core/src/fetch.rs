//! Plain HTTP fetching done by the extractor itself.
//!
//! Used by the direct transport and by the image resolver. Every client
//! built here refuses redirects that point at a blocked host, so a public
//! URL cannot bounce the extractor into the internal network.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::gate::is_blocked_host;
use crate::providers::{HttpRequest, PlainHttp, check_status, transport_error};
use crate::{AnnonceError, Result};

const MAX_REDIRECTS: usize = 5;

const PROVIDER: &str = "http";

/// Redirect policy following at most five hops and never into a blocked host.
pub fn guarded_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match attempt.url().host_str() {
            Some(host) if !is_blocked_host(host) => attempt.follow(),
            _ => attempt.error("redirect to blocked host"),
        }
    })
}

/// reqwest-backed [`PlainHttp`] implementation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client sending `user_agent` with the guarded redirect policy.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(guarded_redirect_policy())
            .build()
            .map_err(AnnonceError::HttpError)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PlainHttp for HttpClient {
    async fn get(&self, url: &Url, request: &HttpRequest) -> Result<String> {
        let mut builder = self.client.get(url.clone()).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, request.timeout, e))?;
        let mut response = check_status(PROVIDER, response)?;

        let Some(limit) = request.max_bytes else {
            return response
                .text()
                .await
                .map_err(|e| transport_error(PROVIDER, request.timeout, e));
        };

        // The server may ignore Range; stop reading once the limit is reached.
        let mut body = Vec::with_capacity(limit.min(64 * 1024));
        while body.len() < limit
            && let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| transport_error(PROVIDER, request.timeout, e))?
        {
            let take = chunk.len().min(limit - body.len());
            body.extend_from_slice(&chunk[..take]);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::new(DEFAULT_USER_AGENT).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_provider_error() {
        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        // Port 9 on TEST-NET-1 never answers.
        let url = Url::parse("http://192.0.2.1:9/").unwrap();
        let request = HttpRequest::new(std::time::Duration::from_millis(200));

        let err = client.get(&url, &request).await.unwrap_err();
        assert!(err.is_soft());
    }
}
