//! Fallback image lookup.
//!
//! When no strategy produced an image, one extra GET fetches only the start
//! of the page (a byte range) and scans it for a social-preview image. Any
//! failure simply leaves the record without an image.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::ExtractorConfig;
use crate::providers::{HttpRequest, PlainHttp};

static IMAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)<meta[^>]+property=["']og:image(?::secure_url)?["'][^>]+content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+property=["']og:image(?::secure_url)?["']"#,
        r#"(?i)<meta[^>]+name=["']twitter:image(?::src)?["'][^>]+content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+name=["']twitter:image(?::src)?["']"#,
        r#""image"\s*:\s*"(https?://[^"]+)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Scans the head of a page for a preview image, resolving it against `base`.
pub fn find_image(head: &str, base: &Url) -> Option<String> {
    IMAGE_PATTERNS
        .iter()
        .filter_map(|re| re.captures(head).and_then(|c| c.get(1)))
        .filter_map(|m| base.join(m.as_str().trim()).ok())
        .find(|u| matches!(u.scheme(), "http" | "https"))
        .map(String::from)
}

/// Fetches the first `image_byte_limit` bytes of `url` and looks for an image.
pub async fn resolve_image(http: &dyn PlainHttp, url: &Url, config: &ExtractorConfig) -> Option<String> {
    let limit = config.image_byte_limit.max(1);
    let request = HttpRequest::browser(&config.user_agent, config.image_timeout)
        .header("Range", format!("bytes=0-{}", limit - 1))
        .max_bytes(limit);

    match http.get(url, &request).await {
        Ok(head) => find_image(&head, url),
        Err(err) => {
            tracing::debug!(url = %url, error = %err, "image lookup failed");
            None
        }
    }
}
