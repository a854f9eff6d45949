//! Reachability check for submitted video URLs.

use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;
use url::Url;
use vodbridge_common::{Error, Result};

/// Default timeout for the HEAD probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Statuses that count as reachable. Redirects are accepted without being
/// followed.
const ACCEPTED: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::PARTIAL_CONTENT,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
];

/// Decides whether a source URL is worth submitting.
#[async_trait::async_trait]
pub trait UrlProbe: Send + Sync {
    /// Succeeds when the URL is well-formed and reachable; otherwise fails
    /// with [`Error::Validation`].
    async fn check(&self, url: &str) -> Result<()>;
}

/// Probe issuing a header-only request to the video host.
pub struct HttpUrlProbe {
    client: Client,
}

impl HttpUrlProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn check(&self, url: &str) -> Result<()> {
        let parsed = validate_url_format(url)?;

        let response = self.client.head(parsed).send().await.map_err(|e| {
            tracing::debug!(url, error = %e, "Video URL probe failed");
            Error::validation("Video URL is not accessible")
        })?;

        let status = response.status();
        if !ACCEPTED.contains(&status) {
            return Err(Error::validation(format!(
                "Video URL returned HTTP error: {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}

/// Require an absolute http(s) URL with a host.
pub fn validate_url_format(url: &str) -> Result<Url> {
    let invalid = || Error::validation("Invalid video URL format");

    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_valid_urls() {
        assert!(validate_url_format("https://videos.example.com/a.mp4").is_ok());
        assert!(validate_url_format("http://10.0.0.5:8000/clip.mov?sig=abc").is_ok());
        assert!(validate_url_format("  https://example.com/a.mp4 ").is_ok());
    }

    #[test]
    fn test_invalid_urls() {
        for url in ["", "not a url", "ftp://example.com/a.mp4", "file:///etc/passwd", "https://"] {
            assert_matches!(validate_url_format(url), Err(Error::Validation(_)), "{url}");
        }
    }

    #[test]
    fn test_invalid_message() {
        let err = validate_url_format("example.com/a.mp4").unwrap_err();
        assert_eq!(err.to_string(), "Invalid video URL format");
    }
}
