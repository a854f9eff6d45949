//! Inbound status callbacks from the conversion service.
//!
//! A callback is authenticated by the `X-API-Key-Hash` header, parsed into a
//! [`CallbackUpdate`], and handed to the [`JobManager`]. Callbacks for
//! unknown videos are acknowledged without effect, so the service can
//! safely redeliver.

use crate::lifecycle::{CallbackUpdate, JobManager};
use crate::remote::types::value_as_i64;
use crate::remote::{verify_api_key_hash, API_KEY_HASH_HEADER};
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;
use vodbridge_common::text::sanitize_text;
use vodbridge_common::{Error, JobStatus, Result, VideoUuid};

/// Body returned for every accepted callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackAck {
    pub success: bool,
}

/// Authenticates and applies status callbacks.
pub struct CallbackReceiver {
    manager: Arc<JobManager>,
    api_key: Option<String>,
    public_url_base: Option<String>,
}

impl CallbackReceiver {
    /// Without an API key every callback is rejected.
    pub fn new(
        manager: Arc<JobManager>,
        api_key: Option<String>,
        public_url_base: Option<String>,
    ) -> Self {
        Self {
            manager,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            public_url_base: public_url_base.filter(|b| !b.trim().is_empty()),
        }
    }

    /// Handle one callback request.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if the digest header is missing or wrong
    /// - [`Error::Validation`] if the body is not a JSON object carrying
    ///   `video_uuid` and `status`
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<CallbackAck> {
        self.authenticate(headers)?;

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| Error::validation(format!("Invalid JSON payload: {e}")))?;
        let fields = payload
            .as_object()
            .ok_or_else(|| Error::validation("Invalid JSON payload: expected an object"))?;

        let (raw_uuid, update) = self.parse(fields)?;

        let uuid = match raw_uuid.parse::<VideoUuid>() {
            Ok(uuid) => uuid,
            Err(_) => {
                tracing::info!(video_uuid = raw_uuid, "Callback for unrecognised video id ignored");
                return Ok(CallbackAck { success: true });
            }
        };

        self.manager.apply_callback(uuid, update).await?;
        Ok(CallbackAck { success: true })
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<()> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("Rejecting callback: no API key configured");
            return Err(Error::Unauthorized);
        };

        let provided = headers
            .get(API_KEY_HASH_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Rejecting callback: missing {} header", API_KEY_HASH_HEADER);
                Error::Unauthorized
            })?;

        if !verify_api_key_hash(api_key, provided) {
            tracing::warn!("Rejecting callback: API key hash mismatch");
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    fn parse<'a>(&self, fields: &'a Map<String, Value>) -> Result<(&'a str, CallbackUpdate)> {
        let required = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| Error::validation("Invalid parameters: video_uuid and status are required"))
        };

        let raw_uuid = required("video_uuid")?;
        let status = JobStatus::from(required("status")?.to_string());

        let url_field = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|url| match self.public_url_base.as_deref() {
                    Some(base) => rewrite_public_url(base, url),
                    None => url.to_string(),
                })
        };

        let error_message = match (&status, fields.get("error")) {
            (JobStatus::Failed, Some(Value::String(s))) => Some(sanitize_text(s)),
            (JobStatus::Failed, Some(Value::Null)) | (_, None) => None,
            (JobStatus::Failed, Some(other)) => Some(sanitize_text(&other.to_string())),
            _ => None,
        };

        let update = CallbackUpdate {
            conversion_url: url_field("conversion_url"),
            original_url: url_field("original_url"),
            duration: fields.get("duration").and_then(value_as_i64),
            error_message,
            status: Some(status),
        };

        Ok((raw_uuid.trim(), update))
    }
}

/// Replace scheme and host of `url` with `base`, keeping only the path.
///
/// The path is copied exactly as it appears in `url`: no percent-encoding and
/// no `.`/`..` resolution. Query strings and fragments are dropped, and a URL
/// with no path becomes the bare base. Anything that is neither an absolute
/// URL nor an absolute path is returned unchanged.
pub fn rewrite_public_url(base: &str, url: &str) -> String {
    let base = base.trim_end_matches('/');

    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => {
            let after_authority = url
                .find("://")
                .map(|i| &url[i + 3..])
                .and_then(|rest| rest.find('/').map(|slash| (rest, slash)))
                .filter(|(rest, slash)| !rest[..*slash].contains(['?', '#']))
                .map_or("", |(rest, slash)| &rest[slash..]);
            format!("{}{}", base, strip_query(after_authority))
        }
        Ok(_) => url.to_string(),
        Err(_) if url.starts_with('/') => format!("{}{}", base, strip_query(url)),
        Err(_) => url.to_string(),
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_preserves_path() {
        assert_eq!(
            rewrite_public_url("https://r2.example.com", "https://origin/x/y.mp4"),
            "https://r2.example.com/x/y.mp4"
        );
        assert_eq!(
            rewrite_public_url("https://cdn.example.com/", "https://bucket.s3.amazonaws.com/videos/a/master.m3u8"),
            "https://cdn.example.com/videos/a/master.m3u8"
        );
    }

    #[test]
    fn test_rewrite_drops_query_and_fragment() {
        assert_eq!(
            rewrite_public_url("https://cdn.example.com", "https://s3.example.com/a/b.m3u8?X-Amz-Signature=abc#t=1"),
            "https://cdn.example.com/a/b.m3u8"
        );
    }

    #[test]
    fn test_rewrite_relative_path() {
        assert_eq!(
            rewrite_public_url("https://cdn.example.com", "/a/b.mp4?x=1"),
            "https://cdn.example.com/a/b.mp4"
        );
    }

    #[test]
    fn test_rewrite_keeps_raw_path() {
        assert_eq!(
            rewrite_public_url("https://cdn.example.com", "https://origin/videos/my clip/../a%20b.mp4"),
            "https://cdn.example.com/videos/my clip/../a%20b.mp4"
        );
        assert_eq!(
            rewrite_public_url("https://cdn.example.com/", "https://origin.example.com"),
            "https://cdn.example.com"
        );
        assert_eq!(
            rewrite_public_url("https://cdn.example.com", "https://origin.example.com?x=1"),
            "https://cdn.example.com"
        );
    }

    #[test]
    fn test_rewrite_unparseable_kept() {
        assert_eq!(rewrite_public_url("https://cdn.example.com", "not a url"), "not a url");
        assert_eq!(
            rewrite_public_url("https://cdn.example.com", "mailto:ops@example.com"),
            "mailto:ops@example.com"
        );
    }
}
