use crate::config::Config;
use crate::remote::auth::{api_key_hash, API_KEY_HASH_HEADER};
use crate::remote::retry::{AttemptError, RetryPolicy};
use crate::remote::types::{
    parse_body, ConvertRequest, QueueStatus, RemoteAck, RemoveOutcome, SubmitResponse, VideoRef,
};
use reqwest::{header, Client, Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use vodbridge_common::{Error, Result, VideoUuid};

/// Default per-request timeout for the conversion service
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PROCESSING_CANNOT_REMOVE: &str =
    "Video is currently being processed and cannot be removed from queue";
const PROCESSING_CANNOT_DELETE: &str = "Video is currently being processed and cannot be deleted";

/// Operations offered by the remote conversion service.
///
/// Implementations hold no job state; every call is independent.
#[async_trait::async_trait]
pub trait ConversionClient: Send + Sync {
    /// Ask the service to convert `source_url`, tagged with `uuid`.
    async fn submit(&self, source_url: &str, uuid: VideoUuid) -> Result<SubmitResponse>;

    /// Drop a video from the remote queue. Not retried.
    async fn remove_from_queue(&self, uuid: VideoUuid) -> Result<RemoveOutcome>;

    /// Delete converted files from remote storage.
    async fn delete_remote_asset(&self, uuid: VideoUuid) -> Result<RemoteAck>;

    /// Current state of the remote queue. Not retried.
    async fn queue_status(&self) -> Result<QueueStatus>;
}

/// [`ConversionClient`] speaking JSON over HTTP.
pub struct HttpConversionClient {
    client: Client,
    base_url: String,
    key_hash: String,
    site_url: String,
    callback_url: String,
    public_url_base: Option<String>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpConversionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConversionClient")
            .field("base_url", &self.base_url)
            .field("key_hash", &"<redacted>")
            .field("site_url", &self.site_url)
            .field("callback_url", &self.callback_url)
            .field("public_url_base", &self.public_url_base)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpConversionClient {
    /// Create a client for the service at `server_url`.
    ///
    /// Fails with [`Error::Configuration`] when either the URL or the key is
    /// blank.
    pub fn new(server_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if server_url.trim().is_empty() {
            return Err(Error::configuration("remote server URL is not set"));
        }
        if api_key.trim().is_empty() {
            return Err(Error::configuration("remote API key is not set"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: server_url.trim().trim_end_matches('/').to_string(),
            key_hash: api_key_hash(api_key),
            site_url: String::new(),
            callback_url: String::new(),
            public_url_base: None,
            retry: RetryPolicy::default(),
        })
    }

    /// Build a client from the `[remote]` and `[server]` config sections.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = &config.remote;
        let server_url = remote
            .server_url()
            .ok_or_else(|| Error::configuration("remote server URL is not set"))?;
        let api_key = remote
            .api_key()
            .ok_or_else(|| Error::configuration("remote API key is not set"))?;

        let timeout = match remote.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        };

        Ok(Self::new(server_url, api_key, timeout)?
            .with_site(config.site_url(), config.callback_url())
            .with_public_url_base(remote.public_url_base().map(String::from))
            .with_retry_policy(RetryPolicy::new(
                remote.max_attempts,
                Duration::from_secs(remote.retry_delay_secs),
            )))
    }

    /// Site and callback URLs announced with each submission.
    pub fn with_site(mut self, site_url: impl Into<String>, callback_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self.callback_url = callback_url.into();
        self
    }

    pub fn with_public_url_base(mut self, base: Option<String>) -> Self {
        self.public_url_base = base;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request. Transport failures come back as their error text.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<(StatusCode, Vec<u8>), String> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(API_KEY_HASH_HEADER, &self.key_hash)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "Calling conversion service");
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(%method, path, %status, error = %e, "Failed to read response body");
                Vec::new()
            }
        };
        Ok((status, bytes))
    }
}

fn status_error(status: StatusCode) -> String {
    format!("Server returned status code: {}", status.as_u16())
}

/// A 409 whose body says the service is working on the video.
fn is_processing_conflict(status: StatusCode, body: &[u8]) -> bool {
    status == StatusCode::CONFLICT && parse_body::<RemoteAck>(body).is_processing == Some(true)
}

#[async_trait::async_trait]
impl ConversionClient for HttpConversionClient {
    async fn submit(&self, source_url: &str, uuid: VideoUuid) -> Result<SubmitResponse> {
        let request = ConvertRequest {
            video_url: source_url,
            video_uuid: uuid,
            callback_url: &self.callback_url,
            site_url: &self.site_url,
            public_url_base: self.public_url_base.as_deref(),
            upload_original: true,
        };
        let request = &request;

        let response = self
            .retry
            .run("submit", move |_| async move {
                let (status, body) = self
                    .send(Method::POST, "/api/convert", Some(request))
                    .await
                    .map_err(AttemptError::Transient)?;

                if status != StatusCode::OK {
                    return Err(AttemptError::Transient(status_error(status)));
                }
                Ok(parse_body::<SubmitResponse>(&body))
            })
            .await?;

        tracing::info!(
            %uuid,
            queue_position = ?response.queue_position,
            currently_processing = ?response.currently_processing,
            "Video submitted to conversion service"
        );
        Ok(response)
    }

    async fn remove_from_queue(&self, uuid: VideoUuid) -> Result<RemoveOutcome> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/remove-from-queue",
                Some(&VideoRef { video_uuid: uuid }),
            )
            .await
            .map_err(Error::Remote)?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%uuid, "Conversion service does not support queue removal");
            return Ok(RemoveOutcome::NotSupported);
        }
        if is_processing_conflict(status, &body) {
            return Err(Error::VideoProcessing(PROCESSING_CANNOT_REMOVE.to_string()));
        }
        if status != StatusCode::OK {
            return Err(Error::Remote(status_error(status)));
        }

        Ok(RemoveOutcome::Removed(parse_body(&body)))
    }

    async fn delete_remote_asset(&self, uuid: VideoUuid) -> Result<RemoteAck> {
        let request = VideoRef { video_uuid: uuid };
        let request = &request;

        self.retry
            .run("delete", move |_| async move {
                let (status, body) = self
                    .send(Method::POST, "/api/delete", Some(request))
                    .await
                    .map_err(AttemptError::Transient)?;

                if is_processing_conflict(status, &body) {
                    return Err(AttemptError::Fatal(Error::VideoProcessing(
                        PROCESSING_CANNOT_DELETE.to_string(),
                    )));
                }
                if status != StatusCode::OK {
                    return Err(AttemptError::Transient(status_error(status)));
                }
                Ok(parse_body::<RemoteAck>(&body))
            })
            .await
    }

    async fn queue_status(&self) -> Result<QueueStatus> {
        let (status, body) = self
            .send::<()>(Method::GET, "/api/queue-status", None)
            .await
            .map_err(Error::Remote)?;

        if status != StatusCode::OK {
            return Err(Error::Remote(status_error(status)));
        }
        Ok(parse_body(&body))
    }
}
