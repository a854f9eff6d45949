//! Client for the remote conversion service.
//!
//! All requests carry the `X-API-Key-Hash` header and a bounded timeout.
//! Submissions and remote deletes are retried with linear backoff; queue
//! removal and queue status are single attempts.

pub mod auth;
mod client;
pub mod retry;
pub mod types;

pub use auth::{api_key_hash, verify_api_key_hash, API_KEY_HASH_HEADER};
pub use client::{ConversionClient, HttpConversionClient};
pub use retry::{AttemptError, RetryPolicy};
pub use types::*;
