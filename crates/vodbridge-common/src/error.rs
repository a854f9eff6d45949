//! Unified error type for vodbridge.
//!
//! Every layer funnels its failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`] and a stable machine-readable [`Error::code`].

use std::fmt;

/// Unified error type covering all failure modes in vodbridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input failed validation (bad or unreachable URL, missing fields).
    #[error("{0}")]
    Validation(String),

    /// Credentials or endpoints are missing from the configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "job").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The conversion service failed, after any internal retries.
    #[error("{0}")]
    Remote(String),

    /// The conversion service is actively working on the video, so a
    /// destructive action was refused.
    #[error("{0}")]
    VideoProcessing(String),

    /// A conflicting resource already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Callback authentication failed. Deliberately carries no detail.
    #[error("Unauthorized")]
    Unauthorized,

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Unauthorized => 401,
            Error::NotFound { .. } => 404,
            Error::Conflict(_) | Error::VideoProcessing(_) => 409,
            Error::Remote(_) => 502,
            Error::Configuration(_) => 503,
            Error::Database { .. } | Error::Internal(_) => 500,
        }
    }

    /// Stable error code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Configuration(_) => "configuration_error",
            Error::NotFound { .. } => "not_found",
            Error::Remote(_) => "remote_error",
            Error::VideoProcessing(_) => "video_processing",
            Error::Conflict(_) => "conflict",
            Error::Unauthorized => "unauthorized",
            Error::Database { .. } => "database_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether the remote service refused because the video is being processed.
    pub fn is_video_processing(&self) -> bool {
        matches!(self, Error::VideoProcessing(_))
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Convenience constructor for [`Error::Remote`].
    pub fn remote(msg: impl Into<String>) -> Self {
        Error::Remote(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
