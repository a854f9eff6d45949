//! Vodbridge-Common: Shared types, identifiers, and errors.
//!
//! This crate provides common functionality used across vodbridge:
//!
//! - **Typed IDs**: [`JobId`] for the internal row id and [`VideoUuid`] for the
//!   correlation id shared with the conversion service
//! - **Core Types**: [`JobStatus`] with its display labels and formatting helpers
//! - **Text Utilities**: plain-text sanitizing for remote-supplied messages
//! - **Error Handling**: the unified [`Error`] type and [`Result`] alias
//!
//! # Examples
//!
//! ```
//! use vodbridge_common::{Error, JobStatus, Result, VideoUuid};
//!
//! let uuid = VideoUuid::new();
//! let status: JobStatus = "queued".parse().unwrap();
//! assert_eq!(status.label(), "In Queue");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("job", 42))
//! }
//! # let _ = uuid;
//! ```

pub mod error;
pub mod ids;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
