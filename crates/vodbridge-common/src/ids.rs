//! Typed ID wrappers.
//!
//! A job carries two identities: the store-assigned [`JobId`] used by callers,
//! and the [`VideoUuid`] correlation id shared with the conversion service.
//! Keeping them as distinct types prevents passing one where the other is
//! expected.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned identifier of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(i64);

impl JobId {
    /// Raw integer value, as stored in the database.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<JobId> for i64 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation id shared with the conversion service and used in callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoUuid(Uuid);

impl VideoUuid {
    /// Generate a new random correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VideoUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for VideoUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<VideoUuid> for Uuid {
    fn from(id: VideoUuid) -> Self {
        id.0
    }
}

impl FromStr for VideoUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl std::fmt::Display for VideoUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
