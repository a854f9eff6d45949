//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vodbridge_common::{JobId, JobStatus, VideoUuid};

/// Column list matching [`Job::from_row`].
pub(crate) const JOB_COLS: &str = "id, uuid, title, video_url, status, conversion_url,
    original_url, error_message, duration, created_at, updated_at";

fn parse_uuid(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<VideoUuid> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// A conversion job, one row of the `videos` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub uuid: VideoUuid,
    pub title: String,
    pub source_url: String,
    pub status: JobStatus,
    pub conversion_url: Option<String>,
    pub original_url: Option<String>,
    pub error_message: Option<String>,
    /// Media duration in seconds, 0 when unknown.
    pub duration: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: JobId::from(row.get::<_, i64>(0)?),
            uuid: parse_uuid(row, 1)?,
            title: row.get(2)?,
            source_url: row.get(3)?,
            status: JobStatus::from(row.get::<_, String>(4)?),
            conversion_url: row.get(5)?,
            original_url: row.get(6)?,
            error_message: row.get(7)?,
            duration: row.get(8)?,
            created_at: parse_timestamp(row, 9)?,
            updated_at: parse_timestamp(row, 10)?,
        })
    }
}

/// Fields supplied when a job is first recorded. Everything else starts at
/// its default (`pending`, no URLs, zero duration).
#[derive(Debug, Clone)]
pub struct NewJob {
    pub uuid: VideoUuid,
    pub title: String,
    pub source_url: String,
}

/// Partial update of a job. `None` leaves the column untouched.
///
/// `error_message` is doubly optional so it can be explicitly cleared:
/// `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub conversion_url: Option<String>,
    pub original_url: Option<String>,
    pub error_message: Option<Option<String>>,
    pub duration: Option<i64>,
}

impl JobUpdate {
    /// Update that only sets the status.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Mark the job failed with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error_message: Some(Some(reason.into())),
            ..Default::default()
        }
    }
}
