//! Core job types shared across vodbridge.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Spelling of `uploading_original` used by older conversion servers. It is
/// stored as reported and only labelled like its canonical form.
const LEGACY_UPLOADING_ORIGINAL: &str = "uploading-original";

/// Lifecycle status of a job.
///
/// The conversion service drives most transitions through callbacks and may
/// introduce statuses this crate does not know about. Those are kept verbatim
/// in [`JobStatus::Other`] rather than rejected, so parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Queued,
    Downloading,
    UploadingOriginal,
    Converting,
    Uploading,
    Completed,
    Failed,
    /// A status string reported by the conversion service that is not one of
    /// the known states.
    Other(String),
}

impl JobStatus {
    /// Canonical string form, as stored in the database.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::UploadingOriginal => "uploading_original",
            JobStatus::Converting => "converting",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(s) => s,
        }
    }

    /// Human-readable label. Unknown statuses are displayed as-is.
    pub fn label(&self) -> &str {
        match self {
            // older conversion servers report the hyphenated spelling
            JobStatus::Other(s) if s == LEGACY_UPLOADING_ORIGINAL => "Uploading Original Video",
            JobStatus::Pending => "Pending",
            JobStatus::Queued => "In Queue",
            JobStatus::Downloading => "Downloading",
            JobStatus::UploadingOriginal => "Uploading Original Video",
            JobStatus::Converting => "Converting to HLS",
            JobStatus::Uploading => "Uploading to Storage",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Other(s) => s,
        }
    }

    /// `completed` and `failed` are terminal; nothing is queued remotely.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Only `pending` and `failed` jobs may be resubmitted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Failed)
    }
}

impl FromStr for JobStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => JobStatus::Pending,
            "queued" => JobStatus::Queued,
            "downloading" => JobStatus::Downloading,
            "uploading_original" => JobStatus::UploadingOriginal,
            "converting" => JobStatus::Converting,
            "uploading" => JobStatus::Uploading,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        })
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a media duration for display: `-` when unknown, `MM:SS` below one
/// hour, `HH:MM:SS` otherwise.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "-".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
