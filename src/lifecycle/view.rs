use chrono::{DateTime, Utc};
use serde::Serialize;
use vodbridge_common::{format_duration, JobId, JobStatus, VideoUuid};
use vodbridge_db::models::Job;

const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Job as presented to API callers, with display-ready labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub uuid: VideoUuid,
    pub title: String,
    pub video_url: String,
    pub status: JobStatus,
    pub status_label: String,
    pub duration: i64,
    pub duration_formatted: String,
    pub created_at: String,
    pub updated_at: String,
    pub conversion_url: Option<String>,
    pub original_url: Option<String>,
    pub error_message: Option<String>,
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            uuid: job.uuid,
            title: job.title.clone(),
            video_url: job.source_url.clone(),
            status: job.status.clone(),
            status_label: job.status.label().to_string(),
            duration: job.duration,
            duration_formatted: format_duration(job.duration),
            created_at: format_date(&job.created_at),
            updated_at: format_date(&job.updated_at),
            conversion_url: job.conversion_url.clone(),
            original_url: job.original_url.clone(),
            error_message: job.error_message.clone(),
        }
    }
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self::from(&job)
    }
}
