//! Job lifecycle management.
//!
//! The manager owns every status transition:
//! - Submitting a new video and recording the remote response
//! - Retrying a pending or failed job under its original correlation id
//! - Deleting a job along with its remote queue entry and converted files
//! - Applying status callbacks from the conversion service

use crate::lifecycle::locks::JobLocks;
use crate::lifecycle::probe::UrlProbe;
use crate::lifecycle::view::JobView;
use crate::remote::{ConversionClient, QueueStatus, RemoveOutcome, SubmitResponse};
use rusqlite::Connection;
use std::sync::Arc;
use vodbridge_common::{Error, JobId, JobStatus, Result, VideoUuid};
use vodbridge_db::models::{Job, JobUpdate, NewJob};
use vodbridge_db::pool::{get_conn, DbPool};
use vodbridge_db::queries::jobs;

const NOT_CONFIGURED: &str = "Conversion service is not configured. Check the API key and server URL.";

/// Result of a successful submission or retry.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub job: Job,
    /// Position in the remote queue, if the service reported one.
    pub queue_position: Option<i64>,
    pub message: String,
}

/// Result of a deletion that removed the local record.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub message: String,
    /// The record is gone but converted files may remain on remote storage.
    pub remote_cleanup_failed: bool,
}

/// A status report from the conversion service, already authenticated and
/// normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackUpdate {
    pub status: Option<JobStatus>,
    pub conversion_url: Option<String>,
    pub original_url: Option<String>,
    pub duration: Option<i64>,
    pub error_message: Option<String>,
}

impl From<CallbackUpdate> for JobUpdate {
    fn from(update: CallbackUpdate) -> Self {
        JobUpdate {
            status: update.status,
            conversion_url: update.conversion_url,
            original_url: update.original_url,
            error_message: update.error_message.map(Some),
            duration: update.duration,
        }
    }
}

/// Orchestrates the job store and the conversion service.
pub struct JobManager {
    pool: DbPool,
    client: Option<Arc<dyn ConversionClient>>,
    probe: Arc<dyn UrlProbe>,
    locks: JobLocks,
}

impl JobManager {
    /// Create a manager. Without a client, listing still works but anything
    /// that talks to the conversion service fails with
    /// [`Error::Configuration`].
    pub fn new(
        pool: DbPool,
        client: Option<Arc<dyn ConversionClient>>,
        probe: Arc<dyn UrlProbe>,
    ) -> Self {
        Self {
            pool,
            client,
            probe,
            locks: JobLocks::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Arc<dyn ConversionClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::configuration(NOT_CONFIGURED))
    }

    /// Run `f` with a pooled connection. The connection is returned to the
    /// pool before any await point in the caller.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = get_conn(&self.pool)?;
        f(&conn)
    }

    /// Submit a new video for conversion.
    ///
    /// Validation happens before anything is recorded. Once the job exists
    /// it is kept even if the conversion service rejects it, in which case
    /// the job is marked failed and the error returned.
    pub async fn submit(&self, video_url: &str, title: &str) -> Result<SubmitOutcome> {
        let client = self.client()?;

        let video_url = video_url.trim();
        let title = title.trim();
        if video_url.is_empty() {
            return Err(Error::validation("Video URL is required"));
        }
        if title.is_empty() {
            return Err(Error::validation("Video title is required"));
        }

        self.probe.check(video_url).await?;

        let new = NewJob {
            uuid: VideoUuid::new(),
            title: title.to_string(),
            source_url: video_url.to_string(),
        };
        let job = self.with_conn(|conn| jobs::create_job(conn, &new))?;
        tracing::info!(job_id = %job.id, uuid = %job.uuid, "Created job");

        let _lock = self.locks.acquire(job.uuid).await;
        let outcome = self.dispatch(&**client, &job).await?;

        Ok(SubmitOutcome {
            message: submitted_message("Video submitted successfully!", outcome.queue_position),
            ..outcome
        })
    }

    /// Resubmit a pending or failed job, reusing its id and correlation id.
    pub async fn retry(&self, id: JobId) -> Result<SubmitOutcome> {
        let uuid = self.with_conn(|conn| jobs::get_job(conn, id))?.uuid;
        let client = self.client()?;
        let _lock = self.locks.acquire(uuid).await;

        // Re-read under the lock; a callback may have moved it on.
        let job = self.with_conn(|conn| jobs::get_job(conn, id))?;
        if !job.status.is_retryable() {
            return Err(Error::validation(format!(
                "Only pending or failed videos can be retried (current status: {})",
                job.status.label()
            )));
        }

        self.with_conn(|conn| {
            jobs::update_job(
                conn,
                id,
                &JobUpdate {
                    status: Some(JobStatus::Pending),
                    error_message: Some(None),
                    ..Default::default()
                },
            )
        })?;
        tracing::info!(job_id = %id, %uuid, "Retrying job");

        let outcome = self.dispatch(&**client, &job).await?;
        Ok(SubmitOutcome {
            message: submitted_message("Video retry submitted successfully!", outcome.queue_position),
            ..outcome
        })
    }

    /// Send the job to the conversion service and record the response.
    /// Caller holds the job lock.
    async fn dispatch(&self, client: &dyn ConversionClient, job: &Job) -> Result<SubmitOutcome> {
        let response = match client.submit(&job.source_url, job.uuid).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(job_id = %job.id, uuid = %job.uuid, error = %e, "Submission failed");
                self.with_conn(|conn| jobs::update_job(conn, job.id, &JobUpdate::failed(e.to_string())))?;
                return Err(e);
            }
        };

        if let Some(status) = status_after_submit(&response, job.uuid) {
            self.with_conn(|conn| jobs::update_job(conn, job.id, &JobUpdate::status(status)))?;
        }

        let job = self.with_conn(|conn| jobs::get_job(conn, job.id))?;
        tracing::info!(job_id = %job.id, status = %job.status, "Job accepted by conversion service");

        Ok(SubmitOutcome {
            job,
            queue_position: response.queue_position,
            message: String::new(),
        })
    }

    /// Delete a job, first withdrawing it from the remote queue or removing
    /// its converted files as appropriate.
    ///
    /// If the service reports the video is being processed, nothing is
    /// deleted and [`Error::VideoProcessing`] is returned.
    pub async fn delete(&self, id: JobId) -> Result<DeleteOutcome> {
        let uuid = self.with_conn(|conn| jobs::get_job(conn, id))?.uuid;
        let client = self.client()?;
        let _lock = self.locks.acquire(uuid).await;
        let job = self.with_conn(|conn| jobs::get_job(conn, id))?;

        if !job.status.is_terminal() {
            match client.remove_from_queue(uuid).await {
                Ok(RemoveOutcome::Removed(_)) => {
                    tracing::debug!(job_id = %id, %uuid, "Removed from remote queue");
                }
                Ok(RemoveOutcome::NotSupported) => {
                    tracing::debug!(job_id = %id, %uuid, "Remote queue removal not supported");
                }
                Err(e) if e.is_video_processing() => return Err(e),
                Err(e) => {
                    tracing::warn!(job_id = %id, %uuid, error = %e, "Failed to remove from remote queue");
                }
            }
        }

        let mut remote_cleanup_failed = false;
        if job.status == JobStatus::Completed && job.conversion_url.is_some() {
            match client.delete_remote_asset(uuid).await {
                Ok(_) => {
                    tracing::debug!(job_id = %id, %uuid, "Deleted converted files");
                }
                Err(e) if e.is_video_processing() => return Err(e),
                Err(e) => {
                    tracing::warn!(job_id = %id, %uuid, error = %e, "Failed to delete converted files");
                    remote_cleanup_failed = true;
                }
            }
        }

        self.with_conn(|conn| jobs::delete_job(conn, id))?;
        tracing::info!(job_id = %id, %uuid, "Deleted job");

        let message = if remote_cleanup_failed {
            "Video removed from database but there was an error deleting converted files"
        } else {
            "Video deleted successfully"
        };
        Ok(DeleteOutcome {
            message: message.to_string(),
            remote_cleanup_failed,
        })
    }

    /// Apply a callback to the job with `uuid`.
    ///
    /// Returns `false` when no job matches; that is not an error, since the
    /// service may report on videos this instance has already deleted.
    pub async fn apply_callback(&self, uuid: VideoUuid, update: CallbackUpdate) -> Result<bool> {
        let _lock = self.locks.acquire(uuid).await;

        let update = JobUpdate::from(update);
        let matched = self.with_conn(|conn| jobs::update_job_by_uuid(conn, uuid, &update))?;

        if matched {
            tracing::info!(%uuid, status = ?update.status.as_ref().map(JobStatus::as_str), "Applied status callback");
        } else {
            tracing::info!(%uuid, "Callback for unknown video ignored");
        }
        Ok(matched)
    }

    /// List jobs newest first, optionally filtered by title.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<JobView>> {
        let jobs = self.with_conn(|conn| jobs::search_jobs(conn, search))?;
        Ok(jobs.iter().map(JobView::from).collect())
    }

    pub fn get(&self, id: JobId) -> Result<Job> {
        self.with_conn(|conn| jobs::get_job(conn, id))
    }

    /// Current state of the remote queue.
    pub async fn queue_status(&self) -> Result<QueueStatus> {
        self.client()?.queue_status().await
    }
}

/// Status implied by the service's reply, if any.
fn status_after_submit(response: &SubmitResponse, uuid: VideoUuid) -> Option<JobStatus> {
    if response.is_processing(uuid) {
        Some(JobStatus::Downloading)
    } else if response.queue_position.is_some() {
        Some(JobStatus::Queued)
    } else {
        None
    }
}

fn submitted_message(base: &str, queue_position: Option<i64>) -> String {
    match queue_position {
        Some(position) => format!("{base} Video was added to the queue at position #{position}"),
        None => base.to_string(),
    }
}
