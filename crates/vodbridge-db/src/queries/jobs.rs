//! Job store operations.

use chrono::{SecondsFormat, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, ErrorCode};
use vodbridge_common::{Error, JobId, JobStatus, Result, VideoUuid};

use crate::models::{Job, JobUpdate, NewJob, JOB_COLS};

/// Fixed-width RFC 3339 so lexical order matches chronological order.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Record a new job in `pending`.
///
/// Fails with [`Error::Conflict`] if the uuid is already taken.
pub fn create_job(conn: &Connection, new: &NewJob) -> Result<Job> {
    let now = now_timestamp();

    conn.execute(
        "INSERT INTO videos (uuid, video_url, title, status, duration, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
        rusqlite::params![
            new.uuid.to_string(),
            &new.source_url,
            &new.title,
            JobStatus::Pending.as_str(),
            &now
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref f, _) if f.code == ErrorCode::ConstraintViolation => {
            Error::Conflict(format!("job with uuid {} already exists", new.uuid))
        }
        other => Error::database(other.to_string()),
    })?;

    let id = JobId::from(conn.last_insert_rowid());
    get_job(conn, id)
}

/// Get a job by id.
pub fn get_job(conn: &Connection, id: JobId) -> Result<Job> {
    let q = format!("SELECT {JOB_COLS} FROM videos WHERE id = ?1");
    conn.query_row(&q, [id.get()], Job::from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("job", id),
            _ => Error::database(e.to_string()),
        })
}

/// Get a job by its correlation id.
pub fn get_job_by_uuid(conn: &Connection, uuid: VideoUuid) -> Result<Job> {
    let q = format!("SELECT {JOB_COLS} FROM videos WHERE uuid = ?1");
    conn.query_row(&q, [uuid.to_string()], Job::from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::not_found("job", uuid),
            _ => Error::database(e.to_string()),
        })
}

/// Apply a partial update to the job with the given id.
///
/// Returns `false` if no row matched. `updated_at` is always refreshed.
pub fn update_job(conn: &Connection, id: JobId, update: &JobUpdate) -> Result<bool> {
    apply_update(conn, "id", Box::new(id.get()), update)
}

/// Apply a partial update to the job with the given correlation id.
pub fn update_job_by_uuid(conn: &Connection, uuid: VideoUuid, update: &JobUpdate) -> Result<bool> {
    apply_update(conn, "uuid", Box::new(uuid.to_string()), update)
}

fn apply_update(
    conn: &Connection,
    key_col: &str,
    key: Box<dyn ToSql>,
    update: &JobUpdate,
) -> Result<bool> {
    let mut sets: Vec<&str> = Vec::new();
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(ref status) = update.status {
        sets.push("status = ?");
        params_vec.push(Box::new(status.as_str().to_string()));
    }
    if let Some(ref url) = update.conversion_url {
        sets.push("conversion_url = ?");
        params_vec.push(Box::new(url.clone()));
    }
    if let Some(ref url) = update.original_url {
        sets.push("original_url = ?");
        params_vec.push(Box::new(url.clone()));
    }
    if let Some(ref message) = update.error_message {
        sets.push("error_message = ?");
        params_vec.push(Box::new(message.clone()));
    }
    if let Some(duration) = update.duration {
        sets.push("duration = ?");
        params_vec.push(Box::new(duration));
    }
    sets.push("updated_at = ?");
    params_vec.push(Box::new(now_timestamp()));
    params_vec.push(key);

    let q = format!("UPDATE videos SET {} WHERE {key_col} = ?", sets.join(", "));
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let n = conn
        .execute(&q, params_refs.as_slice())
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a job by id.
pub fn delete_job(conn: &Connection, id: JobId) -> Result<()> {
    let n = conn
        .execute("DELETE FROM videos WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    if n == 0 {
        return Err(Error::not_found("job", id));
    }
    Ok(())
}

/// List jobs newest first, optionally filtered by a title substring.
///
/// The filter is matched literally (`%` and `_` carry no special meaning).
/// SQLite's LIKE folds case for ASCII letters only.
pub fn search_jobs(conn: &Connection, search: Option<&str>) -> Result<Vec<Job>> {
    let filter = search.map(str::trim).filter(|s| !s.is_empty());

    let (q, params_vec): (String, Vec<Box<dyn ToSql>>) = match filter {
        Some(term) => (
            format!(
                "SELECT {JOB_COLS} FROM videos WHERE title LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC, id DESC"
            ),
            vec![Box::new(format!("%{}%", escape_like(term)))],
        ),
        None => (
            format!("SELECT {JOB_COLS} FROM videos ORDER BY created_at DESC, id DESC"),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), Job::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
