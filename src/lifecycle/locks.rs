//! Per-job async locks keyed by correlation id.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vodbridge_common::VideoUuid;

/// Serializes state transitions for a single job.
///
/// Entries are created on demand and removed once the last holder or waiter
/// lets go, so the map only contains jobs with a transition in flight.
#[derive(Default)]
pub struct JobLocks {
    locks: Arc<DashMap<VideoUuid, Arc<Mutex<()>>>>,
}

/// Held while a transition runs. Dropping it releases the lock.
pub struct JobLockGuard {
    uuid: VideoUuid,
    locks: Arc<DashMap<VideoUuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the job with `uuid`.
    pub async fn acquire(&self, uuid: VideoUuid) -> JobLockGuard {
        let mutex = self
            .locks
            .entry(uuid)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;

        JobLockGuard {
            uuid,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of jobs with a held or awaited lock.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for JobLockGuard {
    fn drop(&mut self) {
        // Release first so the strong count reflects only the map entry and
        // any waiters still holding a clone.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.uuid, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
