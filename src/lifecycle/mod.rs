//! Job lifecycle: submission, retry, deletion, and callback reconciliation.

mod locks;
mod manager;
pub mod probe;
mod view;

pub use locks::{JobLockGuard, JobLocks};
pub use manager::{CallbackUpdate, DeleteOutcome, JobManager, SubmitOutcome};
pub use probe::{HttpUrlProbe, UrlProbe};
pub use view::JobView;
