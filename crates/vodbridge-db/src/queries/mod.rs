//! Database query modules.
//!
//! - jobs: job CRUD, partial updates, and title search

pub mod jobs;
