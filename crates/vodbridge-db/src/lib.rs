//! Vodbridge-DB: Database schema, migrations, and query operations
//!
//! This crate is the job store for vodbridge, using SQLite with rusqlite and
//! r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use vodbridge_db::models::NewJob;
//! use vodbridge_db::pool::{get_conn, init_pool};
//! use vodbridge_db::queries::jobs;
//! use vodbridge_common::VideoUuid;
//!
//! let pool = init_pool("/var/lib/vodbridge/vodbridge.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let job = jobs::create_job(
//!     &conn,
//!     &NewJob {
//!         uuid: VideoUuid::new(),
//!         title: "Demo".into(),
//!         source_url: "https://example.com/a.mp4".into(),
//!     },
//! )
//! .unwrap();
//! println!("Created job {} ({})", job.id, job.uuid);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
