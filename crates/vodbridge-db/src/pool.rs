//! r2d2 pool over the SQLite job store.
//!
//! Every connection gets a busy timeout; migrations run once when the pool
//! is built.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use vodbridge_common::{Error, Result};

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const POOL_SIZE: u32 = 4;

/// Open (or create) the job store at `db_path` and bring its schema up to
/// date.
///
/// ```no_run
/// use vodbridge_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/vodbridge/vodbridge.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

    build_pool(manager)
}

/// Initialize an in-memory database pool for testing.
///
/// Every connection in the pool shares one named in-memory database, which
/// lives until the pool is dropped. Each call creates a fresh, isolated
/// database.
///
/// # Example
///
/// ```
/// use vodbridge_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let uri = format!("file:vodbridge-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let manager = SqliteConnectionManager::file(uri)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

    build_pool(manager)
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)?;

    Ok(pool)
}

/// Check out a connection, reporting pool exhaustion as a database error.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}
