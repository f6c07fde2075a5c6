//! Share store: thread-safe DuckDB wrapper with modular operations.

mod catalog;
pub(crate) mod helpers;
mod items;
mod shares;
mod tasks;

use crate::error::StoreResult;
use crate::schema::initialize_share_schema;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Thread-safe store for share metadata and tasks, backed by DuckDB.
#[derive(Clone)]
pub struct ShareStore {
    conn: Arc<Mutex<Connection>>,
}

impl ShareStore {
    /// Open (or create) the share database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = crate::open_share_db(path)?;
        initialize_share_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory share database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_share_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Acquire the connection lock, recovering from poison if a prior
    /// holder panicked.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("share store recovering from poisoned mutex");
            poisoned.into_inner()
        })
    }

    /// Flush the WAL into the database file.
    pub fn checkpoint(&self) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute_batch("CHECKPOINT")?;
        Ok(())
    }
}
