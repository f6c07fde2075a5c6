//! DuckDB-backed metadata store for lakeshare.
//!
//! Holds the share objects and share items the engine mutates, the
//! read-mostly producer/consumer records it reads (environments, teams,
//! datasets, tables, storage locations), and the task queue consumed by
//! workers. All of it lives in a single database file.

mod error;
mod schema;
mod store;

pub use error::{StoreError, StoreResult};
pub use schema::initialize_share_schema;
pub use store::ShareStore;

/// Open a DuckDB connection with WAL recovery.
///
/// A crash can leave a WAL file DuckDB refuses to replay. When the first open
/// fails and a WAL is present, it is removed and the open retried once.
pub fn open_share_db(path: &std::path::Path) -> StoreResult<duckdb::Connection> {
    match duckdb::Connection::open(path) {
        Ok(conn) => Ok(conn),
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                tracing::warn!(
                    "share db open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    return duckdb::Connection::open(path).map_err(Into::into);
                }
            }
            Err(first_err.into())
        }
    }
}
