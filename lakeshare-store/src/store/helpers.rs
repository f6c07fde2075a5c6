//! Shared helper functions for share store operations.

use duckdb::types::Type;
use lakeshare_types::ParseError;
use std::str::FromStr;

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Read a text column and parse it into a status-like enum.
pub(crate) fn parse_column<T>(row: &duckdb::Row<'_>, idx: usize) -> duckdb::Result<T>
where
    T: FromStr<Err = ParseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `?, ?, ?` with `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Map `QueryReturnedNoRows` to `None`.
pub(crate) fn optional<T>(result: duckdb::Result<T>) -> duckdb::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
