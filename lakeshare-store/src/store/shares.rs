//! Share objects and the share-level queries the engine relies on.

use super::ShareStore;
use super::helpers::{now_millis, optional, parse_column, placeholders};
use crate::error::{StoreError, StoreResult};
use duckdb::{params, params_from_iter};
use lakeshare_types::{
    DatasetUri, EnvironmentUri, GroupUri, ShareData, ShareObject, ShareObjectStatus, ShareUri,
};
use tracing::info;

const SHARE_COLUMNS: &str = "uri, dataset_uri, source_environment_uri, target_environment_uri, \
     principal_id, principal_type, principal_role_name, group_uri, status, owner, created_at, updated_at";

fn share_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<ShareObject> {
    Ok(ShareObject {
        uri: ShareUri(row.get(0)?),
        dataset_uri: DatasetUri(row.get(1)?),
        source_environment_uri: EnvironmentUri(row.get(2)?),
        target_environment_uri: EnvironmentUri(row.get(3)?),
        principal_id: row.get(4)?,
        principal_type: parse_column(row, 5)?,
        principal_role_name: row.get(6)?,
        group_uri: GroupUri(row.get(7)?),
        status: parse_column(row, 8)?,
        owner: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl ShareStore {
    /// Insert a share, refusing a second live share for the same
    /// (dataset, target environment, principal).
    pub fn insert_share(&self, share: &ShareObject) -> StoreResult<()> {
        let conn = self.lock_conn();
        let existing: Option<String> = optional(conn.query_row(
            r#"SELECT uri FROM share_objects
               WHERE dataset_uri = ? AND target_environment_uri = ? AND principal_id = ?
                 AND status <> ?
               LIMIT 1"#,
            params![
                share.dataset_uri.as_str(),
                share.target_environment_uri.as_str(),
                share.principal_id,
                ShareObjectStatus::Deleted.as_str(),
            ],
            |row| row.get(0),
        ))?;
        if let Some(uri) = existing {
            return Err(StoreError::Conflict(format!(
                "share {uri} already exists for dataset {} and principal {} in environment {}",
                share.dataset_uri, share.principal_id, share.target_environment_uri
            )));
        }

        conn.execute(
            &format!(
                "INSERT INTO share_objects ({SHARE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                share.uri.as_str(),
                share.dataset_uri.as_str(),
                share.source_environment_uri.as_str(),
                share.target_environment_uri.as_str(),
                share.principal_id,
                share.principal_type.as_str(),
                share.principal_role_name,
                share.group_uri.as_str(),
                share.status.as_str(),
                share.owner,
                share.created_at,
                share.updated_at,
            ],
        )?;

        info!(share_uri = %share.uri, dataset_uri = %share.dataset_uri, "Share created");
        Ok(())
    }

    pub fn get_share(&self, uri: &ShareUri) -> StoreResult<ShareObject> {
        let conn = self.lock_conn();
        let share = optional(conn.query_row(
            &format!("SELECT {SHARE_COLUMNS} FROM share_objects WHERE uri = ?"),
            params![uri.as_str()],
            share_from_row,
        ))?;
        share.ok_or_else(|| StoreError::not_found("share", uri))
    }

    pub fn update_share_status(&self, uri: &ShareUri, status: ShareObjectStatus) -> StoreResult<()> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            "UPDATE share_objects SET status = ?, updated_at = ? WHERE uri = ?",
            params![status.as_str(), now_millis(), uri.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("share", uri));
        }
        Ok(())
    }

    /// Shares in any of `statuses`, oldest first.
    pub fn list_shares_by_status(
        &self,
        statuses: &[ShareObjectStatus],
    ) -> StoreResult<Vec<ShareObject>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SHARE_COLUMNS} FROM share_objects WHERE status IN ({}) ORDER BY created_at, uri",
            placeholders(statuses.len())
        ))?;
        let shares = stmt
            .query_map(params_from_iter(statuses.iter().map(|s| s.as_str())), share_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shares)
    }

    /// Load a share with its dataset and both environments.
    pub fn get_share_data(&self, uri: &ShareUri) -> StoreResult<ShareData> {
        let share = self.get_share(uri)?;
        let dataset = self.get_dataset(&share.dataset_uri)?;
        let source_environment = self.get_environment(&share.source_environment_uri)?;
        let target_environment = self.get_environment(&share.target_environment_uri)?;
        Ok(ShareData {
            share,
            dataset,
            source_environment,
            target_environment,
        })
    }
}
