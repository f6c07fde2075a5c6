//! Share items and the cross-share reference checks used for cleanup.

use super::ShareStore;
use super::helpers::{now_millis, optional, parse_column, placeholders};
use crate::error::{StoreError, StoreResult};
use duckdb::{params, params_from_iter, ToSql};
use lakeshare_types::{
    LocationUri, ShareItemStatus, ShareItemUri, ShareItems, ShareObjectItem, ShareUri,
    ShareableItem, ShareableType, TableUri,
};
use tracing::{info, warn};

const ITEM_COLUMNS: &str = "uri, share_uri, item_uri, item_type, item_name, status, resource_name, \
     owner, created_at, updated_at";

fn item_from_row(row: &duckdb::Row<'_>) -> duckdb::Result<ShareObjectItem> {
    Ok(ShareObjectItem {
        uri: ShareItemUri(row.get(0)?),
        share_uri: ShareUri(row.get(1)?),
        item_uri: row.get(2)?,
        item_type: parse_column(row, 3)?,
        item_name: row.get(4)?,
        status: parse_column(row, 5)?,
        resource_name: row.get(6)?,
        owner: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn status_strings(statuses: &[ShareItemStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

impl ShareStore {
    pub fn insert_item(&self, item: &ShareObjectItem) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            &format!("INSERT INTO share_object_items ({ITEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                item.uri.as_str(),
                item.share_uri.as_str(),
                item.item_uri,
                item.item_type.as_str(),
                item.item_name,
                item.status.as_str(),
                item.resource_name,
                item.owner,
                item.created_at,
                item.updated_at,
            ],
        )?;
        info!(share_uri = %item.share_uri, item_uri = %item.item_uri, "Share item added");
        Ok(())
    }

    pub fn get_item(&self, uri: &ShareItemUri) -> StoreResult<ShareObjectItem> {
        let conn = self.lock_conn();
        let item = optional(conn.query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM share_object_items WHERE uri = ?"),
            params![uri.as_str()],
            item_from_row,
        ))?;
        item.ok_or_else(|| StoreError::not_found("share item", uri))
    }

    /// The item of `share` pointing at `item_uri`, if any.
    pub fn find_item(
        &self,
        share_uri: &ShareUri,
        item_uri: &str,
    ) -> StoreResult<Option<ShareObjectItem>> {
        let conn = self.lock_conn();
        let item = optional(conn.query_row(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM share_object_items WHERE share_uri = ? AND item_uri = ? LIMIT 1"
            ),
            params![share_uri.as_str(), item_uri],
            item_from_row,
        ))?;
        Ok(item)
    }

    pub fn list_items(&self, share_uri: &ShareUri) -> StoreResult<Vec<ShareObjectItem>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM share_object_items WHERE share_uri = ? ORDER BY created_at, uri"
        ))?;
        let items = stmt
            .query_map(params![share_uri.as_str()], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn update_item_status(&self, uri: &ShareItemUri, status: ShareItemStatus) -> StoreResult<()> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            "UPDATE share_object_items SET status = ?, updated_at = ? WHERE uri = ?",
            params![status.as_str(), now_millis(), uri.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("share item", uri));
        }
        Ok(())
    }

    /// Record the consumer-side name (resource link or access point) of an item.
    pub fn set_item_resource_name(
        &self,
        uri: &ShareItemUri,
        resource_name: Option<&str>,
    ) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            "UPDATE share_object_items SET resource_name = ?, updated_at = ? WHERE uri = ?",
            params![resource_name, now_millis(), uri.as_str()],
        )?;
        Ok(())
    }

    pub fn delete_item(&self, uri: &ShareItemUri) -> StoreResult<()> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            "DELETE FROM share_object_items WHERE uri = ?",
            params![uri.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("share item", uri));
        }
        Ok(())
    }

    /// Items of `share` in any of `statuses`, resolved to their resources and
    /// partitioned by kind. Items whose resource no longer exists in the
    /// catalog come back in `unresolved`.
    pub fn get_share_items(
        &self,
        share_uri: &ShareUri,
        statuses: &[ShareItemStatus],
    ) -> StoreResult<ShareItems> {
        let items: Vec<ShareObjectItem> = self
            .list_items(share_uri)?
            .into_iter()
            .filter(|item| statuses.contains(&item.status))
            .collect();

        let mut pairs = Vec::with_capacity(items.len());
        let mut unresolved = Vec::new();
        for item in items {
            let resource = match item.item_type {
                ShareableType::Table => self
                    .find_table(&TableUri::from(item.item_uri.as_str()))?
                    .map(ShareableItem::Table),
                ShareableType::StorageLocation => self
                    .find_location(&LocationUri::from(item.item_uri.as_str()))?
                    .map(ShareableItem::StorageLocation),
            };
            match resource {
                Some(resource) => pairs.push((item, resource)),
                None => {
                    warn!(
                        share_uri = %share_uri,
                        item_uri = %item.item_uri,
                        "share item references a missing {}",
                        item.item_type
                    );
                    unresolved.push(item);
                }
            }
        }
        let mut share_items = ShareItems::partition(pairs);
        share_items.unresolved = unresolved;
        Ok(share_items)
    }

    /// Whether `share` has any item in `statuses`, optionally of one kind.
    pub fn has_items(
        &self,
        share_uri: &ShareUri,
        statuses: &[ShareItemStatus],
        item_type: Option<ShareableType>,
    ) -> StoreResult<bool> {
        if statuses.is_empty() {
            return Ok(false);
        }
        let mut sql = format!(
            "SELECT COUNT(*) FROM share_object_items WHERE share_uri = ? AND status IN ({})",
            placeholders(statuses.len())
        );
        let share = share_uri.as_str();
        let status_values = status_strings(statuses);
        let type_value = item_type.map(|t| t.as_str());
        let mut args: Vec<&dyn ToSql> = vec![&share];
        for status in &status_values {
            args.push(status);
        }
        if let Some(ref t) = type_value {
            sql.push_str(" AND item_type = ?");
            args.push(t);
        }

        let conn = self.lock_conn();
        let count: i64 = conn.query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Whether another item, in another share targeting `target_account`,
    /// still holds `table_uri` in a shared status.
    pub fn other_shared_table_in_account(
        &self,
        table_uri: &str,
        target_account: &str,
        exclude_item: &ShareItemUri,
    ) -> StoreResult<bool> {
        let shared = status_strings(ShareItemStatus::SHARED);
        let sql = format!(
            r#"SELECT COUNT(*) FROM share_object_items i
               JOIN share_objects s ON s.uri = i.share_uri
               JOIN environments e ON e.uri = s.target_environment_uri
               WHERE i.item_uri = ? AND e.account_id = ? AND i.uri <> ?
                 AND i.status IN ({})"#,
            placeholders(shared.len())
        );
        let exclude = exclude_item.as_str();
        let mut args: Vec<&dyn ToSql> = vec![&table_uri, &target_account, &exclude];
        for status in &shared {
            args.push(status);
        }

        let conn = self.lock_conn();
        let count: i64 = conn.query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Whether any share other than `exclude_share` still holds a folder of
    /// `bucket` in a shared status.
    pub fn other_shared_folder_in_bucket(
        &self,
        bucket: &str,
        exclude_share: &ShareUri,
    ) -> StoreResult<bool> {
        let shared = status_strings(ShareItemStatus::SHARED);
        let sql = format!(
            r#"SELECT COUNT(*) FROM share_object_items i
               JOIN dataset_locations l ON l.uri = i.item_uri
               WHERE l.s3_bucket_name = ? AND i.share_uri <> ? AND i.item_type = ?
                 AND i.status IN ({})"#,
            placeholders(shared.len())
        );
        let exclude = exclude_share.as_str();
        let folder_type = ShareableType::StorageLocation.as_str();
        let mut args: Vec<&dyn ToSql> = vec![&bucket, &exclude, &folder_type];
        for status in &shared {
            args.push(status);
        }

        let conn = self.lock_conn();
        let count: i64 = conn.query_row(&sql, params_from_iter(args), |row| row.get(0))?;
        Ok(count > 0)
    }
}
