//! Read-mostly producer/consumer records: environments, teams, datasets,
//! tables and storage locations. Owned elsewhere; upserted here so the
//! engine can resolve them.

use super::ShareStore;
use super::helpers::optional;
use crate::error::{StoreError, StoreResult};
use duckdb::params;
use lakeshare_types::{
    Dataset, DatasetStorageLocation, DatasetTable, DatasetUri, Environment, EnvironmentGroup,
    EnvironmentUri, GroupUri, LocationUri, TableUri,
};

impl ShareStore {
    // ── Environments ──

    pub fn put_environment(&self, env: &Environment) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO environments (uri, label, account_id, region, default_role_arn)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                env.uri.as_str(),
                env.label,
                env.account_id,
                env.region,
                env.default_role_arn
            ],
        )?;
        Ok(())
    }

    pub fn get_environment(&self, uri: &EnvironmentUri) -> StoreResult<Environment> {
        let conn = self.lock_conn();
        let env = optional(conn.query_row(
            "SELECT uri, label, account_id, region, default_role_arn FROM environments WHERE uri = ?",
            params![uri.as_str()],
            |row| {
                Ok(Environment {
                    uri: EnvironmentUri(row.get(0)?),
                    label: row.get(1)?,
                    account_id: row.get(2)?,
                    region: row.get(3)?,
                    default_role_arn: row.get(4)?,
                })
            },
        ))?;
        env.ok_or_else(|| StoreError::not_found("environment", uri))
    }

    pub fn put_environment_group(&self, group: &EnvironmentGroup) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO environment_groups (environment_uri, group_uri, role_arn, role_name)
               VALUES (?, ?, ?, ?)"#,
            params![
                group.environment_uri.as_str(),
                group.group_uri.as_str(),
                group.role_arn,
                group.role_name
            ],
        )?;
        Ok(())
    }

    pub fn get_environment_group(
        &self,
        environment_uri: &EnvironmentUri,
        group_uri: &GroupUri,
    ) -> StoreResult<EnvironmentGroup> {
        let conn = self.lock_conn();
        let group = optional(conn.query_row(
            r#"SELECT environment_uri, group_uri, role_arn, role_name FROM environment_groups
               WHERE environment_uri = ? AND group_uri = ?"#,
            params![environment_uri.as_str(), group_uri.as_str()],
            |row| {
                Ok(EnvironmentGroup {
                    environment_uri: EnvironmentUri(row.get(0)?),
                    group_uri: GroupUri(row.get(1)?),
                    role_arn: row.get(2)?,
                    role_name: row.get(3)?,
                })
            },
        ))?;
        group.ok_or_else(|| {
            StoreError::not_found("environment group", format!("{environment_uri}/{group_uri}"))
        })
    }

    // ── Datasets ──

    pub fn put_dataset(&self, dataset: &Dataset) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO datasets (uri, label, environment_uri, account_id, region,
                   glue_database_name, s3_bucket_name, kms_alias, admin_role_arn)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                dataset.uri.as_str(),
                dataset.label,
                dataset.environment_uri.as_str(),
                dataset.account_id,
                dataset.region,
                dataset.glue_database_name,
                dataset.s3_bucket_name,
                dataset.kms_alias,
                dataset.admin_role_arn,
            ],
        )?;
        Ok(())
    }

    pub fn get_dataset(&self, uri: &DatasetUri) -> StoreResult<Dataset> {
        let conn = self.lock_conn();
        let dataset = optional(conn.query_row(
            r#"SELECT uri, label, environment_uri, account_id, region, glue_database_name,
                      s3_bucket_name, kms_alias, admin_role_arn
               FROM datasets WHERE uri = ?"#,
            params![uri.as_str()],
            |row| {
                Ok(Dataset {
                    uri: DatasetUri(row.get(0)?),
                    label: row.get(1)?,
                    environment_uri: EnvironmentUri(row.get(2)?),
                    account_id: row.get(3)?,
                    region: row.get(4)?,
                    glue_database_name: row.get(5)?,
                    s3_bucket_name: row.get(6)?,
                    kms_alias: row.get(7)?,
                    admin_role_arn: row.get(8)?,
                })
            },
        ))?;
        dataset.ok_or_else(|| StoreError::not_found("dataset", uri))
    }

    // ── Tables ──

    pub fn put_table(&self, table: &DatasetTable) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO dataset_tables (uri, dataset_uri, label, glue_database_name, glue_table_name)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                table.uri.as_str(),
                table.dataset_uri.as_str(),
                table.label,
                table.glue_database_name,
                table.glue_table_name
            ],
        )?;
        Ok(())
    }

    pub fn find_table(&self, uri: &TableUri) -> StoreResult<Option<DatasetTable>> {
        let conn = self.lock_conn();
        let table = optional(conn.query_row(
            r#"SELECT uri, dataset_uri, label, glue_database_name, glue_table_name
               FROM dataset_tables WHERE uri = ?"#,
            params![uri.as_str()],
            |row| {
                Ok(DatasetTable {
                    uri: TableUri(row.get(0)?),
                    dataset_uri: DatasetUri(row.get(1)?),
                    label: row.get(2)?,
                    glue_database_name: row.get(3)?,
                    glue_table_name: row.get(4)?,
                })
            },
        ))?;
        Ok(table)
    }

    pub fn get_table(&self, uri: &TableUri) -> StoreResult<DatasetTable> {
        self.find_table(uri)?
            .ok_or_else(|| StoreError::not_found("table", uri))
    }

    // ── Storage locations ──

    pub fn put_location(&self, location: &DatasetStorageLocation) -> StoreResult<()> {
        let conn = self.lock_conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO dataset_locations (uri, dataset_uri, label, s3_bucket_name, s3_prefix)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                location.uri.as_str(),
                location.dataset_uri.as_str(),
                location.label,
                location.s3_bucket_name,
                location.s3_prefix
            ],
        )?;
        Ok(())
    }

    pub fn find_location(&self, uri: &LocationUri) -> StoreResult<Option<DatasetStorageLocation>> {
        let conn = self.lock_conn();
        let location = optional(conn.query_row(
            r#"SELECT uri, dataset_uri, label, s3_bucket_name, s3_prefix
               FROM dataset_locations WHERE uri = ?"#,
            params![uri.as_str()],
            |row| {
                Ok(DatasetStorageLocation {
                    uri: LocationUri(row.get(0)?),
                    dataset_uri: DatasetUri(row.get(1)?),
                    label: row.get(2)?,
                    s3_bucket_name: row.get(3)?,
                    s3_prefix: row.get(4)?,
                })
            },
        ))?;
        Ok(location)
    }

    pub fn get_location(&self, uri: &LocationUri) -> StoreResult<DatasetStorageLocation> {
        self.find_location(uri)?
            .ok_or_else(|| StoreError::not_found("storage location", uri))
    }
}
