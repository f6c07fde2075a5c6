//! DDL for the share database.

use crate::error::StoreResult;
use duckdb::Connection;

/// Environments: one account/region pair each.
const ENVIRONMENTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS environments (
    uri VARCHAR PRIMARY KEY,
    label VARCHAR NOT NULL,
    account_id VARCHAR NOT NULL,
    region VARCHAR NOT NULL,
    default_role_arn VARCHAR NOT NULL
);
"#;

/// Teams invited to an environment, with their IAM role.
const ENVIRONMENT_GROUPS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS environment_groups (
    environment_uri VARCHAR NOT NULL,
    group_uri VARCHAR NOT NULL,
    role_arn VARCHAR NOT NULL,
    role_name VARCHAR NOT NULL,
    PRIMARY KEY (environment_uri, group_uri)
);
"#;

const DATASETS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS datasets (
    uri VARCHAR PRIMARY KEY,
    label VARCHAR NOT NULL,
    environment_uri VARCHAR NOT NULL,
    account_id VARCHAR NOT NULL,
    region VARCHAR NOT NULL,
    glue_database_name VARCHAR NOT NULL,
    s3_bucket_name VARCHAR NOT NULL,
    kms_alias VARCHAR,
    admin_role_arn VARCHAR NOT NULL
);
"#;

const DATASET_TABLES_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS dataset_tables (
    uri VARCHAR PRIMARY KEY,
    dataset_uri VARCHAR NOT NULL,
    label VARCHAR NOT NULL,
    glue_database_name VARCHAR NOT NULL,
    glue_table_name VARCHAR NOT NULL
);
"#;

const DATASET_LOCATIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS dataset_locations (
    uri VARCHAR PRIMARY KEY,
    dataset_uri VARCHAR NOT NULL,
    label VARCHAR NOT NULL,
    s3_bucket_name VARCHAR NOT NULL,
    s3_prefix VARCHAR NOT NULL
);
"#;

/// Share objects. Never hard-deleted; `Deleted` is a status.
const SHARE_OBJECTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS share_objects (
    uri VARCHAR PRIMARY KEY,
    dataset_uri VARCHAR NOT NULL,
    source_environment_uri VARCHAR NOT NULL,
    target_environment_uri VARCHAR NOT NULL,
    principal_id VARCHAR NOT NULL,
    principal_type VARCHAR NOT NULL,
    principal_role_name VARCHAR NOT NULL,
    group_uri VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    owner VARCHAR NOT NULL,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);
"#;

const SHARE_OBJECT_ITEMS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS share_object_items (
    uri VARCHAR PRIMARY KEY,
    share_uri VARCHAR NOT NULL,
    item_uri VARCHAR NOT NULL,
    item_type VARCHAR NOT NULL,
    item_name VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    resource_name VARCHAR,
    owner VARCHAR NOT NULL,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);
"#;

/// Task queue.
const TASKS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    uri VARCHAR PRIMARY KEY,
    target_uri VARCHAR NOT NULL,
    action VARCHAR NOT NULL,
    payload TEXT NOT NULL DEFAULT '{}',
    status VARCHAR NOT NULL,
    response TEXT,
    error TEXT,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
);
"#;

/// Initialize all share schema tables.
pub fn initialize_share_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(ENVIRONMENTS_DDL)?;
    conn.execute_batch(ENVIRONMENT_GROUPS_DDL)?;
    conn.execute_batch(DATASETS_DDL)?;
    conn.execute_batch(DATASET_TABLES_DDL)?;
    conn.execute_batch(DATASET_LOCATIONS_DDL)?;
    conn.execute_batch(SHARE_OBJECTS_DDL)?;
    conn.execute_batch(SHARE_OBJECT_ITEMS_DDL)?;
    conn.execute_batch(TASKS_DDL)?;
    Ok(())
}
