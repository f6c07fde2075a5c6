//! Failure notifications for share items.

use lakeshare_cloud::Alarm;
use lakeshare_types::{
    DatasetStorageLocation, DatasetTable, ShareData, ShareObjectItem, ShareableType,
};

/// Which half of the lifecycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Share,
    Revoke,
}

impl Phase {
    fn subject_verb(self) -> &'static str {
        match self {
            Phase::Share => "Sharing",
            Phase::Revoke => "Revoking",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Phase::Share => "share",
            Phase::Revoke => "revoke",
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn table_failure(
    envname: &str,
    data: &ShareData,
    table: &DatasetTable,
    shared_database: &str,
    phase: Phase,
    error: &str,
) -> Alarm {
    let subject = format!(
        "ALARM: {envname} Table {} {} Failure Notification",
        table.glue_table_name,
        phase.subject_verb()
    );
    let message = format!(
        "You are receiving this notification because the lakeshare {envname} deployment \
failed to {verb} the table {db}.{name} with Lake Formation.

Alarm Details:
    - State Change:             OK -> ALARM
    - Reason for State Change:  Lake Formation table {verb} failure
    - Timestamp:                {ts}
    - Error:                    {error}

    Share Source
    - Share URI:                {share}
    - Dataset URI:              {dataset}
    - AWS Account:              {src_account}
    - Region:                   {src_region}
    - Glue Database:            {db}
    - Glue Table:               {name}

    Share Target
    - AWS Account:              {tgt_account}
    - Region:                   {tgt_region}
    - Glue Database:            {shared_database}
",
        verb = phase.verb(),
        db = table.glue_database_name,
        name = table.glue_table_name,
        ts = timestamp(),
        share = data.share.uri,
        dataset = data.dataset.uri,
        src_account = data.source_environment.account_id,
        src_region = data.source_environment.region,
        tgt_account = data.target_environment.account_id,
        tgt_region = data.target_environment.region,
    );
    Alarm::new(subject, message)
}

pub fn folder_failure(
    envname: &str,
    data: &ShareData,
    location: &DatasetStorageLocation,
    access_point: &str,
    phase: Phase,
    error: &str,
) -> Alarm {
    let subject = format!(
        "ALARM: {envname} Folder {} {} Failure Notification",
        location.s3_prefix,
        phase.subject_verb()
    );
    let message = format!(
        "You are receiving this notification because the lakeshare {envname} deployment \
failed to {verb} the folder s3://{bucket}/{prefix} through an access point.

Alarm Details:
    - State Change:             OK -> ALARM
    - Reason for State Change:  S3 folder {verb} failure
    - Timestamp:                {ts}
    - Error:                    {error}

    Share Source
    - Share URI:                {share}
    - Dataset URI:              {dataset}
    - AWS Account:              {src_account}
    - Region:                   {src_region}
    - S3 Bucket:                {bucket}
    - S3 Prefix:                {prefix}
    - Access Point:             {access_point}

    Share Target
    - AWS Account:              {tgt_account}
    - Region:                   {tgt_region}
    - Principal Role:           {role}
",
        verb = phase.verb(),
        bucket = location.s3_bucket_name,
        prefix = location.s3_prefix,
        ts = timestamp(),
        share = data.share.uri,
        dataset = data.dataset.uri,
        src_account = data.source_environment.account_id,
        src_region = data.source_environment.region,
        tgt_account = data.target_environment.account_id,
        tgt_region = data.target_environment.region,
        role = data.share.principal_role_name,
    );
    Alarm::new(subject, message)
}

/// Alarm for an item whose table or folder has left the catalog.
pub fn missing_item_failure(
    envname: &str,
    data: &ShareData,
    item: &ShareObjectItem,
    phase: Phase,
    error: &str,
) -> Alarm {
    let (label, kind) = match item.item_type {
        ShareableType::Table => ("Table", "table"),
        ShareableType::StorageLocation => ("Folder", "folder"),
    };
    let subject = format!(
        "ALARM: {envname} {label} {} {} Failure Notification",
        item.item_name,
        phase.subject_verb()
    );
    let message = format!(
        "You are receiving this notification because the lakeshare {envname} deployment \
failed to {verb} the {kind} {name}: it is no longer in the catalog.

Alarm Details:
    - State Change:             OK -> ALARM
    - Reason for State Change:  shared {kind} missing from the catalog
    - Timestamp:                {ts}
    - Error:                    {error}

    Share Source
    - Share URI:                {share}
    - Share Item URI:           {item_uri}
    - Dataset URI:              {dataset}
    - AWS Account:              {src_account}
    - Region:                   {src_region}

    Share Target
    - AWS Account:              {tgt_account}
    - Region:                   {tgt_region}
",
        verb = phase.verb(),
        name = item.item_name,
        ts = timestamp(),
        share = data.share.uri,
        item_uri = item.uri,
        dataset = data.dataset.uri,
        src_account = data.source_environment.account_id,
        src_region = data.source_environment.region,
        tgt_account = data.target_environment.account_id,
        tgt_region = data.target_environment.region,
    );
    Alarm::new(subject, message)
}
