//! Shared fixtures for store tests.

#![allow(dead_code)]

use lakeshare_store::ShareStore;
use lakeshare_types::*;

pub const PRODUCER: &str = "111111111111";
pub const CONSUMER: &str = "222222222222";

pub fn environment(uri: &str, account: &str) -> Environment {
    Environment {
        uri: EnvironmentUri::from(uri),
        label: uri.to_string(),
        account_id: account.to_string(),
        region: "eu-west-1".to_string(),
        default_role_arn: format!("arn:aws:iam::{account}:role/{uri}-default"),
    }
}

pub fn dataset(uri: &str, env: &str, bucket: &str) -> Dataset {
    Dataset {
        uri: DatasetUri::from(uri),
        label: uri.to_string(),
        environment_uri: EnvironmentUri::from(env),
        account_id: PRODUCER.to_string(),
        region: "eu-west-1".to_string(),
        glue_database_name: format!("{uri}_db"),
        s3_bucket_name: bucket.to_string(),
        kms_alias: None,
        admin_role_arn: format!("arn:aws:iam::{PRODUCER}:role/{uri}-admin"),
    }
}

pub fn table(uri: &str, dataset_uri: &str) -> DatasetTable {
    DatasetTable {
        uri: TableUri::from(uri),
        dataset_uri: DatasetUri::from(dataset_uri),
        label: uri.to_string(),
        glue_database_name: format!("{dataset_uri}_db"),
        glue_table_name: uri.to_string(),
    }
}

pub fn location(uri: &str, dataset_uri: &str, bucket: &str) -> DatasetStorageLocation {
    DatasetStorageLocation {
        uri: LocationUri::from(uri),
        dataset_uri: DatasetUri::from(dataset_uri),
        label: uri.to_string(),
        s3_bucket_name: bucket.to_string(),
        s3_prefix: uri.to_string(),
    }
}

pub fn share(uri: &str, dataset_uri: &str, target_env: &str, principal: &str) -> ShareObject {
    ShareObject {
        uri: ShareUri::from(uri),
        dataset_uri: DatasetUri::from(dataset_uri),
        source_environment_uri: EnvironmentUri::from("producer"),
        target_environment_uri: EnvironmentUri::from(target_env),
        principal_id: principal.to_string(),
        principal_type: PrincipalType::Group,
        principal_role_name: format!("{principal}-role"),
        group_uri: GroupUri::from(principal),
        status: ShareObjectStatus::Draft,
        owner: "alice".to_string(),
        created_at: 1,
        updated_at: 1,
    }
}

pub fn item(
    uri: &str,
    share_uri: &str,
    item_uri: &str,
    item_type: ShareableType,
    status: ShareItemStatus,
) -> ShareObjectItem {
    ShareObjectItem {
        uri: ShareItemUri::from(uri),
        share_uri: ShareUri::from(share_uri),
        item_uri: item_uri.to_string(),
        item_type,
        item_name: item_uri.to_string(),
        status,
        resource_name: None,
        owner: "alice".to_string(),
        created_at: 1,
        updated_at: 1,
    }
}

/// Store with a producer and a consumer environment, one dataset
/// (`ds1`, bucket `sales-bucket`) with tables `t1`, `t2` and folders `f1`, `f2`.
pub fn seeded_store() -> ShareStore {
    let store = ShareStore::open_in_memory().unwrap();
    store.put_environment(&environment("producer", PRODUCER)).unwrap();
    store.put_environment(&environment("consumer", CONSUMER)).unwrap();
    store.put_environment(&environment("consumer2", CONSUMER)).unwrap();
    store.put_dataset(&dataset("ds1", "producer", "sales-bucket")).unwrap();
    store.put_table(&table("t1", "ds1")).unwrap();
    store.put_table(&table("t2", "ds1")).unwrap();
    store.put_location(&location("f1", "ds1", "sales-bucket")).unwrap();
    store.put_location(&location("f2", "ds1", "sales-bucket")).unwrap();
    store
}
