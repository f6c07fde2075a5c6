//! Share objects, their items, and the producer/consumer records they point at.

use crate::ids::{
    DatasetUri, EnvironmentUri, GroupUri, LocationUri, ShareItemUri, ShareUri, TableUri,
};
use crate::status::{PrincipalType, ShareItemStatus, ShareObjectStatus, ShareableType};
use serde::{Deserialize, Serialize};

/// An environment: one account/region pair that datasets live in or are shared to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub uri: EnvironmentUri,
    pub label: String,
    pub account_id: String,
    pub region: String,
    /// Role provisioned for the environment itself. Always allowed on shared buckets.
    pub default_role_arn: String,
}

/// A team's presence in an environment, carrying the IAM role that acts for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentGroup {
    pub environment_uri: EnvironmentUri,
    pub group_uri: GroupUri,
    pub role_arn: String,
    pub role_name: String,
}

/// Producer-side dataset: one catalog database plus one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub uri: DatasetUri,
    pub label: String,
    pub environment_uri: EnvironmentUri,
    pub account_id: String,
    pub region: String,
    pub glue_database_name: String,
    pub s3_bucket_name: String,
    /// KMS alias of the bucket key, without the `alias/` prefix. `None` for SSE-S3 buckets.
    pub kms_alias: Option<String>,
    /// Dataset administrator role, always granted access to the bucket.
    pub admin_role_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTable {
    pub uri: TableUri,
    pub dataset_uri: DatasetUri,
    pub label: String,
    pub glue_database_name: String,
    pub glue_table_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStorageLocation {
    pub uri: LocationUri,
    pub dataset_uri: DatasetUri,
    pub label: String,
    pub s3_bucket_name: String,
    pub s3_prefix: String,
}

/// A request to share one dataset's items with one principal in one target environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareObject {
    pub uri: ShareUri,
    pub dataset_uri: DatasetUri,
    pub source_environment_uri: EnvironmentUri,
    pub target_environment_uri: EnvironmentUri,
    /// Group name or consumption-role id, depending on `principal_type`.
    pub principal_id: String,
    pub principal_type: PrincipalType,
    /// IAM role name in the target account that receives access.
    pub principal_role_name: String,
    pub group_uri: GroupUri,
    pub status: ShareObjectStatus,
    pub owner: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One table or storage prefix attached to a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareObjectItem {
    pub uri: ShareItemUri,
    pub share_uri: ShareUri,
    /// Uri of the referenced `DatasetTable` or `DatasetStorageLocation`.
    pub item_uri: String,
    pub item_type: ShareableType,
    pub item_name: String,
    pub status: ShareItemStatus,
    /// Physical name on the consumer side once shared: resource link or access point.
    pub resource_name: Option<String>,
    pub owner: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Resource behind a share item. Resolved once when items are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareableItem {
    Table(DatasetTable),
    StorageLocation(DatasetStorageLocation),
}

impl ShareableItem {
    pub fn item_type(&self) -> ShareableType {
        match self {
            ShareableItem::Table(_) => ShareableType::Table,
            ShareableItem::StorageLocation(_) => ShareableType::StorageLocation,
        }
    }
}

/// Share items partitioned by resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareItems {
    pub tables: Vec<(ShareObjectItem, DatasetTable)>,
    pub folders: Vec<(ShareObjectItem, DatasetStorageLocation)>,
    /// Items whose table or folder is no longer in the catalog.
    pub unresolved: Vec<ShareObjectItem>,
}

impl ShareItems {
    pub fn partition<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ShareObjectItem, ShareableItem)>,
    {
        let mut items = ShareItems::default();
        for (item, resource) in pairs {
            match resource {
                ShareableItem::Table(table) => items.tables.push((item, table)),
                ShareableItem::StorageLocation(folder) => items.folders.push((item, folder)),
            }
        }
        items
    }

    pub fn len(&self) -> usize {
        self.tables.len() + self.folders.len() + self.unresolved.len()
    }

    /// Whether any item of `kind` is present, resolved or not.
    pub fn has_kind(&self, kind: ShareableType) -> bool {
        let resolved = match kind {
            ShareableType::Table => !self.tables.is_empty(),
            ShareableType::StorageLocation => !self.folders.is_empty(),
        };
        resolved || self.unresolved.iter().any(|item| item.item_type == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.folders.is_empty() && self.unresolved.is_empty()
    }
}

/// Everything the orchestrator needs to know about a share before touching any item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    pub share: ShareObject,
    pub dataset: Dataset,
    pub source_environment: Environment,
    pub target_environment: Environment,
}

impl ShareData {
    pub fn is_cross_account(&self) -> bool {
        self.source_environment.account_id != self.target_environment.account_id
    }

    /// ARN of the consumer role that receives access.
    pub fn principal_role_arn(&self) -> String {
        format!(
            "arn:aws:iam::{}:role/{}",
            self.target_environment.account_id, self.share.principal_role_name
        )
    }
}
