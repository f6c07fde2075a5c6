//! Types shared between the facade trait and its implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog pseudo-principal holding the legacy "everyone via IAM" grant.
pub const IAM_ALLOWED_PRINCIPALS: &str = "IAM_ALLOWED_PRINCIPALS";

/// Account/region pair a call is made against. Credentials are those of the
/// pivot role in `account_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub account_id: String,
    pub region: String,
}

impl AccountRef {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.region)
    }
}

/// Catalog permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LfPermission {
    All,
    Alter,
    CreateTable,
    Describe,
    Drop,
    Select,
}

impl LfPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            LfPermission::All => "ALL",
            LfPermission::Alter => "ALTER",
            LfPermission::CreateTable => "CREATE_TABLE",
            LfPermission::Describe => "DESCRIBE",
            LfPermission::Drop => "DROP",
            LfPermission::Select => "SELECT",
        }
    }
}

/// Catalog resource a permission applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LfResource {
    Database {
        catalog_id: String,
        name: String,
    },
    Table {
        catalog_id: String,
        database: String,
        name: String,
    },
}

impl LfResource {
    pub fn database(catalog_id: impl Into<String>, name: impl Into<String>) -> Self {
        LfResource::Database {
            catalog_id: catalog_id.into(),
            name: name.into(),
        }
    }

    pub fn table(
        catalog_id: impl Into<String>,
        database: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        LfResource::Table {
            catalog_id: catalog_id.into(),
            database: database.into(),
            name: name.into(),
        }
    }

    /// Glue ARN of the resource, as resource shares reference it.
    pub fn glue_arn(&self, region: &str) -> String {
        match self {
            LfResource::Database { catalog_id, name } => {
                format!("arn:aws:glue:{region}:{catalog_id}:database/{name}")
            }
            LfResource::Table {
                catalog_id,
                database,
                name,
            } => format!("arn:aws:glue:{region}:{catalog_id}:table/{database}/{name}"),
        }
    }
}

impl fmt::Display for LfResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LfResource::Database { catalog_id, name } => write!(f, "{catalog_id}:{name}"),
            LfResource::Table {
                catalog_id,
                database,
                name,
            } => write!(f, "{catalog_id}:{database}.{name}"),
        }
    }
}

/// One grant or revoke request: a principal, a resource, and permission sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Role ARN, account id, or `IAM_ALLOWED_PRINCIPALS`.
    pub principal: String,
    pub resource: LfResource,
    pub permissions: Vec<LfPermission>,
    pub grantable: Vec<LfPermission>,
}

impl PermissionGrant {
    pub fn new(
        principal: impl Into<String>,
        resource: LfResource,
        permissions: &[LfPermission],
    ) -> Self {
        Self {
            principal: principal.into(),
            resource,
            permissions: permissions.to_vec(),
            grantable: Vec::new(),
        }
    }

    pub fn with_grant_option(mut self, grantable: &[LfPermission]) -> Self {
        self.grantable = grantable.to_vec();
        self
    }
}

/// A catalog entry in the consumer account that aliases a producer table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLink {
    pub database: String,
    pub name: String,
    pub target_catalog_id: String,
    pub target_database: String,
    pub target_table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl InvitationStatus {
    pub fn from_str_value(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(InvitationStatus::Pending),
            "ACCEPTED" => Some(InvitationStatus::Accepted),
            "REJECTED" => Some(InvitationStatus::Rejected),
            "EXPIRED" => Some(InvitationStatus::Expired),
            _ => None,
        }
    }
}

/// A cross-account resource-share invitation as seen by the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceShareInvitation {
    pub arn: String,
    pub status: InvitationStatus,
    pub sender_account_id: String,
    pub receiver_account_id: String,
    pub resource_share_arn: String,
    pub resource_share_name: String,
}

impl ResourceShareInvitation {
    /// Catalog grants arrive as shares named `LakeFormation-...`.
    pub fn is_catalog_share(&self) -> bool {
        self.resource_share_name.starts_with("LakeFormation")
    }
}
