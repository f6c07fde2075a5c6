//! The policy client facade.
//!
//! Every method is one idempotent remote operation against one account. The
//! sharing engine depends only on this trait, so tests substitute an
//! in-memory implementation.

use crate::error::CloudResult;
use crate::types::{AccountRef, PermissionGrant, ResourceLink, ResourceShareInvitation};
use async_trait::async_trait;
use lakeshare_policy::PolicyDocument;

#[async_trait]
pub trait PolicyClient: Send + Sync {
    // ── Catalog ──

    async fn database_exists(&self, account: &AccountRef, database: &str) -> CloudResult<bool>;

    /// Creates a database. Succeeds if it already exists.
    async fn create_database(&self, account: &AccountRef, database: &str) -> CloudResult<()>;

    /// Deletes a database. Succeeds if it is already gone.
    async fn delete_database(&self, account: &AccountRef, database: &str) -> CloudResult<()>;

    async fn table_exists(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<bool>;

    /// Creates a resource link. Succeeds if it already exists.
    async fn create_resource_link(
        &self,
        account: &AccountRef,
        link: &ResourceLink,
    ) -> CloudResult<()>;

    /// Deletes a table or resource link. Succeeds if it is already gone.
    async fn delete_table(&self, account: &AccountRef, database: &str, table: &str)
    -> CloudResult<()>;

    // ── Catalog permissions ──

    async fn grant_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()>;

    /// Revokes permissions. Revoking a grant that does not exist is a no-op.
    async fn revoke_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()>;

    // ── Resource shares ──

    /// Resource shares owned by `account` that hold the resource with
    /// `resource_arn`.
    async fn list_resource_share_arns(
        &self,
        account: &AccountRef,
        resource_arn: &str,
    ) -> CloudResult<Vec<String>>;

    /// Deleting a share that no longer exists succeeds.
    async fn delete_resource_share(
        &self,
        account: &AccountRef,
        resource_share_arn: &str,
    ) -> CloudResult<()>;


    async fn list_resource_share_invitations(
        &self,
        account: &AccountRef,
    ) -> CloudResult<Vec<ResourceShareInvitation>>;

    async fn accept_resource_share_invitation(
        &self,
        account: &AccountRef,
        invitation_arn: &str,
    ) -> CloudResult<()>;

    // ── Bucket policy ──

    async fn get_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
    ) -> CloudResult<Option<PolicyDocument>>;

    async fn put_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()>;

    async fn delete_bucket_policy(&self, account: &AccountRef, bucket: &str) -> CloudResult<()>;

    // ── Access points ──

    async fn get_access_point_arn(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<String>>;

    /// Creates an access point on `bucket` and returns its ARN.
    async fn create_access_point(
        &self,
        account: &AccountRef,
        bucket: &str,
        name: &str,
    ) -> CloudResult<String>;

    async fn delete_access_point(&self, account: &AccountRef, name: &str) -> CloudResult<()>;

    async fn get_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<PolicyDocument>>;

    async fn put_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()>;

    // ── Keys ──

    /// Resolves `alias/<alias>` to the key ARN. `None` if the alias does not exist.
    async fn get_key_arn(&self, account: &AccountRef, alias: &str) -> CloudResult<Option<String>>;

    async fn get_key_policy(&self, account: &AccountRef, key_id: &str)
    -> CloudResult<PolicyDocument>;

    async fn put_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()>;

    // ── Roles ──

    async fn get_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<Option<PolicyDocument>>;

    async fn put_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()>;

    async fn delete_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<()>;

    /// Stable unique id of a role (`AROA...`), used in `aws:userId` conditions.
    async fn get_role_id(&self, account: &AccountRef, role_name: &str) -> CloudResult<String>;
}
