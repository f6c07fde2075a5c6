//! AWS SDK implementation of the policy client facade.
//!
//! Each service lives in its own module as raw single-attempt calls on
//! `AwsPolicyClient`. The `PolicyClient` impl below wraps every one of them
//! in the configured `RetryPolicy`.

mod errors;
mod glue;
mod iam;
mod kms;
mod lakeformation;
mod ram;
mod s3;

use crate::client::PolicyClient;
use crate::error::CloudResult;
use crate::retry::RetryPolicy;
use crate::session::SessionManager;
use crate::types::{AccountRef, PermissionGrant, ResourceLink, ResourceShareInvitation};
use async_trait::async_trait;
use lakeshare_policy::PolicyDocument;
use std::sync::Arc;

/// Policy client backed by the AWS SDK, acting as the pivot role of each account.
pub struct AwsPolicyClient {
    sessions: Arc<SessionManager>,
    retry: RetryPolicy,
}

impl AwsPolicyClient {
    pub fn new(sessions: Arc<SessionManager>, retry: RetryPolicy) -> Self {
        Self { sessions, retry }
    }
}

#[async_trait]
impl PolicyClient for AwsPolicyClient {
    // ── Catalog ──

    async fn database_exists(&self, account: &AccountRef, database: &str) -> CloudResult<bool> {
        self.retry
            .run("glue:GetDatabase", move || self.glue_database_exists(account, database))
            .await
    }

    async fn create_database(&self, account: &AccountRef, database: &str) -> CloudResult<()> {
        self.retry
            .run("glue:CreateDatabase", move || self.glue_create_database(account, database))
            .await
    }

    async fn delete_database(&self, account: &AccountRef, database: &str) -> CloudResult<()> {
        self.retry
            .run("glue:DeleteDatabase", move || self.glue_delete_database(account, database))
            .await
    }

    async fn table_exists(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<bool> {
        self.retry
            .run("glue:GetTable", move || {
                self.glue_table_exists(account, database, table)
            })
            .await
    }

    async fn create_resource_link(
        &self,
        account: &AccountRef,
        link: &ResourceLink,
    ) -> CloudResult<()> {
        self.retry
            .run("glue:CreateTable", move || self.glue_create_resource_link(account, link))
            .await
    }

    async fn delete_table(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<()> {
        self.retry
            .run("glue:DeleteTable", move || {
                self.glue_delete_table(account, database, table)
            })
            .await
    }

    // ── Catalog permissions ──

    async fn grant_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        self.retry
            .run("lakeformation:GrantPermissions", move || self.lf_grant(account, grant))
            .await
    }

    async fn revoke_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        self.retry
            .run("lakeformation:RevokePermissions", move || self.lf_revoke(account, grant))
            .await
    }

    // ── Resource shares ──

    async fn list_resource_share_arns(
        &self,
        account: &AccountRef,
        resource_arn: &str,
    ) -> CloudResult<Vec<String>> {
        self.retry
            .run("ram:GetResourceShareAssociations", move || {
                self.ram_list_resource_share_arns(account, resource_arn)
            })
            .await
    }

    async fn delete_resource_share(
        &self,
        account: &AccountRef,
        resource_share_arn: &str,
    ) -> CloudResult<()> {
        self.retry
            .run("ram:DeleteResourceShare", move || {
                self.ram_delete_resource_share(account, resource_share_arn)
            })
            .await
    }


    async fn list_resource_share_invitations(
        &self,
        account: &AccountRef,
    ) -> CloudResult<Vec<ResourceShareInvitation>> {
        self.retry
            .run("ram:GetResourceShareInvitations", move || self.ram_list_invitations(account))
            .await
    }

    async fn accept_resource_share_invitation(
        &self,
        account: &AccountRef,
        invitation_arn: &str,
    ) -> CloudResult<()> {
        self.retry
            .run("ram:AcceptResourceShareInvitation", move || {
                self.ram_accept_invitation(account, invitation_arn)
            })
            .await
    }

    // ── Bucket policy ──

    async fn get_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        self.retry
            .run("s3:GetBucketPolicy", move || self.s3_get_bucket_policy(account, bucket))
            .await
    }

    async fn put_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        self.retry
            .run("s3:PutBucketPolicy", move || {
                self.s3_put_bucket_policy(account, bucket, policy)
            })
            .await
    }

    async fn delete_bucket_policy(&self, account: &AccountRef, bucket: &str) -> CloudResult<()> {
        self.retry
            .run("s3:DeleteBucketPolicy", move || {
                self.s3_delete_bucket_policy(account, bucket)
            })
            .await
    }

    // ── Access points ──

    async fn get_access_point_arn(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<String>> {
        self.retry
            .run("s3:GetAccessPoint", move || self.s3_get_access_point_arn(account, name))
            .await
    }

    async fn create_access_point(
        &self,
        account: &AccountRef,
        bucket: &str,
        name: &str,
    ) -> CloudResult<String> {
        self.retry
            .run("s3:CreateAccessPoint", move || {
                self.s3_create_access_point(account, bucket, name)
            })
            .await
    }

    async fn delete_access_point(&self, account: &AccountRef, name: &str) -> CloudResult<()> {
        self.retry
            .run("s3:DeleteAccessPoint", move || self.s3_delete_access_point(account, name))
            .await
    }

    async fn get_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        self.retry
            .run("s3:GetAccessPointPolicy", move || {
                self.s3_get_access_point_policy(account, name)
            })
            .await
    }

    async fn put_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        self.retry
            .run("s3:PutAccessPointPolicy", move || {
                self.s3_put_access_point_policy(account, name, policy)
            })
            .await
    }

    // ── Keys ──

    async fn get_key_arn(&self, account: &AccountRef, alias: &str) -> CloudResult<Option<String>> {
        self.retry
            .run("kms:DescribeKey", move || self.kms_get_key_arn(account, alias))
            .await
    }

    async fn get_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
    ) -> CloudResult<PolicyDocument> {
        self.retry
            .run("kms:GetKeyPolicy", move || self.kms_get_key_policy(account, key_id))
            .await
    }

    async fn put_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        self.retry
            .run("kms:PutKeyPolicy", move || {
                self.kms_put_key_policy(account, key_id, policy)
            })
            .await
    }

    // ── Roles ──

    async fn get_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        self.retry
            .run("iam:GetRolePolicy", move || {
                self.iam_get_role_policy(account, role_name, policy_name)
            })
            .await
    }

    async fn put_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        self.retry
            .run("iam:PutRolePolicy", move || {
                self.iam_put_role_policy(account, role_name, policy_name, policy)
            })
            .await
    }

    async fn delete_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<()> {
        self.retry
            .run("iam:DeleteRolePolicy", move || {
                self.iam_delete_role_policy(account, role_name, policy_name)
            })
            .await
    }

    async fn get_role_id(&self, account: &AccountRef, role_name: &str) -> CloudResult<String> {
        self.retry
            .run("iam:GetRole", move || self.iam_get_role_id(account, role_name))
            .await
    }
}
