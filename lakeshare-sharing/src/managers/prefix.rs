//! Storage prefix sharing through access points.
//!
//! One access point per (dataset, principal). Each shared prefix adds one
//! entry to that principal's two statements in the access point policy:
//! - `<roleId>0` lists the bucket, constrained by `s3:prefix`
//! - `<roleId>1` reads objects under `<apArn>/object/<prefix>/*`
//!
//! The bucket policy delegates access control to access points and keeps
//! an admin escape hatch. The consumer role gets an inline policy naming the
//! bucket and the access point, and encrypted buckets get a `kms:Decrypt`
//! statement keyed by the role id.

use super::ShareManager;
use crate::alarms::{self, Phase};
use crate::context::SharingContext;
use crate::error::{ShareError, ShareResult};
use async_trait::async_trait;
use lakeshare_cloud::{AccountRef, Alarm};
use lakeshare_policy::{Principal, Statement, Upsert, ValueList};
use lakeshare_types::{DatasetStorageLocation, ShareData, ShareObjectItem, ShareableType};
use tracing::{debug, info};

const MAX_ACCESS_POINT_NAME_LEN: usize = 50;

const ADMIN_SID: &str = "AllowAllToAdmin";
const DELEGATE_SID: &str = "DelegateAccessToAccessPoint";
const IAM_S3_SID: &str = "S3AccessPointAccess";
const IAM_KMS_SID: &str = "KmsKeyAccess";

const STRING_LIKE: &str = "StringLike";
const STRING_EQUALS: &str = "StringEquals";
const USER_ID: &str = "aws:userId";
const S3_PREFIX: &str = "s3:prefix";

/// Access point name for a (dataset, principal) pair: lowercase, only
/// `[a-z0-9-]`, at most 50 characters.
pub fn access_point_name(dataset_uri: &str, principal_id: &str) -> String {
    format!("{dataset_uri}-{principal_id}")
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_ACCESS_POINT_NAME_LEN)
        .collect()
}

fn bucket_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}")
}

/// `arn:aws:iam::123:role/path/name` -> `name`.
fn role_name_from_arn(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// The principal's two access point statement ids.
fn principal_sids(role_id: &str) -> (String, String) {
    (format!("{role_id}0"), format!("{role_id}1"))
}

pub struct PrefixShareManager<'a> {
    ctx: &'a SharingContext,
    data: &'a ShareData,
    source: AccountRef,
    target: AccountRef,
    access_point: String,
}

impl<'a> PrefixShareManager<'a> {
    pub fn new(ctx: &'a SharingContext, data: &'a ShareData) -> Self {
        Self {
            ctx,
            data,
            source: AccountRef::new(&data.dataset.account_id, &data.dataset.region),
            target: AccountRef::new(
                &data.target_environment.account_id,
                &data.target_environment.region,
            ),
            access_point: access_point_name(data.dataset.uri.as_str(), &data.share.principal_id),
        }
    }

    pub fn access_point(&self) -> &str {
        &self.access_point
    }

    /// ARN the access point has (or will have) in the producer account.
    fn access_point_arn(&self) -> String {
        format!(
            "arn:aws:s3:{}:{}:accesspoint/{}",
            self.source.region, self.source.account_id, self.access_point
        )
    }

    async fn principal_role_id(&self) -> ShareResult<String> {
        Ok(self
            .ctx
            .client
            .get_role_id(&self.target, &self.data.share.principal_role_name)
            .await?)
    }

    /// `<roleId>:*` for the dataset admin, the producer environment role and
    /// the pivot role.
    async fn admin_user_ids(&self) -> ShareResult<ValueList> {
        let pivot = self.ctx.pivot_role_arn(&self.source.account_id);
        let arns = [
            self.data.dataset.admin_role_arn.as_str(),
            self.data.source_environment.default_role_arn.as_str(),
            pivot.as_str(),
        ];
        let mut ids = ValueList::new();
        for arn in arns {
            let id = self
                .ctx
                .client
                .get_role_id(&self.source, role_name_from_arn(arn))
                .await?;
            ids.push_unique(format!("{id}:*"));
        }
        Ok(ids)
    }

    /// Key ARN of an encrypted bucket. `Ok(None)` for unencrypted buckets.
    async fn key_arn(&self) -> ShareResult<Option<String>> {
        let Some(alias) = self.data.dataset.kms_alias.as_deref() else {
            return Ok(None);
        };
        match self.ctx.client.get_key_arn(&self.source, alias).await? {
            Some(arn) => Ok(Some(arn)),
            None => Err(ShareError::gone("KMS key", format!("alias/{alias}"))),
        }
    }

    fn iam_resources(&self, bucket: &str) -> Vec<String> {
        let bucket = bucket_arn(bucket);
        let access_point = self.access_point_arn();
        vec![
            bucket.clone(),
            format!("{bucket}/*"),
            access_point.clone(),
            format!("{access_point}/*"),
        ]
    }

    // ── Approve steps ──

    async fn manage_bucket_policy(&self, bucket: &str) -> ShareResult<()> {
        let client = &self.ctx.client;
        let mut policy = client
            .get_bucket_policy(&self.source, bucket)
            .await?
            .unwrap_or_default();
        let resources = [bucket_arn(bucket), format!("{}/*", bucket_arn(bucket))];

        let mut changed = false;
        if !policy.has_statement(ADMIN_SID) {
            let admins = self.admin_user_ids().await?;
            policy.ensure_statement(
                Statement::allow(ADMIN_SID)
                    .with_principal(Principal::Any)
                    .with_actions(["s3:*"])
                    .with_resources(resources.clone())
                    .with_condition(STRING_LIKE, USER_ID, admins),
            );
            changed = true;
        }
        let delegate = Statement::allow(DELEGATE_SID)
            .with_principal(Principal::aws(["*"]))
            .with_actions(["s3:*"])
            .with_resources(resources)
            .with_condition(
                STRING_EQUALS,
                "s3:DataAccessPointAccount",
                [self.source.account_id.clone()],
            );
        changed |= policy.ensure_statement(delegate) == Upsert::Inserted;

        if changed {
            debug!(bucket, "updating bucket policy");
            client.put_bucket_policy(&self.source, bucket, &policy).await?;
        }
        Ok(())
    }

    async fn grant_target_role_policy(&self, bucket: &str, key_arn: Option<&str>) -> ShareResult<()> {
        let client = &self.ctx.client;
        let role = &self.data.share.principal_role_name;
        let name = &self.ctx.config.iam_policy_name;
        let mut policy = client
            .get_role_policy(&self.target, role, name)
            .await?
            .unwrap_or_default();

        let resources = self.iam_resources(bucket);
        policy.upsert_statement(
            IAM_S3_SID,
            || {
                Statement::allow(IAM_S3_SID)
                    .with_actions(["s3:*"])
                    .with_resources(resources.clone())
            },
            |statement| statement.resource.extend(resources.clone()),
        );
        if let Some(key_arn) = key_arn {
            policy.upsert_statement(
                IAM_KMS_SID,
                || {
                    Statement::allow(IAM_KMS_SID)
                        .with_actions(["kms:Decrypt"])
                        .with_resources([key_arn])
                },
                |statement| {
                    statement.resource.push_unique(key_arn);
                },
            );
        }
        client.put_role_policy(&self.target, role, name, &policy).await?;
        Ok(())
    }

    /// Creates the access point if needed and waits until it resolves.
    async fn ensure_access_point(&self, bucket: &str) -> ShareResult<String> {
        let client = &self.ctx.client;
        if let Some(arn) = client
            .get_access_point_arn(&self.source, &self.access_point)
            .await?
        {
            return Ok(arn);
        }
        info!(access_point = %self.access_point, bucket, "creating access point");
        client
            .create_access_point(&self.source, bucket, &self.access_point)
            .await?;
        self.ctx
            .config
            .access_point_poll
            .poll(|| client.get_access_point_arn(&self.source, &self.access_point))
            .await?
            .ok_or_else(|| ShareError::gone("access point", self.access_point.clone()))
    }

    async fn grant_access_point_policy(
        &self,
        access_point_arn: &str,
        prefix: &str,
        role_id: &str,
    ) -> ShareResult<()> {
        let client = &self.ctx.client;
        let mut policy = client
            .get_access_point_policy(&self.source, &self.access_point)
            .await?
            .unwrap_or_default();

        let (list_sid, get_sid) = principal_sids(role_id);
        let prefix_value = format!("{prefix}/*");
        let object_arn = format!("{access_point_arn}/object/{prefix}/*");
        let user_id = format!("{role_id}:*");

        policy.upsert_statement(
            &list_sid,
            || {
                Statement::allow(&list_sid)
                    .with_principal(Principal::aws(["*"]))
                    .with_actions(["s3:ListBucket"])
                    .with_resources([access_point_arn])
                    .with_condition(STRING_LIKE, S3_PREFIX, [prefix_value.clone()])
                    .with_condition(STRING_LIKE, USER_ID, [user_id.clone()])
            },
            |statement| {
                statement
                    .condition
                    .entry(STRING_LIKE, S3_PREFIX)
                    .push_unique(prefix_value.clone());
            },
        );
        policy.upsert_statement(
            &get_sid,
            || {
                Statement::allow(&get_sid)
                    .with_principal(Principal::aws(["*"]))
                    .with_actions(["s3:GetObject"])
                    .with_resources([object_arn.clone()])
                    .with_condition(STRING_LIKE, USER_ID, [user_id.clone()])
            },
            |statement| {
                statement.resource.push_unique(object_arn.clone());
            },
        );

        if !policy.has_statement(ADMIN_SID) {
            let admins = self.admin_user_ids().await?;
            policy.ensure_statement(
                Statement::allow(ADMIN_SID)
                    .with_principal(Principal::Any)
                    .with_actions(["s3:*"])
                    .with_resources([access_point_arn])
                    .with_condition(STRING_LIKE, USER_ID, admins),
            );
        }

        client
            .put_access_point_policy(&self.source, &self.access_point, &policy)
            .await?;
        Ok(())
    }

    async fn grant_key_policy(&self, key_arn: &str, role_id: &str) -> ShareResult<()> {
        let client = &self.ctx.client;
        let mut policy = client.get_key_policy(&self.source, key_arn).await?;
        let statement = Statement::allow(role_id)
            .with_principal(Principal::aws(["*"]))
            .with_actions(["kms:Decrypt"])
            .with_resources(["*"])
            .with_condition(STRING_LIKE, USER_ID, [format!("{role_id}:*")]);
        if policy.ensure_statement(statement) == Upsert::Inserted {
            client.put_key_policy(&self.source, key_arn, &policy).await?;
        }
        Ok(())
    }

    // ── Revoke steps ──

    /// Drops the prefix from the principal's access point statements and
    /// deletes the access point once only the admin statement is left.
    /// Returns true when the principal no longer appears in the policy.
    async fn narrow_access_point(&self, prefix: &str, role_id: &str) -> ShareResult<bool> {
        let client = &self.ctx.client;
        let Some(access_point_arn) = client
            .get_access_point_arn(&self.source, &self.access_point)
            .await?
        else {
            debug!(access_point = %self.access_point, "access point already gone");
            return Ok(true);
        };
        let Some(mut policy) = client
            .get_access_point_policy(&self.source, &self.access_point)
            .await?
        else {
            client
                .delete_access_point(&self.source, &self.access_point)
                .await?;
            return Ok(true);
        };

        let (list_sid, get_sid) = principal_sids(role_id);
        if let Some(statement) = policy.statement_mut(&list_sid) {
            statement
                .condition
                .remove_value(STRING_LIKE, S3_PREFIX, &format!("{prefix}/*"));
        }
        if let Some(statement) = policy.statement_mut(&get_sid) {
            statement
                .resource
                .remove(&format!("{access_point_arn}/object/{prefix}/*"));
        }
        policy.remove_statement_if_empty(&list_sid);
        policy.remove_statement_if_empty(&get_sid);
        let principal_gone = !policy.has_statement(&list_sid) && !policy.has_statement(&get_sid);

        // Only the admin statement left means no principal uses the access point.
        let admin_only = policy.sids().filter(|sid| *sid == ADMIN_SID).count() == policy.len();
        if admin_only {
            info!(access_point = %self.access_point, "deleting unused access point");
            client
                .delete_access_point(&self.source, &self.access_point)
                .await?;
        } else {
            client
                .put_access_point_policy(&self.source, &self.access_point, &policy)
                .await?;
        }
        Ok(principal_gone)
    }

    async fn revoke_target_role_policy(&self, bucket: &str, key_arn: Option<&str>) -> ShareResult<()> {
        let client = &self.ctx.client;
        let role = &self.data.share.principal_role_name;
        let name = &self.ctx.config.iam_policy_name;
        let Some(mut policy) = client.get_role_policy(&self.target, role, name).await? else {
            return Ok(());
        };

        if let Some(statement) = policy.statement_mut(IAM_S3_SID) {
            for resource in self.iam_resources(bucket) {
                statement.resource.remove(&resource);
            }
        }
        policy.remove_statement_if_empty(IAM_S3_SID);
        if let Some(key_arn) = key_arn {
            if let Some(statement) = policy.statement_mut(IAM_KMS_SID) {
                statement.resource.remove(key_arn);
            }
            policy.remove_statement_if_empty(IAM_KMS_SID);
        }

        if policy.is_empty() {
            client.delete_role_policy(&self.target, role, name).await?;
        } else {
            client.put_role_policy(&self.target, role, name, &policy).await?;
        }
        Ok(())
    }

    async fn revoke_key_policy(&self, key_arn: &str, role_id: &str) -> ShareResult<()> {
        let client = &self.ctx.client;
        let mut policy = client.get_key_policy(&self.source, key_arn).await?;
        if policy.remove_statement(role_id).is_some() {
            client.put_key_policy(&self.source, key_arn, &policy).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> ShareManager for PrefixShareManager<'a> {
    type Resource = DatasetStorageLocation;

    fn kind(&self) -> ShareableType {
        ShareableType::StorageLocation
    }

    fn describe(&self, location: &DatasetStorageLocation) -> String {
        format!("s3://{}/{}", location.s3_bucket_name, location.s3_prefix)
    }

    async fn grant(
        &self,
        _item: &ShareObjectItem,
        location: &DatasetStorageLocation,
    ) -> ShareResult<String> {
        let bucket = &location.s3_bucket_name;
        let key_arn = self.key_arn().await?;
        let role_id = self.principal_role_id().await?;

        self.manage_bucket_policy(bucket).await?;
        self.grant_target_role_policy(bucket, key_arn.as_deref())
            .await?;
        let access_point_arn = self.ensure_access_point(bucket).await?;
        self.grant_access_point_policy(&access_point_arn, &location.s3_prefix, &role_id)
            .await?;
        if let Some(key_arn) = key_arn.as_deref() {
            self.grant_key_policy(key_arn, &role_id).await?;
        }

        info!(
            share_uri = %self.data.share.uri,
            folder = %self.describe(location),
            access_point = %self.access_point,
            "folder shared"
        );
        Ok(self.access_point.clone())
    }

    async fn revoke(
        &self,
        _item: &ShareObjectItem,
        location: &DatasetStorageLocation,
    ) -> ShareResult<()> {
        let role_id = self.principal_role_id().await?;
        let principal_gone = self
            .narrow_access_point(&location.s3_prefix, &role_id)
            .await?;

        // Other prefixes of this principal still go through the same access
        // point, so the role and key grants stay until the last one is gone.
        if principal_gone {
            let key_arn = match self.data.dataset.kms_alias.as_deref() {
                Some(alias) => self.ctx.client.get_key_arn(&self.source, alias).await?,
                None => None,
            };
            self.revoke_target_role_policy(&location.s3_bucket_name, key_arn.as_deref())
                .await?;
            if let Some(key_arn) = key_arn.as_deref() {
                self.revoke_key_policy(key_arn, &role_id).await?;
            }
        }

        info!(
            share_uri = %self.data.share.uri,
            folder = %self.describe(location),
            "folder share revoked"
        );
        Ok(())
    }

    /// Removes the bucket policy statements once no other share still holds
    /// a folder of this bucket.
    async fn clean_up(&self) -> ShareResult<()> {
        let bucket = &self.data.dataset.s3_bucket_name;
        if self
            .ctx
            .store
            .other_shared_folder_in_bucket(bucket, &self.data.share.uri)?
        {
            debug!(bucket, "bucket still shared by another share, keeping bucket policy");
            return Ok(());
        }

        let client = &self.ctx.client;
        let Some(mut policy) = client.get_bucket_policy(&self.source, bucket).await? else {
            return Ok(());
        };
        let removed_admin = policy.remove_statement(ADMIN_SID).is_some();
        let removed_delegate = policy.remove_statement(DELEGATE_SID).is_some();
        if !removed_admin && !removed_delegate {
            return Ok(());
        }

        if policy.is_empty() {
            info!(bucket, "deleting bucket policy");
            client.delete_bucket_policy(&self.source, bucket).await?;
        } else {
            client.put_bucket_policy(&self.source, bucket, &policy).await?;
        }
        Ok(())
    }

    fn failure_alarm(
        &self,
        location: &DatasetStorageLocation,
        phase: Phase,
        error: &ShareError,
    ) -> Alarm {
        alarms::folder_failure(
            &self.ctx.cloud.envname,
            self.data,
            location,
            &self.access_point,
            phase,
            &error.to_string(),
        )
    }
}
