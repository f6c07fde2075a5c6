//! Bucket policies (S3) and access points (S3 Control).

use super::AwsPolicyClient;
use super::errors::{has_code, remote_error};
use crate::error::{CloudError, CloudResult};
use crate::types::AccountRef;
use lakeshare_policy::PolicyDocument;
use tracing::info;

impl AwsPolicyClient {
    async fn s3(&self, account: &AccountRef) -> CloudResult<aws_sdk_s3::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_s3::Client::new(&config))
    }

    async fn s3control(&self, account: &AccountRef) -> CloudResult<aws_sdk_s3control::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_s3control::Client::new(&config))
    }

    // ── Bucket policy ──

    pub(super) async fn s3_get_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let client = self.s3(account).await?;
        match client.get_bucket_policy().bucket(bucket).send().await {
            Ok(resp) => resp
                .policy()
                .map(|json| PolicyDocument::parse(json).map_err(CloudError::from))
                .transpose(),
            Err(e) if has_code(&e, &["NoSuchBucketPolicy"]) => Ok(None),
            Err(e) => Err(remote_error("s3:GetBucketPolicy", e)),
        }
    }

    pub(super) async fn s3_put_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let client = self.s3(account).await?;
        client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy.to_json()?)
            .send()
            .await
            .map_err(|e| remote_error("s3:PutBucketPolicy", e))?;
        info!("updated bucket policy of {bucket} ({} statements)", policy.len());
        Ok(())
    }

    pub(super) async fn s3_delete_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
    ) -> CloudResult<()> {
        let client = self.s3(account).await?;
        client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| remote_error("s3:DeleteBucketPolicy", e))?;
        info!("deleted bucket policy of {bucket}");
        Ok(())
    }

    // ── Access points ──

    pub(super) async fn s3_get_access_point_arn(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<String>> {
        let client = self.s3control(account).await?;
        match client
            .get_access_point()
            .account_id(&account.account_id)
            .name(name)
            .send()
            .await
        {
            Ok(resp) => Ok(resp.access_point_arn().map(str::to_string)),
            Err(e) if has_code(&e, &["NoSuchAccessPoint"]) => Ok(None),
            Err(e) => Err(remote_error("s3:GetAccessPoint", e)),
        }
    }

    pub(super) async fn s3_create_access_point(
        &self,
        account: &AccountRef,
        bucket: &str,
        name: &str,
    ) -> CloudResult<String> {
        const OP: &str = "s3:CreateAccessPoint";
        let client = self.s3control(account).await?;
        let resp = client
            .create_access_point()
            .account_id(&account.account_id)
            .name(name)
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        let arn = resp
            .access_point_arn()
            .map(str::to_string)
            .ok_or_else(|| CloudError::from_code(OP, Some("MissingArn"), "no access point ARN returned"))?;
        info!("created access point {name} on {bucket}");
        Ok(arn)
    }

    pub(super) async fn s3_delete_access_point(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<()> {
        let client = self.s3control(account).await?;
        match client
            .delete_access_point()
            .account_id(&account.account_id)
            .name(name)
            .send()
            .await
        {
            Ok(_) => {
                info!("deleted access point {name} in {account}");
                Ok(())
            }
            Err(e) if has_code(&e, &["NoSuchAccessPoint"]) => Ok(()),
            Err(e) => Err(remote_error("s3:DeleteAccessPoint", e)),
        }
    }

    pub(super) async fn s3_get_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let client = self.s3control(account).await?;
        match client
            .get_access_point_policy()
            .account_id(&account.account_id)
            .name(name)
            .send()
            .await
        {
            Ok(resp) => resp
                .policy()
                .map(|json| PolicyDocument::parse(json).map_err(CloudError::from))
                .transpose(),
            Err(e) if has_code(&e, &["NoSuchAccessPointPolicy", "NoSuchAccessPoint"]) => Ok(None),
            Err(e) => Err(remote_error("s3:GetAccessPointPolicy", e)),
        }
    }

    pub(super) async fn s3_put_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let client = self.s3control(account).await?;
        client
            .put_access_point_policy()
            .account_id(&account.account_id)
            .name(name)
            .policy(policy.to_json()?)
            .send()
            .await
            .map_err(|e| remote_error("s3:PutAccessPointPolicy", e))?;
        info!("updated access point policy of {name} ({} statements)", policy.len());
        Ok(())
    }
}
