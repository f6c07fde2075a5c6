//! Key policies.

use super::AwsPolicyClient;
use super::errors::{has_code, remote_error};
use crate::error::{CloudError, CloudResult};
use crate::types::AccountRef;
use lakeshare_policy::PolicyDocument;
use tracing::info;

const DEFAULT_POLICY_NAME: &str = "default";

impl AwsPolicyClient {
    async fn kms(&self, account: &AccountRef) -> CloudResult<aws_sdk_kms::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_kms::Client::new(&config))
    }

    pub(super) async fn kms_get_key_arn(
        &self,
        account: &AccountRef,
        alias: &str,
    ) -> CloudResult<Option<String>> {
        let client = self.kms(account).await?;
        match client
            .describe_key()
            .key_id(format!("alias/{alias}"))
            .send()
            .await
        {
            Ok(resp) => Ok(resp
                .key_metadata()
                .and_then(|meta| meta.arn())
                .map(str::to_string)),
            Err(e) if has_code(&e, &["NotFoundException"]) => Ok(None),
            Err(e) => Err(remote_error("kms:DescribeKey", e)),
        }
    }

    pub(super) async fn kms_get_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
    ) -> CloudResult<PolicyDocument> {
        const OP: &str = "kms:GetKeyPolicy";
        let client = self.kms(account).await?;
        let resp = client
            .get_key_policy()
            .key_id(key_id)
            .policy_name(DEFAULT_POLICY_NAME)
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        let json = resp
            .policy()
            .ok_or_else(|| CloudError::NotFound(format!("key policy of {key_id}")))?;
        Ok(PolicyDocument::parse(json)?)
    }

    pub(super) async fn kms_put_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let client = self.kms(account).await?;
        client
            .put_key_policy()
            .key_id(key_id)
            .policy_name(DEFAULT_POLICY_NAME)
            .policy(policy.to_json()?)
            .send()
            .await
            .map_err(|e| remote_error("kms:PutKeyPolicy", e))?;
        info!("updated key policy of {key_id}");
        Ok(())
    }
}
