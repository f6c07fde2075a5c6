//! Inline role policies and role ids.

use super::AwsPolicyClient;
use super::errors::{has_code, remote_error};
use crate::error::{CloudError, CloudResult};
use crate::types::AccountRef;
use lakeshare_policy::PolicyDocument;
use tracing::info;

const NO_SUCH_ENTITY: &[&str] = &["NoSuchEntity"];

impl AwsPolicyClient {
    async fn iam(&self, account: &AccountRef) -> CloudResult<aws_sdk_iam::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_iam::Client::new(&config))
    }

    pub(super) async fn iam_get_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let client = self.iam(account).await?;
        match client
            .get_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
        {
            Ok(resp) => {
                // IAM returns the document URL-encoded.
                let decoded = urlencoding::decode(resp.policy_document()).map_err(|e| {
                    CloudError::InvalidRequest(format!("undecodable policy {policy_name}: {e}"))
                })?;
                Ok(Some(PolicyDocument::parse(&decoded)?))
            }
            Err(e) if has_code(&e, NO_SUCH_ENTITY) => Ok(None),
            Err(e) => Err(remote_error("iam:GetRolePolicy", e)),
        }
    }

    pub(super) async fn iam_put_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let client = self.iam(account).await?;
        client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(policy.to_json()?)
            .send()
            .await
            .map_err(|e| remote_error("iam:PutRolePolicy", e))?;
        info!("updated inline policy {policy_name} of role {role_name}");
        Ok(())
    }

    pub(super) async fn iam_delete_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<()> {
        let client = self.iam(account).await?;
        match client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await
        {
            Ok(_) => {
                info!("deleted inline policy {policy_name} of role {role_name}");
                Ok(())
            }
            Err(e) if has_code(&e, NO_SUCH_ENTITY) => Ok(()),
            Err(e) => Err(remote_error("iam:DeleteRolePolicy", e)),
        }
    }

    pub(super) async fn iam_get_role_id(
        &self,
        account: &AccountRef,
        role_name: &str,
    ) -> CloudResult<String> {
        let client = self.iam(account).await?;
        match client.get_role().role_name(role_name).send().await {
            Ok(resp) => resp
                .role()
                .map(|role| role.role_id().to_string())
                .ok_or_else(|| CloudError::NotFound(format!("role {role_name}"))),
            Err(e) if has_code(&e, NO_SUCH_ENTITY) => {
                Err(CloudError::NotFound(format!("role {role_name} in {account}")))
            }
            Err(e) => Err(remote_error("iam:GetRole", e)),
        }
    }
}
