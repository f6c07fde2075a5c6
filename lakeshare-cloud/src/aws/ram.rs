//! Resource shares: associations on the owning side, invitations on the
//! receiving side.

use super::AwsPolicyClient;
use super::errors::{has_code, remote_error};
use crate::error::CloudResult;
use crate::types::{AccountRef, InvitationStatus, ResourceShareInvitation};
use aws_sdk_ram::types::{ResourceShareAssociationStatus, ResourceShareAssociationType};
use tracing::{info, warn};

impl AwsPolicyClient {
    async fn ram(&self, account: &AccountRef) -> CloudResult<aws_sdk_ram::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_ram::Client::new(&config))
    }

    pub(super) async fn ram_list_invitations(
        &self,
        account: &AccountRef,
    ) -> CloudResult<Vec<ResourceShareInvitation>> {
        const OP: &str = "ram:GetResourceShareInvitations";
        let client = self.ram(account).await?;
        let mut invitations = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = client
                .get_resource_share_invitations()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| remote_error(OP, e))?;

            for raw in resp.resource_share_invitations() {
                let status = raw
                    .status()
                    .and_then(|s| InvitationStatus::from_str_value(s.as_str()));
                let (Some(arn), Some(status)) = (raw.resource_share_invitation_arn(), status)
                else {
                    warn!("skipping malformed resource share invitation in {account}");
                    continue;
                };
                invitations.push(ResourceShareInvitation {
                    arn: arn.to_string(),
                    status,
                    sender_account_id: raw.sender_account_id().unwrap_or_default().to_string(),
                    receiver_account_id: raw
                        .receiver_account_id()
                        .unwrap_or_default()
                        .to_string(),
                    resource_share_arn: raw.resource_share_arn().unwrap_or_default().to_string(),
                    resource_share_name: raw.resource_share_name().unwrap_or_default().to_string(),
                });
            }

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(invitations)
    }

    pub(super) async fn ram_accept_invitation(
        &self,
        account: &AccountRef,
        invitation_arn: &str,
    ) -> CloudResult<()> {
        let client = self.ram(account).await?;
        match client
            .accept_resource_share_invitation()
            .resource_share_invitation_arn(invitation_arn)
            .send()
            .await
        {
            Ok(_) => {
                info!("accepted resource share invitation {invitation_arn} in {account}");
                Ok(())
            }
            Err(e) if has_code(&e, &["ResourceShareInvitationAlreadyAcceptedException"]) => Ok(()),
            Err(e) => Err(remote_error("ram:AcceptResourceShareInvitation", e)),
        }
    }

    /// Resource shares owned by `account` that currently hold `resource_arn`.
    pub(super) async fn ram_list_resource_share_arns(
        &self,
        account: &AccountRef,
        resource_arn: &str,
    ) -> CloudResult<Vec<String>> {
        const OP: &str = "ram:GetResourceShareAssociations";
        let client = self.ram(account).await?;
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = client
                .get_resource_share_associations()
                .association_type(ResourceShareAssociationType::Resource)
                .resource_arn(resource_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| remote_error(OP, e))?;

            for association in resp.resource_share_associations() {
                let live = matches!(
                    association.status(),
                    Some(ResourceShareAssociationStatus::Associated)
                        | Some(ResourceShareAssociationStatus::Associating)
                );
                let Some(arn) = association.resource_share_arn() else {
                    continue;
                };
                if live && !arns.iter().any(|a| a == arn) {
                    arns.push(arn.to_string());
                }
            }

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(arns)
    }

    pub(super) async fn ram_delete_resource_share(
        &self,
        account: &AccountRef,
        resource_share_arn: &str,
    ) -> CloudResult<()> {
        let client = self.ram(account).await?;
        match client
            .delete_resource_share()
            .resource_share_arn(resource_share_arn)
            .send()
            .await
        {
            Ok(_) => {
                info!("deleted resource share {resource_share_arn} in {account}");
                Ok(())
            }
            Err(e) if has_code(&e, &["UnknownResourceException"]) => Ok(()),
            Err(e) => Err(remote_error("ram:DeleteResourceShare", e)),
        }
    }
}
