//! Catalog table sharing through resource links.
//!
//! Every share gets its own database in the consumer account
//! (`<sourceDb>_shared_<shareUri>`). Each shared table appears there as a
//! resource link pointing back at the producer's table. Cross-account
//! shares additionally grant the consumer account on the source table and
//! accept the resulting resource-share invitation.

use super::ShareManager;
use crate::alarms::{self, Phase};
use crate::context::SharingContext;
use crate::error::{ShareError, ShareResult};
use async_trait::async_trait;
use lakeshare_cloud::{
    AccountRef, Alarm, IAM_ALLOWED_PRINCIPALS, InvitationStatus, LfPermission, LfResource,
    PermissionGrant, ResourceLink,
};
use lakeshare_types::{DatasetTable, ShareData, ShareObjectItem, ShareableType};
use tracing::{debug, info, warn};

/// Catalog names are capped at this many characters.
const MAX_DATABASE_NAME_LEN: usize = 254;

const READ: &[LfPermission] = &[LfPermission::Describe, LfPermission::Select];

/// Name of the consumer-side database holding a share's resource links.
pub fn shared_database_name(source_database: &str, share_uri: &str) -> String {
    let mut name = format!("{source_database}_shared_{share_uri}");
    if name.len() > MAX_DATABASE_NAME_LEN {
        let mut cut = MAX_DATABASE_NAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

/// Consumer-side standing of the resource shares behind one table grant.
/// Ordered so that a reset outranks an acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum InvitationState {
    /// No invitation for the table is visible yet.
    Missing,
    /// Every visible invitation is accepted.
    Accepted,
    /// An invitation was rejected or expired and its share was deleted.
    Reset,
}

/// Whether producer and consumer live in the same account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountScope {
    SameAccount,
    CrossAccount,
}

impl AccountScope {
    pub fn of(data: &ShareData) -> Self {
        if data.is_cross_account() {
            AccountScope::CrossAccount
        } else {
            AccountScope::SameAccount
        }
    }
}

pub struct TableShareManager<'a> {
    ctx: &'a SharingContext,
    data: &'a ShareData,
    scope: AccountScope,
    source: AccountRef,
    target: AccountRef,
    shared_database: String,
}

impl<'a> TableShareManager<'a> {
    pub fn new(ctx: &'a SharingContext, data: &'a ShareData) -> Self {
        Self {
            ctx,
            data,
            scope: AccountScope::of(data),
            source: AccountRef::new(&data.dataset.account_id, &data.dataset.region),
            target: AccountRef::new(
                &data.target_environment.account_id,
                &data.target_environment.region,
            ),
            shared_database: shared_database_name(
                &data.dataset.glue_database_name,
                data.share.uri.as_str(),
            ),
        }
    }

    pub fn scope(&self) -> AccountScope {
        self.scope
    }

    pub fn shared_database(&self) -> &str {
        &self.shared_database
    }

    fn source_table(&self, table: &DatasetTable) -> LfResource {
        LfResource::table(
            &self.source.account_id,
            &table.glue_database_name,
            &table.glue_table_name,
        )
    }

    fn link_table(&self, table: &DatasetTable) -> LfResource {
        LfResource::table(
            &self.target.account_id,
            &self.shared_database,
            &table.glue_table_name,
        )
    }

    /// Consumer account's grant on the source table. Revoked with the exact
    /// same shape it was granted with.
    fn account_grant(&self, table: &DatasetTable) -> PermissionGrant {
        PermissionGrant::new(&self.target.account_id, self.source_table(table), READ)
            .with_grant_option(READ)
    }

    fn principal_link_grant(&self, table: &DatasetTable) -> PermissionGrant {
        PermissionGrant::new(
            self.data.principal_role_arn(),
            self.link_table(table),
            &[LfPermission::Describe],
        )
    }

    fn principal_table_grant(&self, table: &DatasetTable) -> PermissionGrant {
        PermissionGrant::new(self.data.principal_role_arn(), self.source_table(table), READ)
    }

    async fn check_table_exists(&self, table: &DatasetTable) -> ShareResult<bool> {
        Ok(self
            .ctx
            .client
            .table_exists(
                &self.source,
                &table.glue_database_name,
                &table.glue_table_name,
            )
            .await?)
    }

    // ── Cross-account plumbing ──

    async fn grant_to_account(&self, table: &DatasetTable) -> ShareResult<()> {
        let client = &self.ctx.client;
        let legacy = PermissionGrant::new(
            IAM_ALLOWED_PRINCIPALS,
            self.source_table(table),
            &[LfPermission::All],
        );
        client.revoke_permissions(&self.source, &legacy).await?;
        client
            .grant_permissions(&self.source, &self.account_grant(table))
            .await?;
        debug!(
            share_uri = %self.data.share.uri,
            table = %self.source_table(table),
            account = %self.target.account_id,
            "granted consumer account on source table"
        );
        Ok(())
    }

    /// Accepts the consumer-side invitations of every resource share that
    /// holds `table`. Rejected or expired invitations cannot be accepted any
    /// more, so their resource share is deleted for the next grant to
    /// recreate it.
    async fn accept_invitations(&self, table: &DatasetTable) -> ShareResult<InvitationState> {
        let client = &self.ctx.client;
        let table_arn = self.source_table(table).glue_arn(&self.source.region);
        let share_arns = client
            .list_resource_share_arns(&self.source, &table_arn)
            .await?;
        if share_arns.is_empty() {
            return Ok(InvitationState::Missing);
        }

        let invitations = client
            .list_resource_share_invitations(&self.target)
            .await?;
        let mut state = InvitationState::Missing;
        for invitation in invitations.iter().filter(|i| {
            i.is_catalog_share()
                && i.sender_account_id == self.source.account_id
                && i.receiver_account_id == self.target.account_id
                && share_arns.contains(&i.resource_share_arn)
        }) {
            match invitation.status {
                InvitationStatus::Pending => {
                    client
                        .accept_resource_share_invitation(&self.target, &invitation.arn)
                        .await?;
                    info!(
                        share_uri = %self.data.share.uri,
                        invitation = %invitation.arn,
                        "accepted resource-share invitation"
                    );
                    state = state.max(InvitationState::Accepted);
                }
                InvitationStatus::Accepted => {
                    state = state.max(InvitationState::Accepted);
                }
                InvitationStatus::Rejected | InvitationStatus::Expired => {
                    warn!(
                        share_uri = %self.data.share.uri,
                        invitation = %invitation.arn,
                        status = ?invitation.status,
                        "invitation can no longer be accepted, deleting its resource share"
                    );
                    client
                        .delete_resource_share(&self.source, &invitation.resource_share_arn)
                        .await?;
                    state = InvitationState::Reset;
                }
            }
        }
        Ok(state)
    }

    /// Invitations can take a while to show up on the consumer side, and a
    /// reset resource share has to be recreated. One re-grant after a fixed
    /// delay, then give up.
    async fn ensure_invitation_accepted(&self, table: &DatasetTable) -> ShareResult<()> {
        let first = self.accept_invitations(table).await?;
        if first == InvitationState::Accepted {
            return Ok(());
        }
        let delay = self.ctx.config.invitation_retry_delay();
        warn!(
            share_uri = %self.data.share.uri,
            table = %self.describe(table),
            state = ?first,
            "invitation from {} not accepted in {}, re-granting in {delay:?}",
            self.source.account_id,
            self.target.account_id
        );
        tokio::time::sleep(delay).await;

        let client = &self.ctx.client;
        let grant = self.account_grant(table);
        if first == InvitationState::Reset {
            client.revoke_permissions(&self.source, &grant).await?;
        }
        client.grant_permissions(&self.source, &grant).await?;
        if self.accept_invitations(table).await? == InvitationState::Accepted {
            return Ok(());
        }
        Err(ShareError::InvitationNotAccepted {
            source_account: self.source.account_id.clone(),
            target_account: self.target.account_id.clone(),
        })
    }
}

#[async_trait]
impl<'a> ShareManager for TableShareManager<'a> {
    type Resource = DatasetTable;

    fn kind(&self) -> ShareableType {
        ShareableType::Table
    }

    fn describe(&self, table: &DatasetTable) -> String {
        format!("{}.{}", table.glue_database_name, table.glue_table_name)
    }

    /// Pivot access to the source database, then the shared database with
    /// pivot control and principal `DESCRIBE`.
    async fn prepare(&self) -> ShareResult<()> {
        let client = &self.ctx.client;
        let dataset = &self.data.dataset;

        client
            .grant_permissions(
                &self.source,
                &PermissionGrant::new(
                    self.ctx.pivot_role_arn(&self.source.account_id),
                    LfResource::database(&self.source.account_id, &dataset.glue_database_name),
                    &[LfPermission::All],
                ),
            )
            .await?;

        if !client
            .database_exists(&self.target, &self.shared_database)
            .await?
        {
            info!(
                share_uri = %self.data.share.uri,
                database = %self.shared_database,
                "creating shared database"
            );
            client
                .create_database(&self.target, &self.shared_database)
                .await?;
        }

        let shared = LfResource::database(&self.target.account_id, &self.shared_database);
        client
            .grant_permissions(
                &self.target,
                &PermissionGrant::new(
                    self.ctx.pivot_role_arn(&self.target.account_id),
                    shared.clone(),
                    &[LfPermission::All],
                ),
            )
            .await?;
        client
            .grant_permissions(
                &self.target,
                &PermissionGrant::new(
                    self.data.principal_role_arn(),
                    shared,
                    &[LfPermission::Describe],
                ),
            )
            .await?;
        Ok(())
    }

    async fn grant(&self, _item: &ShareObjectItem, table: &DatasetTable) -> ShareResult<String> {
        if !self.check_table_exists(table).await? {
            return Err(ShareError::gone("table", self.describe(table)));
        }

        if self.scope == AccountScope::CrossAccount {
            self.grant_to_account(table).await?;
            self.ensure_invitation_accepted(table).await?;
        }

        let link = ResourceLink {
            database: self.shared_database.clone(),
            name: table.glue_table_name.clone(),
            target_catalog_id: self.source.account_id.clone(),
            target_database: table.glue_database_name.clone(),
            target_table: table.glue_table_name.clone(),
        };
        let client = &self.ctx.client;
        client.create_resource_link(&self.target, &link).await?;
        client
            .grant_permissions(&self.target, &self.principal_link_grant(table))
            .await?;
        client
            .grant_permissions(&self.target, &self.principal_table_grant(table))
            .await?;

        info!(
            share_uri = %self.data.share.uri,
            table = %self.describe(table),
            link = %format!("{}.{}", link.database, link.name),
            "table shared"
        );
        Ok(link.name)
    }

    async fn revoke(&self, item: &ShareObjectItem, table: &DatasetTable) -> ShareResult<()> {
        if !self.check_table_exists(table).await? {
            info!(
                share_uri = %self.data.share.uri,
                table = %self.describe(table),
                "source table is gone, nothing to revoke"
            );
            return Ok(());
        }

        let client = &self.ctx.client;
        client
            .revoke_permissions(&self.target, &self.principal_link_grant(table))
            .await?;
        client
            .revoke_permissions(&self.target, &self.principal_table_grant(table))
            .await?;

        if self.scope == AccountScope::CrossAccount
            && !self.ctx.store.other_shared_table_in_account(
                table.uri.as_str(),
                &self.target.account_id,
                &item.uri,
            )?
        {
            client
                .revoke_permissions(&self.source, &self.account_grant(table))
                .await?;
            debug!(
                share_uri = %self.data.share.uri,
                table = %self.describe(table),
                "revoked consumer account grant"
            );
        }

        client
            .delete_table(&self.target, &self.shared_database, &table.glue_table_name)
            .await?;
        info!(
            share_uri = %self.data.share.uri,
            table = %self.describe(table),
            "table share revoked"
        );
        Ok(())
    }

    async fn clean_up(&self) -> ShareResult<()> {
        info!(
            share_uri = %self.data.share.uri,
            database = %self.shared_database,
            "deleting shared database"
        );
        self.ctx
            .client
            .delete_database(&self.target, &self.shared_database)
            .await?;
        Ok(())
    }

    fn failure_alarm(&self, table: &DatasetTable, phase: Phase, error: &ShareError) -> Alarm {
        alarms::table_failure(
            &self.ctx.cloud.envname,
            self.data,
            table,
            &self.shared_database,
            phase,
            &error.to_string(),
        )
    }
}
