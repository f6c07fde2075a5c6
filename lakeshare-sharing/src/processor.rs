//! Per-kind item loops.
//!
//! A processor walks every item of one resource kind through the item state
//! machine and calls its manager for the actual grant or revoke. A failing
//! item is marked `*_Failed`, alarmed, and skipped; the loop always reaches
//! the last item. Only errors that make the persisted state untrustworthy
//! (state-machine violations, store failures) escape.

use crate::alarms::{self, Phase};
use crate::context::SharingContext;
use crate::error::{ShareError, ShareResult};
use crate::managers::ShareManager;
use crate::state::SHARE_ITEM_SM;
use lakeshare_types::{
    ShareData, ShareItemAction, ShareItemStatus, ShareObjectItem, ShareableType,
};
use tracing::{debug, error, info, warn};

pub struct ShareProcessor<'a, M: ShareManager> {
    ctx: &'a SharingContext,
    manager: M,
}

impl<'a, M: ShareManager> ShareProcessor<'a, M> {
    pub fn new(ctx: &'a SharingContext, manager: M) -> Self {
        Self { ctx, manager }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Grants every item. True only if every item ended `Share_Succeeded`.
    pub async fn process_approved(
        &self,
        items: &[(ShareObjectItem, M::Resource)],
    ) -> ShareResult<bool> {
        if items.is_empty() {
            return Ok(true);
        }
        info!(kind = %self.manager.kind(), count = items.len(), "processing approved items");

        if let Err(e) = self.manager.prepare().await {
            if !e.is_item_recoverable() {
                return Err(e);
            }
            error!(kind = %self.manager.kind(), "share setup failed, failing every item: {e}");
            for (item, resource) in items {
                let status = self.transition(item, item.status, ShareItemAction::Start)?;
                self.fail(item, status, resource, Phase::Share, &e).await?;
            }
            return Ok(false);
        }

        let mut all_succeeded = true;
        for (item, resource) in items {
            let status = self.transition(item, item.status, ShareItemAction::Start)?;
            match self.manager.grant(item, resource).await {
                Ok(resource_name) => {
                    self.transition(item, status, ShareItemAction::Success)?;
                    self.ctx
                        .store
                        .set_item_resource_name(&item.uri, Some(&resource_name))?;
                }
                Err(e) if e.is_item_recoverable() => {
                    self.fail(item, status, resource, Phase::Share, &e).await?;
                    all_succeeded = false;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(all_succeeded)
    }

    /// Revokes every item. True only if every item ended `Revoke_Share_Succeeded`.
    pub async fn process_revoked(
        &self,
        items: &[(ShareObjectItem, M::Resource)],
    ) -> ShareResult<bool> {
        if items.is_empty() {
            return Ok(true);
        }
        info!(kind = %self.manager.kind(), count = items.len(), "processing revoked items");

        let mut all_succeeded = true;
        for (item, resource) in items {
            let status = self.transition(item, item.status, ShareItemAction::Start)?;
            match self.manager.revoke(item, resource).await {
                Ok(()) => {
                    self.transition(item, status, ShareItemAction::Success)?;
                    self.ctx.store.set_item_resource_name(&item.uri, None)?;
                }
                Err(e) if e.is_item_recoverable() => {
                    self.fail(item, status, resource, Phase::Revoke, &e).await?;
                    all_succeeded = false;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(all_succeeded)
    }

    pub async fn clean_up(&self) -> ShareResult<()> {
        self.manager.clean_up().await
    }

    fn transition(
        &self,
        item: &ShareObjectItem,
        current: ShareItemStatus,
        action: ShareItemAction,
    ) -> ShareResult<ShareItemStatus> {
        transition_item(self.ctx, item, current, action)
    }

    async fn fail(
        &self,
        item: &ShareObjectItem,
        status: ShareItemStatus,
        resource: &M::Resource,
        phase: Phase,
        cause: &ShareError,
    ) -> ShareResult<()> {
        error!(
            share_uri = %item.share_uri,
            item_uri = %item.uri,
            "failed to {} {}: {cause}",
            match phase {
                Phase::Share => "share",
                Phase::Revoke => "revoke",
            },
            self.manager.describe(resource)
        );
        self.transition(item, status, ShareItemAction::Failure)?;
        self.ctx
            .alarms
            .publish(self.manager.failure_alarm(resource, phase, cause))
            .await;
        Ok(())
    }
}

fn transition_item(
    ctx: &SharingContext,
    item: &ShareObjectItem,
    current: ShareItemStatus,
    action: ShareItemAction,
) -> ShareResult<ShareItemStatus> {
    let next = SHARE_ITEM_SM.run_transition(current, action)?;
    if next != current {
        ctx.store.update_item_status(&item.uri, next)?;
        debug!(item_uri = %item.uri, from = %current, to = %next, "item transition");
    }
    Ok(next)
}

/// Settles items whose table or folder is gone from the catalog.
///
/// Granting one is impossible, so on share it fails and alarms. On revoke
/// there is nothing left to take back and it succeeds. Returns true only if
/// no item failed.
pub async fn settle_unresolved(
    ctx: &SharingContext,
    data: &ShareData,
    items: &[ShareObjectItem],
    phase: Phase,
) -> ShareResult<bool> {
    let mut all_succeeded = true;
    for item in items {
        let status = transition_item(ctx, item, item.status, ShareItemAction::Start)?;
        match phase {
            Phase::Share => {
                let kind = match item.item_type {
                    ShareableType::Table => "table",
                    ShareableType::StorageLocation => "folder",
                };
                let cause = ShareError::gone(kind, item.item_name.clone());
                error!(
                    share_uri = %item.share_uri,
                    item_uri = %item.uri,
                    "failed to share {} {}: {cause}",
                    item.item_type,
                    item.item_name
                );
                transition_item(ctx, item, status, ShareItemAction::Failure)?;
                ctx.alarms
                    .publish(alarms::missing_item_failure(
                        &ctx.cloud.envname,
                        data,
                        item,
                        phase,
                        &cause.to_string(),
                    ))
                    .await;
                all_succeeded = false;
            }
            Phase::Revoke => {
                warn!(
                    share_uri = %item.share_uri,
                    item_uri = %item.uri,
                    "{} {} is gone, nothing to revoke",
                    item.item_type,
                    item.item_name
                );
                transition_item(ctx, item, status, ShareItemAction::Success)?;
                ctx.store.set_item_resource_name(&item.uri, None)?;
            }
        }
    }
    Ok(all_succeeded)
}
