//! Top-level entry points: approve, revoke, refresh.

use crate::context::SharingContext;
use crate::error::ShareResult;
use crate::managers::{PrefixShareManager, TableShareManager};
use crate::alarms::Phase;
use crate::processor::{ShareProcessor, settle_unresolved};
use crate::state::SHARE_OBJECT_SM;
use lakeshare_types::{
    ShareItemStatus, ShareObjectAction, ShareObjectStatus, ShareUri, ShareableType,
};
use serde::Serialize;
use tracing::{error, info, warn};

fn transition_share(
    ctx: &SharingContext,
    uri: &ShareUri,
    current: ShareObjectStatus,
    action: ShareObjectAction,
) -> ShareResult<ShareObjectStatus> {
    let next = SHARE_OBJECT_SM.run_transition(current, action)?;
    if next != current {
        ctx.store.update_share_status(uri, next)?;
        info!(share_uri = %uri, from = %current, to = %next, "share transition");
    }
    Ok(next)
}

/// Grants every `Share_Approved` item of an `Approved` share.
///
/// Returns true only if every item was shared. Individual item failures are
/// recorded on the items; the share itself always finishes.
pub async fn approve_share(ctx: &SharingContext, uri: &ShareUri) -> ShareResult<bool> {
    let data = ctx.store.get_share_data(uri)?;
    info!(
        share_uri = %uri,
        dataset_uri = %data.dataset.uri,
        source_account = %data.source_environment.account_id,
        target_account = %data.target_environment.account_id,
        "approving share"
    );
    let status = transition_share(ctx, uri, data.share.status, ShareObjectAction::Start)?;

    // In-progress items are picked up too so an interrupted run can resume.
    let items = ctx.store.get_share_items(
        uri,
        &[ShareItemStatus::ShareApproved, ShareItemStatus::ShareInProgress],
    )?;
    let unresolved_ok = settle_unresolved(ctx, &data, &items.unresolved, Phase::Share).await?;

    let folders = ShareProcessor::new(ctx, PrefixShareManager::new(ctx, &data));
    let folders_ok = folders.process_approved(&items.folders).await?;

    let tables = ShareProcessor::new(ctx, TableShareManager::new(ctx, &data));
    let tables_ok = tables.process_approved(&items.tables).await?;

    transition_share(ctx, uri, status, ShareObjectAction::Finish)?;
    info!(share_uri = %uri, folders_ok, tables_ok, unresolved_ok, "share approved");
    Ok(folders_ok && tables_ok && unresolved_ok)
}

/// Revokes every `Revoke_Approved` item of a `Revoked` share and tears
/// down the shared database or bucket statements once nothing of that kind
/// is shared any more.
pub async fn revoke_share(ctx: &SharingContext, uri: &ShareUri) -> ShareResult<bool> {
    let data = ctx.store.get_share_data(uri)?;
    info!(
        share_uri = %uri,
        dataset_uri = %data.dataset.uri,
        target_account = %data.target_environment.account_id,
        "revoking share"
    );
    let status = transition_share(ctx, uri, data.share.status, ShareObjectAction::Start)?;

    let items = ctx.store.get_share_items(
        uri,
        &[ShareItemStatus::RevokeApproved, ShareItemStatus::RevokeInProgress],
    )?;
    // Settled first so the clean-up checks below see them as revoked.
    settle_unresolved(ctx, &data, &items.unresolved, Phase::Revoke).await?;

    let folders = ShareProcessor::new(ctx, PrefixShareManager::new(ctx, &data));
    let mut folders_ok = folders.process_revoked(&items.folders).await?;
    if items.has_kind(ShareableType::StorageLocation)
        && !ctx
            .store
            .has_items(uri, ShareItemStatus::SHARED, Some(ShareableType::StorageLocation))?
    {
        folders_ok &= clean_up(&folders, uri, ShareableType::StorageLocation).await?;
    }

    let tables = ShareProcessor::new(ctx, TableShareManager::new(ctx, &data));
    let mut tables_ok = tables.process_revoked(&items.tables).await?;
    if items.has_kind(ShareableType::Table)
        && !ctx
            .store
            .has_items(uri, ShareItemStatus::SHARED, Some(ShareableType::Table))?
    {
        tables_ok &= clean_up(&tables, uri, ShareableType::Table).await?;
    }

    let pending = ctx
        .store
        .has_items(uri, &[ShareItemStatus::PendingApproval], None)?;
    let finish = if pending {
        ShareObjectAction::FinishPending
    } else {
        ShareObjectAction::Finish
    };
    transition_share(ctx, uri, status, finish)?;
    info!(share_uri = %uri, folders_ok, tables_ok, pending, "share revoked");
    Ok(folders_ok && tables_ok)
}

/// Clean-up failures leave every item revoked, so they are reported but do
/// not fail the share.
async fn clean_up<M: crate::managers::ShareManager>(
    processor: &ShareProcessor<'_, M>,
    uri: &ShareUri,
    kind: ShareableType,
) -> ShareResult<bool> {
    match processor.clean_up().await {
        Ok(()) => Ok(true),
        Err(e) if e.is_item_recoverable() => {
            error!(share_uri = %uri, %kind, "clean-up failed: {e}");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Outcome of one `refresh_shares` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Every item processed successfully.
    pub succeeded: Vec<ShareUri>,
    /// Finished with at least one failed item.
    pub partial: Vec<ShareUri>,
    /// Stopped by a share-level error, with its message.
    pub failed: Vec<(ShareUri, String)>,
}

/// Re-runs approve or revoke for every `Approved` or `Revoked` share. A
/// share-level failure is logged and recorded, then the pass moves on.
pub async fn refresh_shares(ctx: &SharingContext) -> ShareResult<RefreshSummary> {
    let shares = ctx
        .store
        .list_shares_by_status(&[ShareObjectStatus::Approved, ShareObjectStatus::Revoked])?;
    info!(count = shares.len(), "refreshing shares");

    let mut summary = RefreshSummary::default();
    for share in shares {
        let result = match share.status {
            ShareObjectStatus::Approved => approve_share(ctx, &share.uri).await,
            ShareObjectStatus::Revoked => revoke_share(ctx, &share.uri).await,
            other => {
                warn!(share_uri = %share.uri, status = %other, "unexpected status, skipping");
                continue;
            }
        };
        match result {
            Ok(true) => summary.succeeded.push(share.uri),
            Ok(false) => summary.partial.push(share.uri),
            Err(e) => {
                error!(share_uri = %share.uri, "share refresh failed: {e}");
                summary.failed.push((share.uri, e.to_string()));
            }
        }
    }
    info!(
        succeeded = summary.succeeded.len(),
        partial = summary.partial.len(),
        failed = summary.failed.len(),
        "refresh finished"
    );
    Ok(summary)
}
