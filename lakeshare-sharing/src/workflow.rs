//! Requester and approver side of the share lifecycle.
//!
//! These operations only move statuses and enqueue work. The remote
//! permission plumbing happens later, when a worker picks up the task.

use crate::error::{ShareError, ShareResult};
use crate::state::{SHARE_ITEM_SM, SHARE_OBJECT_SM};
use crate::worker::{ACTION_APPROVE, ACTION_REVOKE};
use lakeshare_store::ShareStore;
use lakeshare_types::{
    DatasetUri, EnvironmentUri, GroupUri, LocationUri, PrincipalType, ShareItemAction,
    ShareItemStatus, ShareItemUri, ShareObject, ShareObjectAction, ShareObjectItem,
    ShareObjectStatus, ShareUri, ShareableType, TableUri, Task,
};
use serde_json::json;
use tracing::info;

/// Who a share grants access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePrincipal {
    pub id: String,
    pub principal_type: PrincipalType,
    /// IAM role name in the target account.
    pub role_name: String,
    pub group_uri: GroupUri,
}

#[derive(Clone)]
pub struct ShareWorkflow {
    store: ShareStore,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl ShareWorkflow {
    pub fn new(store: ShareStore) -> Self {
        Self { store }
    }

    fn transition_share(
        &self,
        share: &ShareObject,
        action: ShareObjectAction,
    ) -> ShareResult<ShareObjectStatus> {
        let next = SHARE_OBJECT_SM.run_transition(share.status, action)?;
        if next != share.status {
            self.store.update_share_status(&share.uri, next)?;
        }
        Ok(next)
    }

    /// Applies `action` to every item it is valid for, leaving the others.
    fn transition_items(&self, share_uri: &ShareUri, action: ShareItemAction) -> ShareResult<usize> {
        let mut moved = 0;
        for item in self.store.list_items(share_uri)? {
            if !SHARE_ITEM_SM.accepts(item.status, action) {
                continue;
            }
            let next = SHARE_ITEM_SM.run_transition(item.status, action)?;
            if next != item.status {
                self.store.update_item_status(&item.uri, next)?;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Opens a Draft share. At most one live share exists per (dataset,
    /// target environment, principal).
    pub fn create_share(
        &self,
        dataset_uri: &DatasetUri,
        target_environment_uri: &EnvironmentUri,
        principal: SharePrincipal,
        owner: &str,
    ) -> ShareResult<ShareObject> {
        let dataset = self.store.get_dataset(dataset_uri)?;
        // Fails early on an unknown environment.
        self.store.get_environment(target_environment_uri)?;

        let now = now_millis();
        let share = ShareObject {
            uri: ShareUri::new(),
            dataset_uri: dataset.uri,
            source_environment_uri: dataset.environment_uri,
            target_environment_uri: target_environment_uri.clone(),
            principal_id: principal.id,
            principal_type: principal.principal_type,
            principal_role_name: principal.role_name,
            group_uri: principal.group_uri,
            status: ShareObjectStatus::Draft,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_share(&share)?;
        Ok(share)
    }

    /// Attaches a table or folder of the shared dataset as `PendingApproval`.
    pub fn add_item(
        &self,
        share_uri: &ShareUri,
        item_type: ShareableType,
        item_uri: &str,
        owner: &str,
    ) -> ShareResult<ShareObjectItem> {
        let share = self.store.get_share(share_uri)?;
        let (dataset_uri, item_name) = match item_type {
            ShareableType::Table => {
                let table = self.store.get_table(&TableUri::from(item_uri))?;
                (table.dataset_uri, table.glue_table_name)
            }
            ShareableType::StorageLocation => {
                let location = self.store.get_location(&LocationUri::from(item_uri))?;
                (location.dataset_uri, location.s3_prefix)
            }
        };
        if dataset_uri != share.dataset_uri {
            return Err(ShareError::InvalidOperation(format!(
                "{item_type} {item_uri} does not belong to dataset {}",
                share.dataset_uri
            )));
        }
        let existing = self.store.find_item(share_uri, item_uri)?;
        if let Some(existing) = &existing {
            if existing.status != ShareItemStatus::Deleted {
                return Err(ShareError::InvalidOperation(format!(
                    "{item_type} {item_uri} is already part of share {share_uri}"
                )));
            }
        }

        self.transition_share(&share, ShareObjectAction::AddItem)?;
        if let Some(mut item) = existing {
            item.status = SHARE_ITEM_SM.run_transition(item.status, ShareItemAction::AddItem)?;
            self.store.update_item_status(&item.uri, item.status)?;
            info!(share_uri = %share_uri, item_uri, "deleted item added back");
            return Ok(item);
        }

        let now = now_millis();
        let item = ShareObjectItem {
            uri: ShareItemUri::new(),
            share_uri: share_uri.clone(),
            item_uri: item_uri.to_string(),
            item_type,
            item_name,
            status: SHARE_ITEM_SM
                .run_transition(ShareItemStatus::Deleted, ShareItemAction::AddItem)?,
            resource_name: None,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_item(&item)?;
        info!(share_uri = %share_uri, item_uri, %item_type, "item added");
        Ok(item)
    }

    /// Detaches an item. Only Draft shares can lose items.
    pub fn remove_item(&self, item_uri: &ShareItemUri) -> ShareResult<()> {
        let item = self.store.get_item(item_uri)?;
        let share = self.store.get_share(&item.share_uri)?;
        if share.status != ShareObjectStatus::Draft {
            return Err(ShareError::InvalidOperation(format!(
                "items can only be removed from Draft shares, share {} is {}",
                share.uri, share.status
            )));
        }
        SHARE_ITEM_SM.run_transition(item.status, ShareItemAction::RemoveItem)?;
        self.store.delete_item(item_uri)?;
        info!(share_uri = %share.uri, item_uri = %item_uri, "item removed");
        Ok(())
    }

    pub fn submit(&self, share_uri: &ShareUri) -> ShareResult<()> {
        let share = self.store.get_share(share_uri)?;
        SHARE_OBJECT_SM.run_transition(share.status, ShareObjectAction::Submit)?;
        self.transition_items(share_uri, ShareItemAction::Submit)?;
        if !self
            .store
            .has_items(share_uri, &[ShareItemStatus::PendingApproval], None)?
        {
            return Err(ShareError::InvalidOperation(format!(
                "share {share_uri} has no items to submit"
            )));
        }
        self.transition_share(&share, ShareObjectAction::Submit)?;
        info!(share_uri = %share_uri, "share submitted");
        Ok(())
    }

    /// Approves every pending item and queues the grant.
    pub fn approve(&self, share_uri: &ShareUri) -> ShareResult<Task> {
        let share = self.store.get_share(share_uri)?;
        self.transition_share(&share, ShareObjectAction::Approve)?;
        let approved = self.transition_items(share_uri, ShareItemAction::Approve)?;
        info!(share_uri = %share_uri, approved, "share approved");
        Ok(self.store.enqueue_task(
            share_uri.as_str(),
            ACTION_APPROVE,
            json!({ "shareUri": share_uri }),
        )?)
    }

    pub fn reject(&self, share_uri: &ShareUri) -> ShareResult<()> {
        let share = self.store.get_share(share_uri)?;
        self.transition_share(&share, ShareObjectAction::Reject)?;
        self.transition_items(share_uri, ShareItemAction::Reject)?;
        info!(share_uri = %share_uri, "share rejected");
        Ok(())
    }

    /// Marks the given shared items for revocation and queues the revoke.
    pub fn revoke_items(&self, share_uri: &ShareUri, items: &[ShareItemUri]) -> ShareResult<Task> {
        let share = self.store.get_share(share_uri)?;
        if items.is_empty() {
            return Err(ShareError::InvalidOperation(
                "no items selected for revocation".to_string(),
            ));
        }
        SHARE_OBJECT_SM.run_transition(share.status, ShareObjectAction::RevokeItems)?;

        let mut updates = Vec::with_capacity(items.len());
        for uri in items {
            let item = self.store.get_item(uri)?;
            if item.share_uri != *share_uri {
                return Err(ShareError::InvalidOperation(format!(
                    "item {uri} does not belong to share {share_uri}"
                )));
            }
            let next = SHARE_ITEM_SM.run_transition(item.status, ShareItemAction::RevokeItems)?;
            updates.push((uri, next));
        }
        for (uri, next) in updates {
            self.store.update_item_status(uri, next)?;
        }
        self.transition_share(&share, ShareObjectAction::RevokeItems)?;
        info!(share_uri = %share_uri, count = items.len(), "items marked for revocation");
        Ok(self.store.enqueue_task(
            share_uri.as_str(),
            ACTION_REVOKE,
            json!({ "shareUri": share_uri, "revokedItemUris": items }),
        )?)
    }

    /// Deletes a share. Refused while any item still holds access.
    pub fn delete(&self, share_uri: &ShareUri) -> ShareResult<()> {
        let share = self.store.get_share(share_uri)?;
        if self
            .store
            .has_items(share_uri, ShareItemStatus::SHARED, None)?
        {
            return Err(ShareError::InvalidOperation(format!(
                "share {share_uri} still has shared items, revoke them first"
            )));
        }
        self.transition_share(&share, ShareObjectAction::Delete)?;
        self.transition_items(share_uri, ShareItemAction::Delete)?;
        info!(share_uri = %share_uri, "share deleted");
        Ok(())
    }
}
