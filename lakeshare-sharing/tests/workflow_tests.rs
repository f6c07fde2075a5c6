mod support;

use lakeshare_sharing::worker::{ACTION_APPROVE, ACTION_REVOKE};
use lakeshare_sharing::{ShareError, SharePrincipal, ShareWorkflow};
use lakeshare_store::StoreError;
use lakeshare_types::{
    Dataset, DatasetTable, DatasetUri, EnvironmentUri, GroupUri, PrincipalType, ShareItemStatus,
    ShareItemUri, ShareObjectStatus, ShareUri, ShareableType, TableUri, TaskStatus,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::*;

fn principal(id: &str) -> SharePrincipal {
    SharePrincipal {
        id: id.to_string(),
        principal_type: PrincipalType::Group,
        role_name: format!("{id}-role"),
        group_uri: GroupUri::from(id),
    }
}

fn workflow(h: &Harness) -> ShareWorkflow {
    ShareWorkflow::new(h.store().clone())
}

fn draft_share(h: &Harness) -> ShareUri {
    workflow(h)
        .create_share(
            &DatasetUri::from("ds1"),
            &EnvironmentUri::from("consumer"),
            principal("grp1"),
            "alice",
        )
        .unwrap()
        .uri
}

#[test]
fn request_submit_approve() {
    let h = harness();
    let wf = workflow(&h);
    let share = draft_share(&h);
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Draft);

    let table = wf.add_item(&share, ShareableType::Table, "t1", "alice").unwrap();
    let folder = wf
        .add_item(&share, ShareableType::StorageLocation, "f1", "alice")
        .unwrap();
    assert_eq!(table.status, ShareItemStatus::PendingApproval);
    assert_eq!(table.item_name, "t1");
    assert_eq!(folder.item_name, "f1");

    wf.submit(&share).unwrap();
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Submitted);

    let task = wf.approve(&share).unwrap();
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Approved);
    assert_eq!(h.item_status(&table.uri), ShareItemStatus::ShareApproved);
    assert_eq!(h.item_status(&folder.uri), ShareItemStatus::ShareApproved);
    assert_eq!(task.action, ACTION_APPROVE);
    assert_eq!(task.target_uri, share.as_str());
    assert_eq!(task.payload, json!({ "shareUri": share.as_str() }));
    assert_eq!(task.status, TaskStatus::Pending);
}

#[test]
fn one_live_share_per_dataset_environment_and_principal() {
    let h = harness();
    draft_share(&h);

    let err = workflow(&h)
        .create_share(
            &DatasetUri::from("ds1"),
            &EnvironmentUri::from("consumer"),
            principal("grp1"),
            "bob",
        )
        .unwrap_err();
    assert!(matches!(err, ShareError::Store(StoreError::Conflict(_))));

    // A different principal is a different share.
    workflow(&h)
        .create_share(
            &DatasetUri::from("ds1"),
            &EnvironmentUri::from("consumer"),
            principal("grp2"),
            "bob",
        )
        .unwrap();
}

#[test]
fn unknown_target_environment_is_rejected() {
    let h = harness();
    let err = workflow(&h)
        .create_share(
            &DatasetUri::from("ds1"),
            &EnvironmentUri::from("nowhere"),
            principal("grp1"),
            "alice",
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ShareError::Store(StoreError::NotFound { kind: "environment", .. })
    ));
}

#[test]
fn items_must_belong_to_the_dataset_and_be_unique() {
    let h = harness();
    let wf = workflow(&h);
    let share = draft_share(&h);
    h.store()
        .put_dataset(&Dataset {
            uri: DatasetUri::from("ds2"),
            glue_database_name: "ds2_db".to_string(),
            ..dataset()
        })
        .unwrap();
    h.store()
        .put_table(&DatasetTable {
            uri: TableUri::from("x1"),
            dataset_uri: DatasetUri::from("ds2"),
            label: "x1".to_string(),
            glue_database_name: "ds2_db".to_string(),
            glue_table_name: "x1".to_string(),
        })
        .unwrap();

    let err = wf
        .add_item(&share, ShareableType::Table, "x1", "alice")
        .unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));

    wf.add_item(&share, ShareableType::Table, "t1", "alice").unwrap();
    let err = wf
        .add_item(&share, ShareableType::Table, "t1", "alice")
        .unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert_eq!(h.store().list_items(&share).unwrap().len(), 1);
}

#[test]
fn submit_without_items_is_refused() {
    let h = harness();
    let share = draft_share(&h);

    let err = workflow(&h).submit(&share).unwrap_err();

    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Draft);
}

#[test]
fn items_are_only_removed_from_draft_shares() {
    let h = harness();
    let wf = workflow(&h);
    let share = draft_share(&h);
    let t1 = wf.add_item(&share, ShareableType::Table, "t1", "alice").unwrap();
    let t2 = wf.add_item(&share, ShareableType::Table, "t2", "alice").unwrap();
    wf.submit(&share).unwrap();

    let err = wf.remove_item(&t1.uri).unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));

    wf.reject(&share).unwrap();
    // Adding to a rejected share reopens it as a draft.
    wf.add_item(&share, ShareableType::StorageLocation, "f1", "alice")
        .unwrap();
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Draft);

    wf.remove_item(&t2.uri).unwrap();
    assert!(matches!(
        h.store().get_item(&t2.uri),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(h.store().list_items(&share).unwrap().len(), 2);
}

#[test]
fn rejected_share_can_be_resubmitted() {
    let h = harness();
    let wf = workflow(&h);
    let share = draft_share(&h);
    let item = wf.add_item(&share, ShareableType::Table, "t1", "alice").unwrap();
    wf.submit(&share).unwrap();

    wf.reject(&share).unwrap();
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Rejected);
    assert_eq!(h.item_status(&item.uri), ShareItemStatus::ShareRejected);

    wf.submit(&share).unwrap();
    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Submitted);
    assert_eq!(h.item_status(&item.uri), ShareItemStatus::PendingApproval);
}

#[test]
fn approve_requires_a_submitted_share() {
    let h = harness();
    let share = draft_share(&h);

    let err = workflow(&h).approve(&share).unwrap_err();

    assert!(matches!(err, ShareError::StateTransition(_)));
    assert!(h.store().list_tasks(TaskStatus::Pending).unwrap().is_empty());
}

#[test]
fn revoke_items_marks_items_and_queues_the_revoke() {
    let h = harness();
    let items = h.share(
        "sh1",
        "consumer",
        "grp1",
        ShareObjectStatus::Processed,
        &[("t1", ShareableType::Table), ("t2", ShareableType::Table)],
        ShareItemStatus::ShareSucceeded,
    );
    let share = ShareUri::from("sh1");

    let task = workflow(&h).revoke_items(&share, &items[..1]).unwrap();

    assert_eq!(task.action, ACTION_REVOKE);
    assert_eq!(
        task.payload,
        json!({ "shareUri": "sh1", "revokedItemUris": ["sh1-t1"] })
    );
    assert_eq!(h.share_status("sh1"), ShareObjectStatus::Revoked);
    assert_eq!(h.item_status(&items[0]), ShareItemStatus::RevokeApproved);
    assert_eq!(h.item_status(&items[1]), ShareItemStatus::ShareSucceeded);
}

#[test]
fn revoke_items_validates_every_item_first() {
    let h = harness();
    let items = h.share(
        "sh1",
        "consumer",
        "grp1",
        ShareObjectStatus::Processed,
        &[("t1", ShareableType::Table)],
        ShareItemStatus::ShareSucceeded,
    );
    let foreign = h.share(
        "sh2",
        "consumer2",
        "grp2",
        ShareObjectStatus::Processed,
        &[("t1", ShareableType::Table)],
        ShareItemStatus::ShareSucceeded,
    );
    let pending = h.share(
        "sh3",
        "consumer",
        "grp3",
        ShareObjectStatus::Processed,
        &[("t2", ShareableType::Table)],
        ShareItemStatus::PendingApproval,
    );
    let wf = workflow(&h);
    let share = ShareUri::from("sh1");

    let err = wf
        .revoke_items(&share, &[items[0].clone(), foreign[0].clone()])
        .unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert_eq!(h.item_status(&items[0]), ShareItemStatus::ShareSucceeded);
    assert_eq!(h.share_status("sh1"), ShareObjectStatus::Processed);

    let err = wf
        .revoke_items(&ShareUri::from("sh3"), &pending)
        .unwrap_err();
    assert!(matches!(err, ShareError::StateTransition(_)));

    let err = wf.revoke_items(&share, &[]).unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert!(h.store().list_tasks(TaskStatus::Pending).unwrap().is_empty());
}

#[test]
fn delete_is_refused_while_items_are_shared() {
    let h = harness();
    h.share(
        "sh1",
        "consumer",
        "grp1",
        ShareObjectStatus::Processed,
        &[("t1", ShareableType::Table)],
        ShareItemStatus::ShareSucceeded,
    );

    let err = workflow(&h).delete(&ShareUri::from("sh1")).unwrap_err();

    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert_eq!(h.share_status("sh1"), ShareObjectStatus::Processed);
}

#[test]
fn delete_marks_share_and_items_deleted() {
    let h = harness();
    let wf = workflow(&h);
    let share = draft_share(&h);
    let item = wf.add_item(&share, ShareableType::Table, "t1", "alice").unwrap();

    wf.delete(&share).unwrap();

    assert_eq!(h.share_status(share.as_str()), ShareObjectStatus::Deleted);
    assert_eq!(h.item_status(&item.uri), ShareItemStatus::Deleted);

    // The slot is free again for a new share.
    draft_share(&h);
}

#[test]
fn removed_item_uri_is_unknown() {
    let h = harness();
    let err = workflow(&h)
        .remove_item(&ShareItemUri::from("missing"))
        .unwrap_err();
    assert!(matches!(
        err,
        ShareError::Store(StoreError::NotFound { kind: "share item", .. })
    ));
}
