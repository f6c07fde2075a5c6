use lakeshare_sharing::{SHARE_ITEM_SM, SHARE_OBJECT_SM};
use lakeshare_types::{ShareItemAction, ShareItemStatus, ShareObjectAction, ShareObjectStatus};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn share_happy_path() {
    use ShareObjectAction as A;
    use ShareObjectStatus as S;

    let mut status = S::Draft;
    for (action, expected) in [
        (A::Submit, S::Submitted),
        (A::Approve, S::Approved),
        (A::Start, S::ShareInProgress),
        (A::Finish, S::Processed),
        (A::RevokeItems, S::Revoked),
        (A::Start, S::RevokeInProgress),
        (A::FinishPending, S::Draft),
    ] {
        status = SHARE_OBJECT_SM.run_transition(status, action).unwrap();
        assert_eq!(status, expected, "after {action}");
    }
}

#[test]
fn item_happy_path() {
    use ShareItemAction as A;
    use ShareItemStatus as S;

    let mut status = S::PendingApproval;
    for (action, expected) in [
        (A::Approve, S::ShareApproved),
        (A::Start, S::ShareInProgress),
        (A::Success, S::ShareSucceeded),
        (A::RevokeItems, S::RevokeApproved),
        (A::Start, S::RevokeInProgress),
        (A::Failure, S::RevokeFailed),
        (A::RevokeItems, S::RevokeApproved),
        (A::Start, S::RevokeInProgress),
        (A::Success, S::RevokeSucceeded),
        (A::Delete, S::Deleted),
        (A::AddItem, S::PendingApproval),
    ] {
        status = SHARE_ITEM_SM.run_transition(status, action).unwrap();
        assert_eq!(status, expected, "after {action}");
    }
}

#[test]
fn already_in_target_is_a_no_op() {
    assert_eq!(
        SHARE_OBJECT_SM
            .run_transition(ShareObjectStatus::ShareInProgress, ShareObjectAction::Start)
            .unwrap(),
        ShareObjectStatus::ShareInProgress
    );
    assert_eq!(
        SHARE_ITEM_SM
            .run_transition(ShareItemStatus::ShareInProgress, ShareItemAction::Start)
            .unwrap(),
        ShareItemStatus::ShareInProgress
    );
    assert_eq!(
        SHARE_ITEM_SM
            .run_transition(ShareItemStatus::RevokeSucceeded, ShareItemAction::Success)
            .unwrap(),
        ShareItemStatus::RevokeSucceeded
    );
}

#[test]
fn invalid_transition_names_allowed_actions() {
    let err = SHARE_OBJECT_SM
        .run_transition(ShareObjectStatus::Draft, ShareObjectAction::Approve)
        .unwrap_err();
    assert_eq!(err.entity, "share");
    assert_eq!(err.current, "Draft");
    assert_eq!(err.action, "Approve");
    assert!(err.allowed.contains(&"Submit".to_string()));
    assert!(err.allowed.contains(&"Delete".to_string()));
    assert!(!err.allowed.contains(&"Approve".to_string()));
    assert!(err.to_string().starts_with("share cannot Approve from Draft"));
}

#[test]
fn shared_items_cannot_be_removed() {
    for status in [
        ShareItemStatus::ShareSucceeded,
        ShareItemStatus::ShareInProgress,
        ShareItemStatus::RevokeApproved,
        ShareItemStatus::RevokeInProgress,
        ShareItemStatus::RevokeFailed,
    ] {
        assert!(
            !SHARE_ITEM_SM.accepts(status, ShareItemAction::RemoveItem),
            "{status} must not be removable"
        );
    }
}

#[test]
fn start_depends_on_the_share_direction() {
    assert_eq!(
        SHARE_OBJECT_SM
            .run_transition(ShareObjectStatus::Revoked, ShareObjectAction::Start)
            .unwrap(),
        ShareObjectStatus::RevokeInProgress
    );
    assert!(
        SHARE_OBJECT_SM
            .run_transition(ShareObjectStatus::Processed, ShareObjectAction::Start)
            .is_err()
    );
}

fn share_status() -> impl Strategy<Value = ShareObjectStatus> {
    proptest::sample::select(ShareObjectStatus::ALL.to_vec())
}

fn share_action() -> impl Strategy<Value = ShareObjectAction> {
    proptest::sample::select(ShareObjectAction::ALL.to_vec())
}

fn item_status() -> impl Strategy<Value = ShareItemStatus> {
    proptest::sample::select(ShareItemStatus::ALL.to_vec())
}

fn item_action() -> impl Strategy<Value = ShareItemAction> {
    proptest::sample::select(ShareItemAction::ALL.to_vec())
}

proptest! {
    #[test]
    fn share_transitions_are_deterministic_and_idempotent(
        status in share_status(),
        action in share_action(),
    ) {
        let first = SHARE_OBJECT_SM.run_transition(status, action);
        let second = SHARE_OBJECT_SM.run_transition(status, action);
        prop_assert_eq!(&first, &second);
        if let Ok(next) = first {
            // Applying the same action again lands on the same state.
            prop_assert_eq!(SHARE_OBJECT_SM.run_transition(next, action), Ok(next));
        }
    }

    #[test]
    fn item_transitions_are_deterministic_and_idempotent(
        status in item_status(),
        action in item_action(),
    ) {
        let first = SHARE_ITEM_SM.run_transition(status, action);
        let second = SHARE_ITEM_SM.run_transition(status, action);
        prop_assert_eq!(&first, &second);
        if let Ok(next) = first {
            prop_assert_eq!(SHARE_ITEM_SM.run_transition(next, action), Ok(next));
        }
    }

    #[test]
    fn errors_list_exactly_the_allowed_actions(status in item_status(), action in item_action()) {
        match SHARE_ITEM_SM.run_transition(status, action) {
            Ok(_) => prop_assert!(SHARE_ITEM_SM.accepts(status, action)),
            Err(err) => {
                let allowed: Vec<String> = SHARE_ITEM_SM
                    .allowed_actions(status)
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                prop_assert_eq!(err.allowed, allowed);
                prop_assert!(!SHARE_ITEM_SM.allowed_actions(status).contains(&action));
            }
        }
    }
}
