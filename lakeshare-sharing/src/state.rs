//! Share and share-item state machines.
//!
//! Both machines are plain transition tables. `run_transition` only computes
//! the next state; persisting it is the caller's job.
//!
//! Applying an action to a state that is already one of the action's
//! targets returns the state unchanged, so an interrupted run can be
//! re-invoked without tripping over the steps it already recorded.

use lakeshare_types::{ShareItemAction, ShareItemStatus, ShareObjectAction, ShareObjectStatus};
use std::fmt;
use thiserror::Error;

/// `sources` move to `target` under one action.
#[derive(Debug)]
pub struct Transition<S: 'static> {
    pub target: S,
    pub sources: &'static [S],
}

/// An action and every transition it can take.
pub type Rule<S, A> = (A, &'static [Transition<S>]);

#[derive(Debug)]
pub struct StateMachine<S: 'static, A: 'static> {
    entity: &'static str,
    rules: &'static [Rule<S, A>],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot {action} from {current}, allowed actions: [{}]", .allowed.join(", "))]
pub struct StateTransitionError {
    pub entity: &'static str,
    pub current: String,
    pub action: String,
    pub allowed: Vec<String>,
}

impl<S, A> StateMachine<S, A>
where
    S: Copy + Eq + fmt::Display,
    A: Copy + Eq + fmt::Display,
{
    pub const fn new(entity: &'static str, rules: &'static [Rule<S, A>]) -> Self {
        Self { entity, rules }
    }

    fn transitions(&self, action: A) -> &'static [Transition<S>] {
        self.rules
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, transitions)| *transitions)
            .unwrap_or(&[])
    }

    /// Next state for `action` applied to `current`.
    pub fn run_transition(&self, current: S, action: A) -> Result<S, StateTransitionError> {
        let transitions = self.transitions(action);
        if transitions.iter().any(|t| t.target == current) {
            return Ok(current);
        }
        transitions
            .iter()
            .find(|t| t.sources.contains(&current))
            .map(|t| t.target)
            .ok_or_else(|| StateTransitionError {
                entity: self.entity,
                current: current.to_string(),
                action: action.to_string(),
                allowed: self
                    .allowed_actions(current)
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })
    }

    /// Actions that move `current` somewhere else.
    pub fn allowed_actions(&self, current: S) -> Vec<A> {
        self.rules
            .iter()
            .filter(|(_, transitions)| transitions.iter().any(|t| t.sources.contains(&current)))
            .map(|(action, _)| *action)
            .collect()
    }

    /// True if `action` would succeed on `current`, no-ops included.
    pub fn accepts(&self, current: S, action: A) -> bool {
        self.run_transition(current, action).is_ok()
    }
}

// ── Share objects ────────────────────────────────────────────────

use ShareObjectAction as SA;
use ShareObjectStatus as SS;

const SHARE_OBJECT_RULES: &[Rule<ShareObjectStatus, ShareObjectAction>] = &[
    (
        SA::Submit,
        &[Transition {
            target: SS::Submitted,
            sources: &[SS::Draft, SS::Rejected],
        }],
    ),
    (
        SA::Approve,
        &[Transition {
            target: SS::Approved,
            sources: &[SS::Submitted],
        }],
    ),
    (
        SA::Reject,
        &[Transition {
            target: SS::Rejected,
            sources: &[SS::Submitted],
        }],
    ),
    (
        SA::RevokeItems,
        &[Transition {
            target: SS::Revoked,
            sources: &[SS::Draft, SS::Submitted, SS::Rejected, SS::Processed],
        }],
    ),
    (
        SA::Start,
        &[
            Transition {
                target: SS::ShareInProgress,
                sources: &[SS::Approved],
            },
            Transition {
                target: SS::RevokeInProgress,
                sources: &[SS::Revoked],
            },
        ],
    ),
    (
        SA::Finish,
        &[Transition {
            target: SS::Processed,
            sources: &[SS::ShareInProgress, SS::RevokeInProgress],
        }],
    ),
    (
        SA::FinishPending,
        &[Transition {
            target: SS::Draft,
            sources: &[SS::RevokeInProgress],
        }],
    ),
    (
        SA::AddItem,
        &[Transition {
            target: SS::Draft,
            sources: &[SS::Submitted, SS::Rejected, SS::Processed],
        }],
    ),
    (
        SA::Delete,
        &[Transition {
            target: SS::Deleted,
            sources: &[SS::Rejected, SS::Draft, SS::Submitted, SS::Processed],
        }],
    ),
];

pub static SHARE_OBJECT_SM: StateMachine<ShareObjectStatus, ShareObjectAction> =
    StateMachine::new("share", SHARE_OBJECT_RULES);

// ── Share items ──────────────────────────────────────────────────

use ShareItemAction as IA;
use ShareItemStatus as IS;

const REMOVABLE_ITEMS: &[ShareItemStatus] = &[
    IS::PendingApproval,
    IS::ShareRejected,
    IS::ShareFailed,
    IS::RevokeSucceeded,
];

const SHARE_ITEM_RULES: &[Rule<ShareItemStatus, ShareItemAction>] = &[
    (
        IA::AddItem,
        &[Transition {
            target: IS::PendingApproval,
            sources: &[IS::Deleted],
        }],
    ),
    (
        IA::Submit,
        &[Transition {
            target: IS::PendingApproval,
            sources: &[IS::ShareRejected, IS::ShareFailed],
        }],
    ),
    (
        IA::Approve,
        &[Transition {
            target: IS::ShareApproved,
            sources: &[IS::PendingApproval],
        }],
    ),
    (
        IA::Reject,
        &[Transition {
            target: IS::ShareRejected,
            sources: &[IS::PendingApproval],
        }],
    ),
    (
        IA::Start,
        &[
            Transition {
                target: IS::ShareInProgress,
                sources: &[IS::ShareApproved],
            },
            Transition {
                target: IS::RevokeInProgress,
                sources: &[IS::RevokeApproved],
            },
        ],
    ),
    (
        IA::Success,
        &[
            Transition {
                target: IS::ShareSucceeded,
                sources: &[IS::ShareInProgress],
            },
            Transition {
                target: IS::RevokeSucceeded,
                sources: &[IS::RevokeInProgress],
            },
        ],
    ),
    (
        IA::Failure,
        &[
            Transition {
                target: IS::ShareFailed,
                sources: &[IS::ShareInProgress],
            },
            Transition {
                target: IS::RevokeFailed,
                sources: &[IS::RevokeInProgress],
            },
        ],
    ),
    (
        IA::RevokeItems,
        &[Transition {
            target: IS::RevokeApproved,
            sources: &[IS::ShareSucceeded, IS::RevokeFailed],
        }],
    ),
    (
        IA::RemoveItem,
        &[Transition {
            target: IS::Deleted,
            sources: REMOVABLE_ITEMS,
        }],
    ),
    (
        IA::Delete,
        &[Transition {
            target: IS::Deleted,
            sources: REMOVABLE_ITEMS,
        }],
    ),
];

pub static SHARE_ITEM_SM: StateMachine<ShareItemStatus, ShareItemAction> =
    StateMachine::new("share item", SHARE_ITEM_RULES);
