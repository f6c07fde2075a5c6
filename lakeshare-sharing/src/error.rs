//! Error types for share orchestration.

use crate::state::StateTransitionError;
use lakeshare_cloud::CloudError;
use lakeshare_policy::PolicyError;
use lakeshare_store::StoreError;
use thiserror::Error;

pub type ShareResult<T> = Result<T, ShareError>;

#[derive(Debug, Error)]
pub enum ShareError {
    /// The producer-side object disappeared after the item was approved.
    #[error("{kind} no longer exists: {name}")]
    ResourceGone { kind: &'static str, name: String },

    #[error("remote call failed: {0}")]
    RemoteCall(#[from] CloudError),

    #[error("policy document error: {0}")]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),

    #[error(
        "resource-share invitation from account {source_account} was not accepted in account {target_account}"
    )]
    InvitationNotAccepted {
        source_account: String,
        target_account: String,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unknown task action: {0}")]
    UnknownTaskAction(String),
}

impl ShareError {
    pub(crate) fn gone(kind: &'static str, name: impl Into<String>) -> Self {
        ShareError::ResourceGone {
            kind,
            name: name.into(),
        }
    }

    /// Whether a failure while processing one item should only fail that
    /// item. State-machine and store errors mean the persisted state can no
    /// longer be trusted and stop the whole share.
    pub fn is_item_recoverable(&self) -> bool {
        !matches!(self, ShareError::StateTransition(_) | ShareError::Store(_))
    }
}
