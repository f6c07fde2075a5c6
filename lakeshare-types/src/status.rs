//! Lifecycle statuses and actions.
//!
//! Every enum here is persisted by its `as_str()` form, so the strings are
//! part of the storage format and must not change.

use crate::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseError::new($kind, other)),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum!(
    /// Status of a share object.
    ShareObjectStatus, "share status" {
        Draft => "Draft",
        Submitted => "Submitted",
        Approved => "Approved",
        Rejected => "Rejected",
        Revoked => "Revoked",
        ShareInProgress => "Share_In_Progress",
        RevokeInProgress => "Revoke_In_Progress",
        Processed => "Processed",
        Deleted => "Deleted",
    }
);

string_enum!(
    /// Action applied to a share object.
    ShareObjectAction, "share action" {
        Submit => "Submit",
        Approve => "Approve",
        Reject => "Reject",
        RevokeItems => "RevokeItems",
        Start => "Start",
        Finish => "Finish",
        FinishPending => "FinishPending",
        AddItem => "AddItem",
        Delete => "Delete",
    }
);

string_enum!(
    /// Status of a single share item.
    ShareItemStatus, "share item status" {
        PendingApproval => "PendingApproval",
        ShareApproved => "Share_Approved",
        ShareRejected => "Share_Rejected",
        ShareInProgress => "Share_In_Progress",
        ShareSucceeded => "Share_Succeeded",
        ShareFailed => "Share_Failed",
        RevokeApproved => "Revoke_Approved",
        RevokeInProgress => "Revoke_In_Progress",
        RevokeSucceeded => "Revoke_Share_Succeeded",
        RevokeFailed => "Revoke_Share_Failed",
        Deleted => "Deleted",
    }
);

impl ShareItemStatus {
    /// Statuses in which the consumer holds, or may still hold, access.
    pub const SHARED: &'static [ShareItemStatus] = &[
        ShareItemStatus::ShareSucceeded,
        ShareItemStatus::ShareInProgress,
        ShareItemStatus::RevokeFailed,
        ShareItemStatus::RevokeInProgress,
        ShareItemStatus::RevokeApproved,
    ];

    /// Statuses from which an item may be queued for revocation.
    pub const REVOKABLE: &'static [ShareItemStatus] =
        &[ShareItemStatus::ShareSucceeded, ShareItemStatus::RevokeFailed];

    pub fn is_shared(&self) -> bool {
        Self::SHARED.contains(self)
    }

    pub fn is_revokable(&self) -> bool {
        Self::REVOKABLE.contains(self)
    }
}

string_enum!(
    /// Action applied to a single share item.
    ShareItemAction, "share item action" {
        AddItem => "AddItem",
        Submit => "Submit",
        Approve => "Approve",
        Reject => "Reject",
        Start => "Start",
        Success => "Success",
        Failure => "Failure",
        RemoveItem => "RemoveItem",
        RevokeItems => "RevokeItems",
        Delete => "Delete",
    }
);

string_enum!(
    /// Kind of resource a share item points at.
    ShareableType, "shareable type" {
        Table => "DatasetTable",
        StorageLocation => "DatasetStorageLocation",
    }
);

string_enum!(
    /// Kind of principal that requested a share.
    PrincipalType, "principal type" {
        Group => "Group",
        ConsumptionRole => "ConsumptionRole",
    }
);
