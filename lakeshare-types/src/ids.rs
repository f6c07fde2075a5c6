//! Newtype identifiers.
//!
//! Uris are short opaque strings. They are generated locally from a random
//! UUID but any string read back from storage is accepted as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uri_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generates a fresh random uri.
            pub fn new() -> Self {
                let mut raw = Uuid::new_v4().simple().to_string();
                raw.truncate(8);
                Self(raw)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

uri_type!(
    /// Identifier of a share object.
    ShareUri
);
uri_type!(
    /// Identifier of a single item attached to a share.
    ShareItemUri
);
uri_type!(
    /// Identifier of a producer dataset.
    DatasetUri
);
uri_type!(
    /// Identifier of a catalog table that belongs to a dataset.
    TableUri
);
uri_type!(
    /// Identifier of a storage prefix that belongs to a dataset.
    LocationUri
);
uri_type!(
    /// Identifier of an environment (one account/region pair).
    EnvironmentUri
);
uri_type!(
    /// Identifier of a team.
    GroupUri
);
uri_type!(TaskUri);
