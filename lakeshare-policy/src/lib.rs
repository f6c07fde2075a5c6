//! Typed policy documents for bucket, access-point, key and role policies.
//!
//! Remote services hand policies around as JSON text. Every mutation in the
//! sharing engine is a read-merge-write of a whole document keyed by a
//! stable statement id, so this crate offers exactly that:
//! - `PolicyDocument::upsert_statement` inserts a fresh statement or merges into an existing one
//! - `PolicyDocument::remove_statement_if_empty` drops a statement that no longer grants anything
//!
//! Unknown statement keys (`NotAction`, `NotPrincipal`, ...) survive a parse/serialize cycle.

mod document;
mod error;
mod statement;
mod value;

pub use document::{PolicyDocument, Upsert, POLICY_VERSION};
pub use error::{PolicyError, PolicyResult};
pub use statement::{Condition, Effect, Principal, Statement};
pub use value::ValueList;
