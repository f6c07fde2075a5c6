//! Policy document error types.

use thiserror::Error;

pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("malformed policy document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),
}
