//! Mapping SDK errors onto `CloudError`.

use crate::error::CloudError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use std::error::Error;

/// Converts any SDK error into a classified `CloudError`.
pub(super) fn remote_error<E>(operation: &str, err: E) -> CloudError
where
    E: ProvideErrorMetadata + Error,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    CloudError::from_code(operation, err.code(), message)
}

/// True if the SDK error carries one of the given service codes.
pub(super) fn has_code<E: ProvideErrorMetadata>(err: &E, codes: &[&str]) -> bool {
    err.code().is_some_and(|code| codes.contains(&code))
}

/// Builder validation failures, raised before anything is sent.
pub(super) fn build_error(operation: &str, err: impl std::fmt::Display) -> CloudError {
    CloudError::InvalidRequest(format!("{operation}: {err}"))
}
