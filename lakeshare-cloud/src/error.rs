//! Remote-call error types.

use lakeshare_policy::PolicyError;
use thiserror::Error;

/// Result type for facade operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Service error codes worth another attempt.
const TRANSIENT_CODES: &[&str] = &[
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalFailure",
    "InternalError",
    "InternalServiceException",
    "ConcurrentModificationException",
    "OperationTimeoutException",
    "RequestTimeout",
    "Transport",
];

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "SlowDown",
];

/// Errors raised by the policy client facade.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{operation} failed ({code}): {message}")]
    RemoteCall {
        operation: String,
        code: String,
        message: String,
    },

    #[error("{operation} throttled: {message}")]
    Throttled { operation: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to assume pivot role in account {account}: {message}")]
    Credentials { account: String, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("policy document error: {0}")]
    Policy(#[from] PolicyError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CloudError {
    /// Classifies a service error code into `Throttled` or `RemoteCall`.
    pub fn from_code(operation: &str, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        let code = code.unwrap_or("Transport");
        if THROTTLING_CODES.contains(&code) {
            return CloudError::Throttled {
                operation: operation.to_string(),
                message,
            };
        }
        CloudError::RemoteCall {
            operation: operation.to_string(),
            code: code.to_string(),
            message,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CloudError::Throttled { .. } => true,
            CloudError::RemoteCall { code, .. } => TRANSIENT_CODES.contains(&code.as_str()),
            _ => false,
        }
    }

    /// Service error code for remote failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::RemoteCall { code, .. } => Some(code),
            CloudError::Throttled { .. } => Some("Throttling"),
            _ => None,
        }
    }
}
