//! Sharing engine configuration.

use lakeshare_cloud::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inline role policy that carries every bucket/access point a consumer role was granted.
pub const DEFAULT_IAM_POLICY_NAME: &str = "targetDatasetAccessControlPolicy";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Wait before the single re-grant when no invitation is visible yet.
    pub invitation_retry_delay_ms: u64,

    /// Poll used to wait for a freshly created access point to resolve.
    pub access_point_poll: RetryPolicy,

    /// Name of the consumer role's inline policy.
    pub iam_policy_name: String,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            invitation_retry_delay_ms: 5_000,
            access_point_poll: RetryPolicy {
                max_attempts: 5,
                initial_backoff_ms: 1_000,
                max_backoff_ms: 8_000,
            },
            iam_policy_name: DEFAULT_IAM_POLICY_NAME.to_string(),
        }
    }
}

impl SharingConfig {
    pub fn invitation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.invitation_retry_delay_ms)
    }
}
