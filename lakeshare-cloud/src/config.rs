//! Facade configuration.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for remote calls made on behalf of the sharing engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Region of the central deployment (STS, SNS).
    pub region: String,

    /// Role assumed in every producer/consumer account.
    pub pivot_role_name: String,

    /// SNS topic for failure alarms. Alarms are only logged when unset.
    pub alarms_topic_arn: Option<String>,

    /// Deployment name, shown in alarm subjects.
    pub envname: String,

    /// Credential refresh margin in seconds (refresh before expiry).
    pub credential_refresh_margin_secs: i64,

    /// Retry policy applied around every remote call.
    pub retry: RetryPolicy,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            region: "eu-west-1".to_string(),
            pivot_role_name: "lakesharePivotRole".to_string(),
            alarms_topic_arn: None,
            envname: "local".to_string(),
            credential_refresh_margin_secs: 300, // 5 minutes before expiry
            retry: RetryPolicy::default(),
        }
    }
}

impl CloudConfig {
    /// ARN of the pivot role in `account_id`.
    pub fn pivot_role_arn(&self, account_id: &str) -> String {
        format!("arn:aws:iam::{account_id}:role/{}", self.pivot_role_name)
    }
}
