//! Explicit dependencies of every orchestrator entry point.

use crate::config::SharingConfig;
use lakeshare_cloud::{AlarmSink, CloudConfig, PolicyClient};
use lakeshare_store::ShareStore;
use std::sync::Arc;

/// Everything a share run needs, owned by the caller (normally the task worker).
#[derive(Clone)]
pub struct SharingContext {
    pub store: ShareStore,
    pub client: Arc<dyn PolicyClient>,
    pub alarms: Arc<dyn AlarmSink>,
    pub cloud: CloudConfig,
    pub config: SharingConfig,
}

impl SharingContext {
    pub fn new(
        store: ShareStore,
        client: Arc<dyn PolicyClient>,
        alarms: Arc<dyn AlarmSink>,
        cloud: CloudConfig,
        config: SharingConfig,
    ) -> Self {
        Self {
            store,
            client,
            alarms,
            cloud,
            config,
        }
    }

    /// Pivot role ARN in `account_id`.
    pub fn pivot_role_arn(&self, account_id: &str) -> String {
        self.cloud.pivot_role_arn(account_id)
    }
}
