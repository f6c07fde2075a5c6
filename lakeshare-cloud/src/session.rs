//! Per-account pivot-role sessions with auto-refresh.
//!
//! Every remote call runs as the pivot role of the account it targets.
//! Assumed-role credentials are cached per account/region and refreshed
//! shortly before they expire.

use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::types::AccountRef;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_types::region::Region;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Clone)]
struct CachedSession {
    config: SdkConfig,
    expires_at: DateTime<Utc>,
}

impl CachedSession {
    fn expires_within_secs(&self, secs: i64) -> bool {
        Utc::now() + Duration::seconds(secs) >= self.expires_at
    }
}

/// Hands out SDK configs authenticated as the pivot role of a given account.
pub struct SessionManager {
    base: SdkConfig,
    config: CloudConfig,
    sessions: Arc<RwLock<HashMap<AccountRef, CachedSession>>>,
}

impl SessionManager {
    pub fn new(base: SdkConfig, config: CloudConfig) -> Self {
        Self {
            base,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Loads the ambient credentials of the worker process as the base session.
    pub async fn from_env(config: CloudConfig) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(base, config)
    }

    /// Config of the worker's own identity, used for central services.
    pub fn base_config(&self) -> &SdkConfig {
        &self.base
    }

    /// Gets a config for `account`, assuming the pivot role if needed.
    pub async fn sdk_config(&self, account: &AccountRef) -> CloudResult<SdkConfig> {
        // Fast path: cached session still valid
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(account) {
                if !session.expires_within_secs(self.config.credential_refresh_margin_secs) {
                    return Ok(session.config.clone());
                }
                debug!("pivot session for {account} expiring, refreshing");
            }
        }

        let session = self.assume_pivot_role(account).await?;
        let config = session.config.clone();
        self.sessions.write().await.insert(account.clone(), session);
        Ok(config)
    }

    /// Drops every cached session.
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    async fn assume_pivot_role(&self, account: &AccountRef) -> CloudResult<CachedSession> {
        let role_arn = self.config.pivot_role_arn(&account.account_id);
        let sts = aws_sdk_sts::Client::new(&self.base);

        let resp = sts
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(format!("lakeshare-{}", account.account_id))
            .send()
            .await
            .map_err(|e| {
                warn!("assume role {role_arn} failed: {e}");
                CloudError::Credentials {
                    account: account.account_id.clone(),
                    message: aws_smithy_types::error::display::DisplayErrorContext(&e)
                        .to_string(),
                }
            })?;

        let creds = resp.credentials().ok_or_else(|| CloudError::Credentials {
            account: account.account_id.clone(),
            message: "assume role returned no credentials".to_string(),
        })?;

        let expiry = SystemTime::try_from(*creds.expiration()).ok();
        let expires_at = expiry
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|| Utc::now() + Duration::minutes(15));

        let credentials = Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            Some(creds.session_token().to_string()),
            expiry,
            "lakeshare-pivot",
        );

        let config = self
            .base
            .clone()
            .into_builder()
            .region(Region::new(account.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .build();

        debug!("assumed {role_arn}, expires at {expires_at}");
        Ok(CachedSession { config, expires_at })
    }
}
