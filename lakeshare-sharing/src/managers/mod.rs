//! Resource-specific share managers.
//!
//! A manager knows how to grant and revoke one kind of shareable resource
//! for one share. It never touches item statuses; the processor does.

mod prefix;
mod table;

pub use prefix::{PrefixShareManager, access_point_name};
pub use table::{AccountScope, TableShareManager, shared_database_name};

use crate::alarms::Phase;
use crate::error::{ShareError, ShareResult};
use async_trait::async_trait;
use lakeshare_cloud::Alarm;
use lakeshare_types::{ShareObjectItem, ShareableType};

#[async_trait]
pub trait ShareManager: Send + Sync {
    /// Resolved resource behind one item.
    type Resource: Send + Sync;

    fn kind(&self) -> ShareableType;

    /// Human-readable name of a resource, for logs.
    fn describe(&self, resource: &Self::Resource) -> String;

    /// Once-per-share setup run before the first grant of a batch.
    async fn prepare(&self) -> ShareResult<()> {
        Ok(())
    }

    /// Grants access to one resource. Returns the consumer-side name the
    /// item is reachable under.
    async fn grant(&self, item: &ShareObjectItem, resource: &Self::Resource)
    -> ShareResult<String>;

    async fn revoke(&self, item: &ShareObjectItem, resource: &Self::Resource) -> ShareResult<()>;

    /// Once-per-share teardown after the last item of this kind is revoked.
    async fn clean_up(&self) -> ShareResult<()>;

    fn failure_alarm(&self, resource: &Self::Resource, phase: Phase, error: &ShareError) -> Alarm;
}
