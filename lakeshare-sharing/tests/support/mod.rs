//! Shared fixtures for sharing tests: an in-memory cloud, a recording alarm
//! sink and a seeded store.

#![allow(dead_code)]

use async_trait::async_trait;
use lakeshare_cloud::{
    AccountRef, Alarm, AlarmSink, CloudConfig, CloudError, CloudResult, InvitationStatus,
    LfResource, PermissionGrant, PolicyClient, ResourceLink, ResourceShareInvitation, RetryPolicy,
};
use lakeshare_policy::PolicyDocument;
use lakeshare_sharing::{SharingConfig, SharingContext};
use lakeshare_store::ShareStore;
use lakeshare_types::*;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const PRODUCER: &str = "111111111111";
pub const CONSUMER: &str = "222222222222";
pub const REGION: &str = "eu-west-1";
pub const SOURCE_DB: &str = "ds1_db";
pub const BUCKET: &str = "sales-bucket";

// ── Fake cloud ──

/// A producer-owned resource share and the Glue ARNs associated with it.
#[derive(Debug, Clone)]
pub struct FakeResourceShare {
    pub arn: String,
    pub name: String,
    pub sender: String,
    pub receiver: String,
    pub resources: HashSet<String>,
}

#[derive(Default)]
pub struct FakeState {
    pub databases: HashSet<(String, String)>,
    /// (account, database, table) for real tables and resource links alike.
    pub tables: HashSet<(String, String, String)>,
    pub links: HashMap<(String, String, String), ResourceLink>,
    pub grants: HashSet<(String, PermissionGrant)>,
    pub resource_shares: Vec<FakeResourceShare>,
    pub invitations: Vec<ResourceShareInvitation>,
    /// Listings a newly created invitation stays hidden for.
    pub invitation_lag: usize,
    /// invitation arn -> listings it is still hidden for.
    hidden_invitations: HashMap<String, usize>,
    /// Status new invitations are created with, consumed front to back.
    /// Empty means `Pending`.
    next_invitation_statuses: Vec<InvitationStatus>,
    /// Monotonic suffix for generated resource share and invitation ARNs.
    serial: usize,
    pub bucket_policies: HashMap<(String, String), PolicyDocument>,
    /// (account, name) -> (bucket, arn)
    pub access_points: HashMap<(String, String), (String, String)>,
    pub access_point_policies: HashMap<(String, String), PolicyDocument>,
    pub keys: HashMap<(String, String), String>,
    pub key_policies: HashMap<String, PolicyDocument>,
    pub role_policies: HashMap<(String, String, String), PolicyDocument>,
    pub calls: Vec<String>,
    failures: Vec<(String, String)>,
}

impl FakeState {
    /// Catalog grants to another account ride on one `LakeFormation-V3`
    /// resource share per account pair. Creating that share sends the
    /// receiver an invitation.
    fn share_with_account(&mut self, sender: &AccountRef, receiver: &str, resource: &LfResource) {
        let resource_arn = resource.glue_arn(&sender.region);
        let existing = self.resource_shares.iter_mut().find(|r| {
            r.sender == sender.account_id
                && r.receiver == receiver
                && r.name.starts_with("LakeFormation-V3")
        });
        if let Some(share) = existing {
            share.resources.insert(resource_arn);
            return;
        }

        self.serial += 1;
        let n = self.serial;
        let arn = format!("arn:aws:ram:{}:{}:resource-share/{n}", sender.region, sender.account_id);
        let name = format!("LakeFormation-V3-{}-{receiver}-{n}", sender.account_id);
        self.resource_shares.push(FakeResourceShare {
            arn: arn.clone(),
            name: name.clone(),
            sender: sender.account_id.clone(),
            receiver: receiver.to_string(),
            resources: HashSet::from([resource_arn]),
        });

        let status = if self.next_invitation_statuses.is_empty() {
            InvitationStatus::Pending
        } else {
            self.next_invitation_statuses.remove(0)
        };
        let invitation_arn = format!(
            "arn:aws:ram:{}:{receiver}:resource-share-invitation/{n}",
            sender.region
        );
        if self.invitation_lag > 0 {
            self.hidden_invitations
                .insert(invitation_arn.clone(), self.invitation_lag);
        }
        self.invitations.push(ResourceShareInvitation {
            arn: invitation_arn,
            status,
            sender_account_id: sender.account_id.clone(),
            receiver_account_id: receiver.to_string(),
            resource_share_arn: arn,
            resource_share_name: name,
        });
    }
}

/// In-memory stand-in for every remote service the engine touches.
///
/// Each call is logged as `"<operation> <detail>"`. `fail_when` makes any
/// call whose operation matches and whose detail contains the needle fail
/// with `AccessDeniedException`.
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<FakeState>,
}

fn key2(account: &AccountRef, a: &str) -> (String, String) {
    (account.account_id.clone(), a.to_string())
}

fn is_account_id(principal: &str) -> bool {
    principal.len() == 12 && principal.chars().all(|c| c.is_ascii_digit())
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn call(&self, operation: &str, detail: String) -> CloudResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        let failing = state
            .failures
            .iter()
            .any(|(op, needle)| op == operation && detail.contains(needle.as_str()));
        state.calls.push(format!("{operation} {detail}"));
        if failing {
            return Err(CloudError::RemoteCall {
                operation: operation.to_string(),
                code: "AccessDeniedException".to_string(),
                message: format!("denied: {detail}"),
            });
        }
        Ok(state)
    }

    pub fn fail_when(&self, operation: &str, needle: &str) {
        self.state()
            .failures
            .push((operation.to_string(), needle.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn with_table(&self, account: &str, database: &str, table: &str) {
        let mut state = self.state();
        state
            .databases
            .insert((account.to_string(), database.to_string()));
        state
            .tables
            .insert((account.to_string(), database.to_string(), table.to_string()));
    }

    pub fn drop_table(&self, account: &str, database: &str, table: &str) {
        self.state()
            .tables
            .remove(&(account.to_string(), database.to_string(), table.to_string()));
    }

    pub fn with_key(&self, account: &str, alias: &str, arn: &str) {
        self.state()
            .keys
            .insert((account.to_string(), alias.to_string()), arn.to_string());
    }

    pub fn set_invitation_lag(&self, listings: usize) {
        self.state().invitation_lag = listings;
    }

    /// The next invitations the producer sends arrive with these statuses,
    /// as if the consumer had already answered them.
    pub fn answer_next_invitations(&self, statuses: &[InvitationStatus]) {
        self.state().next_invitation_statuses = statuses.to_vec();
    }

    /// Seeds a resource share from `sender` to `receiver` holding `tables`
    /// (source database tables) with one invitation in `status`.
    pub fn seed_resource_share(
        &self,
        name: &str,
        sender: &str,
        receiver: &str,
        tables: &[&str],
        status: InvitationStatus,
    ) {
        let mut state = self.state();
        state.serial += 1;
        let n = state.serial;
        let arn = format!("arn:aws:ram:{REGION}:{sender}:resource-share/seeded-{n}");
        state.resource_shares.push(FakeResourceShare {
            arn: arn.clone(),
            name: name.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            resources: tables
                .iter()
                .map(|t| LfResource::table(sender, SOURCE_DB, *t).glue_arn(REGION))
                .collect(),
        });
        state.invitations.push(ResourceShareInvitation {
            arn: format!("arn:aws:ram:{REGION}:{receiver}:resource-share-invitation/seeded-{n}"),
            status,
            sender_account_id: sender.to_string(),
            receiver_account_id: receiver.to_string(),
            resource_share_arn: arn,
            resource_share_name: name.to_string(),
        });
    }

    pub fn resource_shares(&self) -> Vec<FakeResourceShare> {
        self.state().resource_shares.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Details of every call to `operation`, in order.
    pub fn calls_to(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{operation} ");
        self.state()
            .calls
            .iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls_to(operation).len()
    }

    pub fn has_grant(&self, account: &str, grant: &PermissionGrant) -> bool {
        self.state()
            .grants
            .contains(&(account.to_string(), grant.clone()))
    }

    /// Grants held by `principal`, in any account.
    pub fn grants_of(&self, principal: &str) -> Vec<PermissionGrant> {
        self.state()
            .grants
            .iter()
            .filter(|(_, g)| g.principal == principal)
            .map(|(_, g)| g.clone())
            .collect()
    }

    pub fn has_database(&self, account: &str, database: &str) -> bool {
        self.state()
            .databases
            .contains(&(account.to_string(), database.to_string()))
    }

    pub fn has_link(&self, account: &str, database: &str, name: &str) -> bool {
        self.state().links.contains_key(&(
            account.to_string(),
            database.to_string(),
            name.to_string(),
        ))
    }

    pub fn invitations(&self) -> Vec<ResourceShareInvitation> {
        self.state().invitations.clone()
    }

    pub fn bucket_policy(&self, account: &str, bucket: &str) -> Option<PolicyDocument> {
        self.state()
            .bucket_policies
            .get(&(account.to_string(), bucket.to_string()))
            .cloned()
    }

    pub fn set_bucket_policy(&self, account: &str, bucket: &str, policy: PolicyDocument) {
        self.state()
            .bucket_policies
            .insert((account.to_string(), bucket.to_string()), policy);
    }

    pub fn has_access_point(&self, account: &str, name: &str) -> bool {
        self.state()
            .access_points
            .contains_key(&(account.to_string(), name.to_string()))
    }

    pub fn access_point_policy(&self, account: &str, name: &str) -> Option<PolicyDocument> {
        self.state()
            .access_point_policies
            .get(&(account.to_string(), name.to_string()))
            .cloned()
    }

    pub fn set_access_point_policy(&self, account: &str, name: &str, policy: PolicyDocument) {
        self.state()
            .access_point_policies
            .insert((account.to_string(), name.to_string()), policy);
    }

    pub fn key_policy(&self, key_arn: &str) -> Option<PolicyDocument> {
        self.state().key_policies.get(key_arn).cloned()
    }

    pub fn set_key_policy(&self, key_arn: &str, policy: PolicyDocument) {
        self.state().key_policies.insert(key_arn.to_string(), policy);
    }

    pub fn role_policy(&self, account: &str, role: &str, name: &str) -> Option<PolicyDocument> {
        self.state()
            .role_policies
            .get(&(account.to_string(), role.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl PolicyClient for FakeCloud {
    async fn database_exists(&self, account: &AccountRef, database: &str) -> CloudResult<bool> {
        let state = self.call("database_exists", format!("{} {database}", account.account_id))?;
        Ok(state.databases.contains(&key2(account, database)))
    }

    async fn create_database(&self, account: &AccountRef, database: &str) -> CloudResult<()> {
        let mut state = self.call("create_database", format!("{} {database}", account.account_id))?;
        state.databases.insert(key2(account, database));
        Ok(())
    }

    async fn delete_database(&self, account: &AccountRef, database: &str) -> CloudResult<()> {
        let mut state = self.call("delete_database", format!("{} {database}", account.account_id))?;
        let acct = account.account_id.clone();
        state.databases.remove(&key2(account, database));
        state
            .tables
            .retain(|(a, db, _)| !(a == &acct && db == database));
        state
            .links
            .retain(|(a, db, _), _| !(a == &acct && db == database));
        state.grants.retain(|(_, grant)| match &grant.resource {
            lakeshare_cloud::LfResource::Database { catalog_id, name } => {
                !(catalog_id == &acct && name == database)
            }
            lakeshare_cloud::LfResource::Table {
                catalog_id,
                database: db,
                ..
            } => !(catalog_id == &acct && db == database),
        });
        Ok(())
    }

    async fn table_exists(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<bool> {
        let state = self.call(
            "table_exists",
            format!("{} {database}.{table}", account.account_id),
        )?;
        Ok(state.tables.contains(&(
            account.account_id.clone(),
            database.to_string(),
            table.to_string(),
        )))
    }

    async fn create_resource_link(
        &self,
        account: &AccountRef,
        link: &ResourceLink,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "create_resource_link",
            format!("{} {}.{}", account.account_id, link.database, link.name),
        )?;
        if !state.databases.contains(&key2(account, &link.database)) {
            return Err(CloudError::RemoteCall {
                operation: "create_resource_link".to_string(),
                code: "EntityNotFoundException".to_string(),
                message: format!("database {} not found", link.database),
            });
        }
        let key = (
            account.account_id.clone(),
            link.database.clone(),
            link.name.clone(),
        );
        state.tables.insert(key.clone());
        state.links.insert(key, link.clone());
        Ok(())
    }

    async fn delete_table(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "delete_table",
            format!("{} {database}.{table}", account.account_id),
        )?;
        let key = (
            account.account_id.clone(),
            database.to_string(),
            table.to_string(),
        );
        state.tables.remove(&key);
        state.links.remove(&key);
        Ok(())
    }

    async fn grant_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "grant_permissions",
            format!("{} {} {}", account.account_id, grant.principal, grant.resource),
        )?;
        if is_account_id(&grant.principal) && grant.principal != account.account_id {
            state.share_with_account(account, &grant.principal, &grant.resource);
        }
        state
            .grants
            .insert((account.account_id.clone(), grant.clone()));
        Ok(())
    }

    async fn revoke_permissions(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "revoke_permissions",
            format!("{} {} {}", account.account_id, grant.principal, grant.resource),
        )?;
        state
            .grants
            .remove(&(account.account_id.clone(), grant.clone()));
        Ok(())
    }

    async fn list_resource_share_invitations(
        &self,
        account: &AccountRef,
    ) -> CloudResult<Vec<ResourceShareInvitation>> {
        let mut state = self.call(
            "list_resource_share_invitations",
            account.account_id.clone(),
        )?;
        let state = &mut *state;
        let mut visible = Vec::new();
        for invitation in &state.invitations {
            if invitation.receiver_account_id != account.account_id {
                continue;
            }
            match state.hidden_invitations.get_mut(&invitation.arn) {
                Some(remaining) if *remaining > 0 => *remaining -= 1,
                _ => visible.push(invitation.clone()),
            }
        }
        Ok(visible)
    }

    async fn list_resource_share_arns(
        &self,
        account: &AccountRef,
        resource_arn: &str,
    ) -> CloudResult<Vec<String>> {
        let state = self.call(
            "list_resource_share_arns",
            format!("{} {resource_arn}", account.account_id),
        )?;
        Ok(state
            .resource_shares
            .iter()
            .filter(|r| r.sender == account.account_id && r.resources.contains(resource_arn))
            .map(|r| r.arn.clone())
            .collect())
    }

    async fn delete_resource_share(
        &self,
        account: &AccountRef,
        resource_share_arn: &str,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "delete_resource_share",
            format!("{} {resource_share_arn}", account.account_id),
        )?;
        state.resource_shares.retain(|r| r.arn != resource_share_arn);
        state
            .invitations
            .retain(|i| i.resource_share_arn != resource_share_arn);
        Ok(())
    }

    async fn accept_resource_share_invitation(
        &self,
        account: &AccountRef,
        invitation_arn: &str,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "accept_resource_share_invitation",
            format!("{} {invitation_arn}", account.account_id),
        )?;
        match state.invitations.iter_mut().find(|i| i.arn == invitation_arn) {
            Some(invitation) => {
                invitation.status = InvitationStatus::Accepted;
                Ok(())
            }
            None => Err(CloudError::NotFound(invitation_arn.to_string())),
        }
    }

    async fn get_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let state = self.call("get_bucket_policy", format!("{} {bucket}", account.account_id))?;
        Ok(state.bucket_policies.get(&key2(account, bucket)).cloned())
    }

    async fn put_bucket_policy(
        &self,
        account: &AccountRef,
        bucket: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let mut state = self.call("put_bucket_policy", format!("{} {bucket}", account.account_id))?;
        state
            .bucket_policies
            .insert(key2(account, bucket), policy.clone());
        Ok(())
    }

    async fn delete_bucket_policy(&self, account: &AccountRef, bucket: &str) -> CloudResult<()> {
        let mut state = self.call(
            "delete_bucket_policy",
            format!("{} {bucket}", account.account_id),
        )?;
        state.bucket_policies.remove(&key2(account, bucket));
        Ok(())
    }

    async fn get_access_point_arn(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<String>> {
        let state = self.call("get_access_point_arn", format!("{} {name}", account.account_id))?;
        Ok(state
            .access_points
            .get(&key2(account, name))
            .map(|(_, arn)| arn.clone()))
    }

    async fn create_access_point(
        &self,
        account: &AccountRef,
        bucket: &str,
        name: &str,
    ) -> CloudResult<String> {
        let mut state = self.call(
            "create_access_point",
            format!("{} {bucket} {name}", account.account_id),
        )?;
        let arn = format!(
            "arn:aws:s3:{}:{}:accesspoint/{name}",
            account.region, account.account_id
        );
        state
            .access_points
            .insert(key2(account, name), (bucket.to_string(), arn.clone()));
        Ok(arn)
    }

    async fn delete_access_point(&self, account: &AccountRef, name: &str) -> CloudResult<()> {
        let mut state = self.call("delete_access_point", format!("{} {name}", account.account_id))?;
        state.access_points.remove(&key2(account, name));
        state.access_point_policies.remove(&key2(account, name));
        Ok(())
    }

    async fn get_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let state = self.call(
            "get_access_point_policy",
            format!("{} {name}", account.account_id),
        )?;
        Ok(state.access_point_policies.get(&key2(account, name)).cloned())
    }

    async fn put_access_point_policy(
        &self,
        account: &AccountRef,
        name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "put_access_point_policy",
            format!("{} {name}", account.account_id),
        )?;
        if !state.access_points.contains_key(&key2(account, name)) {
            return Err(CloudError::RemoteCall {
                operation: "put_access_point_policy".to_string(),
                code: "NoSuchAccessPoint".to_string(),
                message: format!("access point {name} not found"),
            });
        }
        state
            .access_point_policies
            .insert(key2(account, name), policy.clone());
        Ok(())
    }

    async fn get_key_arn(&self, account: &AccountRef, alias: &str) -> CloudResult<Option<String>> {
        let state = self.call("get_key_arn", format!("{} {alias}", account.account_id))?;
        Ok(state.keys.get(&key2(account, alias)).cloned())
    }

    async fn get_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
    ) -> CloudResult<PolicyDocument> {
        let state = self.call("get_key_policy", format!("{} {key_id}", account.account_id))?;
        Ok(state.key_policies.get(key_id).cloned().unwrap_or_default())
    }

    async fn put_key_policy(
        &self,
        account: &AccountRef,
        key_id: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let mut state = self.call("put_key_policy", format!("{} {key_id}", account.account_id))?;
        state.key_policies.insert(key_id.to_string(), policy.clone());
        Ok(())
    }

    async fn get_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<Option<PolicyDocument>> {
        let state = self.call(
            "get_role_policy",
            format!("{} {role_name} {policy_name}", account.account_id),
        )?;
        Ok(state
            .role_policies
            .get(&(
                account.account_id.clone(),
                role_name.to_string(),
                policy_name.to_string(),
            ))
            .cloned())
    }

    async fn put_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
        policy: &PolicyDocument,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "put_role_policy",
            format!("{} {role_name} {policy_name}", account.account_id),
        )?;
        state.role_policies.insert(
            (
                account.account_id.clone(),
                role_name.to_string(),
                policy_name.to_string(),
            ),
            policy.clone(),
        );
        Ok(())
    }

    async fn delete_role_policy(
        &self,
        account: &AccountRef,
        role_name: &str,
        policy_name: &str,
    ) -> CloudResult<()> {
        let mut state = self.call(
            "delete_role_policy",
            format!("{} {role_name} {policy_name}", account.account_id),
        )?;
        state.role_policies.remove(&(
            account.account_id.clone(),
            role_name.to_string(),
            policy_name.to_string(),
        ));
        Ok(())
    }

    async fn get_role_id(&self, account: &AccountRef, role_name: &str) -> CloudResult<String> {
        self.call("get_role_id", format!("{} {role_name}", account.account_id))?;
        Ok(role_id(role_name))
    }
}

/// Role id the fake hands out for `role_name`.
pub fn role_id(role_name: &str) -> String {
    format!("AROA{}", role_name.to_uppercase())
}

// ── Alarms ──

#[derive(Default)]
pub struct RecordingAlarmSink {
    alarms: Mutex<Vec<Alarm>>,
}

impl RecordingAlarmSink {
    pub fn alarms(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.alarms().into_iter().map(|a| a.subject).collect()
    }
}

#[async_trait]
impl AlarmSink for RecordingAlarmSink {
    async fn publish(&self, alarm: Alarm) {
        self.alarms.lock().unwrap().push(alarm);
    }
}

// ── Store fixtures ──

pub fn environment(uri: &str, account: &str) -> Environment {
    Environment {
        uri: EnvironmentUri::from(uri),
        label: uri.to_string(),
        account_id: account.to_string(),
        region: REGION.to_string(),
        default_role_arn: format!("arn:aws:iam::{account}:role/{uri}-default"),
    }
}

pub fn dataset() -> Dataset {
    Dataset {
        uri: DatasetUri::from("ds1"),
        label: "sales".to_string(),
        environment_uri: EnvironmentUri::from("producer"),
        account_id: PRODUCER.to_string(),
        region: REGION.to_string(),
        glue_database_name: SOURCE_DB.to_string(),
        s3_bucket_name: BUCKET.to_string(),
        kms_alias: None,
        admin_role_arn: format!("arn:aws:iam::{PRODUCER}:role/ds1-admin"),
    }
}

pub fn table(uri: &str) -> DatasetTable {
    DatasetTable {
        uri: TableUri::from(uri),
        dataset_uri: DatasetUri::from("ds1"),
        label: uri.to_string(),
        glue_database_name: SOURCE_DB.to_string(),
        glue_table_name: uri.to_string(),
    }
}

pub fn location(uri: &str) -> DatasetStorageLocation {
    DatasetStorageLocation {
        uri: LocationUri::from(uri),
        dataset_uri: DatasetUri::from("ds1"),
        label: uri.to_string(),
        s3_bucket_name: BUCKET.to_string(),
        s3_prefix: uri.to_string(),
    }
}

pub struct Harness {
    pub ctx: SharingContext,
    pub cloud: Arc<FakeCloud>,
    pub alarms: Arc<RecordingAlarmSink>,
}

impl Harness {
    pub fn store(&self) -> &ShareStore {
        &self.ctx.store
    }

    /// Inserts a share in `status` with one item per `(item_uri, type)`, all
    /// in `item_status`. Item uris are `<share>-<item>`.
    pub fn share(
        &self,
        uri: &str,
        target_env: &str,
        principal: &str,
        status: ShareObjectStatus,
        items: &[(&str, ShareableType)],
        item_status: ShareItemStatus,
    ) -> Vec<ShareItemUri> {
        let share = ShareObject {
            uri: ShareUri::from(uri),
            dataset_uri: DatasetUri::from("ds1"),
            source_environment_uri: EnvironmentUri::from("producer"),
            target_environment_uri: EnvironmentUri::from(target_env),
            principal_id: principal.to_string(),
            principal_type: PrincipalType::Group,
            principal_role_name: format!("{principal}-role"),
            group_uri: GroupUri::from(principal),
            status,
            owner: "alice".to_string(),
            created_at: 1,
            updated_at: 1,
        };
        self.store().insert_share(&share).unwrap();
        items
            .iter()
            .map(|(item_uri, item_type)| {
                let uri = ShareItemUri::from(format!("{uri}-{item_uri}"));
                self.store()
                    .insert_item(&ShareObjectItem {
                        uri: uri.clone(),
                        share_uri: share.uri.clone(),
                        item_uri: item_uri.to_string(),
                        item_type: *item_type,
                        item_name: item_uri.to_string(),
                        status: item_status,
                        resource_name: None,
                        owner: "alice".to_string(),
                        created_at: 1,
                        updated_at: 1,
                    })
                    .unwrap();
                uri
            })
            .collect()
    }

    /// Moves a processed share and the given items into the revoke queue.
    pub fn mark_revoked(&self, share: &str, items: &[ShareItemUri]) {
        self.store()
            .update_share_status(&ShareUri::from(share), ShareObjectStatus::Revoked)
            .unwrap();
        for item in items {
            self.store()
                .update_item_status(item, ShareItemStatus::RevokeApproved)
                .unwrap();
        }
    }

    pub fn share_status(&self, share: &str) -> ShareObjectStatus {
        self.store().get_share(&ShareUri::from(share)).unwrap().status
    }

    pub fn item_status(&self, item: &ShareItemUri) -> ShareItemStatus {
        self.store().get_item(item).unwrap().status
    }

    pub fn data(&self, share: &str) -> ShareData {
        self.store().get_share_data(&ShareUri::from(share)).unwrap()
    }
}

pub fn test_config() -> SharingConfig {
    SharingConfig {
        invitation_retry_delay_ms: 0,
        access_point_poll: RetryPolicy::none(),
        ..SharingConfig::default()
    }
}

/// Environments `producer` (producer account), `consumer` and `consumer2`
/// (both in the consumer account) and `local` (producer account); dataset
/// `ds1` with tables `t1`..`t3` and folders `f1`, `f2`. The cloud knows the
/// three source tables.
pub fn harness() -> Harness {
    let store = ShareStore::open_in_memory().unwrap();
    store.put_environment(&environment("producer", PRODUCER)).unwrap();
    store.put_environment(&environment("consumer", CONSUMER)).unwrap();
    store.put_environment(&environment("consumer2", CONSUMER)).unwrap();
    store.put_environment(&environment("local", PRODUCER)).unwrap();
    store.put_dataset(&dataset()).unwrap();
    for t in ["t1", "t2", "t3"] {
        store.put_table(&table(t)).unwrap();
    }
    for f in ["f1", "f2"] {
        store.put_location(&location(f)).unwrap();
    }

    let cloud = Arc::new(FakeCloud::new());
    for t in ["t1", "t2", "t3"] {
        cloud.with_table(PRODUCER, SOURCE_DB, t);
    }
    let alarms = Arc::new(RecordingAlarmSink::default());
    let ctx = SharingContext::new(
        store,
        cloud.clone(),
        alarms.clone(),
        CloudConfig {
            envname: "test".to_string(),
            ..CloudConfig::default()
        },
        test_config(),
    );
    Harness { ctx, cloud, alarms }
}
