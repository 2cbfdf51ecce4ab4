use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clouddoctor_application::{ProviderError, ProviderResult};
use clouddoctor_domain::{
    AccessKey, AccountSummary, AttachedPolicy, BucketAcl, CreateVolumePermission,
    EncryptionConfiguration, Instance, LaunchPermission, ReplicationConfiguration,
};
use serde::Deserialize;
use serde_json::Value;

/// Provider failure recorded in a snapshot.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RecordedError {
    code: String,
    #[serde(default)]
    message: String,
}

/// One provider call: either its answer or the failure it produced.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum Slot<T> {
    Failure { error: RecordedError },
    Answer(T),
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::Answer(T::default())
    }
}

impl<T> Slot<T> {
    pub(super) fn answer(&self) -> ProviderResult<&T> {
        match self {
            Self::Failure { error } => Err(ProviderError::from_code(
                error.code.as_str(),
                error.message.as_str(),
            )),
            Self::Answer(value) => Ok(value),
        }
    }
}

impl<T: Clone> Slot<T> {
    pub(super) fn replay(&self) -> ProviderResult<T> {
        self.answer().cloned()
    }
}

/// Replays an optional slot, reporting absence with the given provider code.
pub(super) fn replay_or_absent<T: Clone>(
    slot: Option<&Slot<T>>,
    absent_code: &str,
    absent_message: &str,
) -> ProviderResult<T> {
    slot.map_or_else(
        || Err(ProviderError::from_code(absent_code, absent_message)),
        Slot::replay,
    )
}

/// Recorded state of one bucket.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct BucketEntry {
    pub(super) name: String,
    #[serde(default)]
    pub(super) creation_date: Option<DateTime<Utc>>,
    /// Policy as raw text or as an inline JSON document.
    #[serde(default)]
    pub(super) policy: Option<Slot<Value>>,
    #[serde(default)]
    pub(super) acl: Option<Slot<BucketAcl>>,
    #[serde(default)]
    pub(super) replication: Option<Slot<ReplicationConfiguration>>,
    #[serde(default)]
    pub(super) encryption: Option<Slot<EncryptionConfiguration>>,
}

/// Recorded policies of one role.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RoleEntry {
    #[serde(default)]
    pub(super) inline_policies: Slot<BTreeMap<String, Value>>,
    #[serde(default)]
    pub(super) attached_policies: Slot<Vec<AttachedPolicy>>,
}

/// Recorded managed policy and its default version.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ManagedPolicyEntry {
    #[serde(default = "default_policy_version")]
    pub(super) default_version: String,
    pub(super) document: Slot<Value>,
}

fn default_policy_version() -> String {
    "v1".to_owned()
}

/// Recorded state of one owned snapshot.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct SnapshotEntry {
    pub(super) snapshot_id: String,
    #[serde(default)]
    pub(super) volume_id: Option<String>,
    #[serde(default)]
    pub(super) encrypted: bool,
    #[serde(default)]
    pub(super) create_volume_permissions: Slot<Vec<CreateVolumePermission>>,
}

/// Recorded identity user and its access keys.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct UserEntry {
    pub(super) user_name: String,
    #[serde(default)]
    pub(super) create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(super) access_keys: Slot<Vec<AccessKey>>,
}

/// Recorded machine image owned by the account.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ImageEntry {
    pub(super) image_id: String,
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) public: bool,
    #[serde(default)]
    pub(super) launch_permissions: Slot<Vec<LaunchPermission>>,
}

/// Recorded state of one account.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct AccountSnapshot {
    pub(super) account_id: String,
    #[serde(default)]
    pub(super) assumable_roles: Vec<String>,
    #[serde(default)]
    pub(super) external_id: Option<String>,
    #[serde(default)]
    pub(super) buckets: Slot<Vec<BucketEntry>>,
    #[serde(default)]
    pub(super) roles: BTreeMap<String, RoleEntry>,
    #[serde(default)]
    pub(super) managed_policies: BTreeMap<String, ManagedPolicyEntry>,
    #[serde(default)]
    pub(super) users: Slot<Vec<UserEntry>>,
    #[serde(default)]
    pub(super) account_summary: Slot<AccountSummary>,
    #[serde(default)]
    pub(super) instances: Slot<Vec<Instance>>,
    #[serde(default)]
    pub(super) snapshots: Slot<Vec<SnapshotEntry>>,
    #[serde(default)]
    pub(super) images: Slot<Vec<ImageEntry>>,
}
