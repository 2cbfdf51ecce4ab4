use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Group granting access to anyone on the internet.
pub const ALL_USERS_GROUP_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
/// Group granting access to any authenticated provider identity.
pub const AUTHENTICATED_USERS_GROUP_URI: &str =
    "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";

/// Permissions that make a public ACL grant dangerous.
const PUBLIC_ACL_PERMISSIONS: [&str; 4] = ["READ", "WRITE", "READ_ACP", "WRITE_ACP"];

/// Storage bucket as returned by bucket enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Globally unique bucket name.
    pub name: String,
    /// Creation timestamp reported by the provider.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

impl Bucket {
    /// Creates a bucket descriptor without creation date.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }

    /// Returns the bucket ARN.
    #[must_use]
    pub fn arn(&self) -> String {
        format!("arn:aws:s3:::{}", self.name)
    }
}

/// Grantee of one ACL grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclGrantee {
    /// Grantee type: `CanonicalUser`, `Group` or `AmazonCustomerByEmail`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Group URI for group grantees.
    #[serde(default)]
    pub uri: Option<String>,
    /// Canonical id for user grantees.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name when available.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl AclGrantee {
    /// Returns whether the grantee is one of the public groups.
    #[must_use]
    pub fn is_public_group(&self) -> bool {
        self.kind == "Group"
            && self.uri.as_deref().is_some_and(|uri| {
                uri == ALL_USERS_GROUP_URI || uri == AUTHENTICATED_USERS_GROUP_URI
            })
    }
}

/// One ACL grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclGrant {
    /// Who receives the permission.
    pub grantee: AclGrantee,
    /// `READ`, `WRITE`, `READ_ACP`, `WRITE_ACP` or `FULL_CONTROL`.
    pub permission: String,
}

/// Bucket access-control list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAcl {
    /// Canonical id of the owner.
    #[serde(default)]
    pub owner: Option<String>,
    /// Grants in provider order.
    #[serde(default)]
    pub grants: Vec<AclGrant>,
}

impl BucketAcl {
    /// Returns the dangerous permissions conveyed to public groups.
    ///
    /// `FULL_CONTROL` conveys all of them.
    #[must_use]
    pub fn public_permissions(&self) -> BTreeSet<&'static str> {
        let mut permissions = BTreeSet::new();
        for grant in self
            .grants
            .iter()
            .filter(|grant| grant.grantee.is_public_group())
        {
            if grant.permission == "FULL_CONTROL" {
                permissions.extend(PUBLIC_ACL_PERMISSIONS);
            } else if let Some(permission) = PUBLIC_ACL_PERMISSIONS
                .iter()
                .find(|permission| **permission == grant.permission)
            {
                permissions.insert(*permission);
            }
        }

        permissions
    }
}

/// One bucket replication rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRule {
    /// Rule identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// `Enabled` or `Disabled`.
    #[serde(default)]
    pub status: Option<String>,
    /// Destination bucket ARN.
    #[serde(default)]
    pub destination_bucket: Option<String>,
}

/// Bucket replication configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfiguration {
    /// ARN of the role the provider assumes to replicate.
    #[serde(default)]
    pub role: Option<String>,
    /// Replication rules.
    #[serde(default)]
    pub rules: Vec<ReplicationRule>,
}

impl ReplicationConfiguration {
    /// Returns the role name from the role ARN.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.role
            .as_deref()
            .and_then(|arn| arn.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// One default encryption rule of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionRule {
    /// `AES256`, `aws:kms` or `aws:kms:dsse`.
    pub sse_algorithm: String,
    /// KMS key for KMS-based algorithms.
    #[serde(default)]
    pub kms_master_key_id: Option<String>,
    /// Whether bucket keys are enabled.
    #[serde(default)]
    pub bucket_key_enabled: Option<bool>,
}

/// Bucket server-side encryption configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    /// Encryption rules.
    #[serde(default)]
    pub rules: Vec<EncryptionRule>,
}

/// Managed policy attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedPolicy {
    /// Policy name.
    pub policy_name: String,
    /// Policy ARN.
    pub policy_arn: String,
}

/// Account-wide identity summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Whether the root user has MFA enabled.
    pub account_mfa_enabled: bool,
    /// Whether the root user owns access keys.
    pub account_access_keys_present: bool,
}

/// Instance metadata service options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadataOptions {
    /// `required` when session tokens are mandatory, otherwise `optional`.
    #[serde(default)]
    pub http_tokens: Option<String>,
    /// `enabled` or `disabled`.
    #[serde(default)]
    pub http_endpoint: Option<String>,
}

/// Compute instance as returned by instance enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance identifier.
    pub instance_id: String,
    /// Lifecycle state name.
    #[serde(default)]
    pub state: Option<String>,
    /// Metadata service options.
    #[serde(default)]
    pub metadata_options: Option<InstanceMetadataOptions>,
    /// Public IPv4 address when one is associated.
    #[serde(default)]
    pub public_ip_address: Option<String>,
}

/// Block storage snapshot owned by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub snapshot_id: String,
    /// Source volume.
    #[serde(default)]
    pub volume_id: Option<String>,
    /// Whether the snapshot is encrypted.
    #[serde(default)]
    pub encrypted: bool,
}

/// One create-volume permission of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVolumePermission {
    /// `all` when shared publicly.
    #[serde(default)]
    pub group: Option<String>,
    /// Account the snapshot is shared with.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CreateVolumePermission {
    /// Returns whether the permission shares with everyone.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.group.as_deref() == Some("all")
    }
}

/// Identity user as returned by user enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamUser {
    /// User name.
    pub user_name: String,
    /// Creation timestamp reported by the provider.
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
}

/// Access key metadata of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    /// Access key identifier.
    pub access_key_id: String,
    /// `Active` or `Inactive`.
    pub status: String,
    /// When the key was created.
    pub create_date: DateTime<Utc>,
}

impl AccessKey {
    /// Returns whether the key can still sign requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    /// Returns the key age in whole days at `now`.
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.create_date).num_days()
    }
}

/// Machine image owned by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    /// Image identifier.
    pub image_id: String,
    /// Image name.
    #[serde(default)]
    pub name: Option<String>,
    /// Provider-reported public flag.
    #[serde(default)]
    pub public: bool,
}

/// One launch permission of a machine image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPermission {
    /// `all` when shared publicly.
    #[serde(default)]
    pub group: Option<String>,
    /// Account the image is shared with.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LaunchPermission {
    /// Returns whether the permission shares with everyone.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.group.as_deref() == Some("all")
    }
}

/// Serializes a resource for evidence, falling back to `null`.
#[must_use]
pub fn evidence_value<T: Serialize>(resource: &T) -> Value {
    serde_json::to_value(resource).unwrap_or(Value::Null)
}
