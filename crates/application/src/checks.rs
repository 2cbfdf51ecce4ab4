//! Security checks and the contract they share.

use async_trait::async_trait;
use clouddoctor_core::{AppError, AppResult};
use clouddoctor_domain::{CheckDomain, CheckOutcome};

use crate::cloud_ports::CloudResourceClient;

mod ebs_snapshot_private;
mod ec2_ami_private;
mod ec2_imdsv2;
mod ec2_public_ip;
mod iam_access_key_age;
mod iam_root_account;
mod s3_bucket_policy;
mod s3_encryption;
mod s3_public_access;
mod s3_replication_role;
mod scan;

pub use ebs_snapshot_private::EbsSnapshotPrivateCheck;
pub use ec2_ami_private::Ec2AmiPrivateCheck;
pub use ec2_imdsv2::Ec2Imdsv2Check;
pub use ec2_public_ip::Ec2PublicIpCheck;
pub use iam_access_key_age::IamAccessKeyAgeCheck;
pub use iam_root_account::{IamRootAccessKeyCheck, IamRootMfaCheck};
pub use s3_bucket_policy::{PUBLIC_OBJECT_ACTIONS, S3BucketPolicyCheck};
pub use s3_encryption::S3EncryptionCheck;
pub use s3_public_access::S3PublicAccessCheck;
pub use s3_replication_role::{REPLICATION_ACTIONS, S3ReplicationRoleCheck};

/// One security rule evaluated against an account.
///
/// `run` never fails: enumeration and per-resource failures are reported as
/// `ERROR` results inside the returned outcome.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable check identifier.
    fn id(&self) -> &'static str;

    /// Numeric guideline classification.
    fn guideline_id(&self) -> u16;

    /// Service family used to group the catalog.
    fn domain(&self) -> CheckDomain;

    /// Human-readable catalog description.
    fn description(&self) -> &'static str;

    /// Evaluates the rule with account-scoped handles.
    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome;
}

/// Verdict used when the auditor is denied reading a bucket ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AclAccessDeniedPolicy {
    /// Report `PASS`: an ACL the auditor cannot read is assumed non-public.
    #[default]
    AssumeNotPublic,
    /// Report `WARN`.
    Warn,
    /// Report `ERROR`.
    Error,
}

impl AclAccessDeniedPolicy {
    /// Returns a stable configuration value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssumeNotPublic => "pass",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parses configuration value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Self::AssumeNotPublic),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(AppError::Validation(format!(
                "ACL access denied policy must be 'pass', 'warn' or 'error', got '{other}'"
            ))),
        }
    }
}

/// Tunables shared by the built-in checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSettings {
    /// Maximum resources evaluated concurrently inside one check.
    pub resource_parallelism: usize,
    /// Verdict for unreadable bucket ACLs.
    pub acl_access_denied: AclAccessDeniedPolicy,
    /// Age in days past which an active access key fails.
    pub access_key_max_age_days: u32,
}

impl CheckSettings {
    /// Rejects settings no check can run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.resource_parallelism == 0 {
            return Err(AppError::Validation(
                "resource_parallelism must be greater than zero".to_owned(),
            ));
        }
        if self.access_key_max_age_days == 0 {
            return Err(AppError::Validation(
                "access_key_max_age_days must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            resource_parallelism: 8,
            acl_access_denied: AclAccessDeniedPolicy::default(),
            access_key_max_age_days: 90,
        }
    }
}

#[cfg(test)]
mod tests;
