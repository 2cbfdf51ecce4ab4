//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod check;
mod policy;
pub mod policy_evaluator;
mod resources;

pub use audit::{AuditJob, AuditJobStatus, AuditJobTransition};
pub use check::{CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, NO_RESOURCE};
pub use policy::{PolicyDocument, PolicyEffect, PolicyPrincipal, PolicyStatement};
pub use policy_evaluator::{PolicyVerdict, PublicGrant};
pub use resources::{
    ALL_USERS_GROUP_URI, AUTHENTICATED_USERS_GROUP_URI, AccessKey, AccountSummary, AclGrant,
    AclGrantee, AttachedPolicy, Bucket, BucketAcl, CreateVolumePermission,
    EncryptionConfiguration, EncryptionRule, IamUser, Instance, InstanceMetadataOptions,
    LaunchPermission, MachineImage, ReplicationConfiguration, ReplicationRule, Snapshot,
    evidence_value,
};
