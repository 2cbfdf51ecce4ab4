use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clouddoctor_core::{AccountReference, AppError, AppResult, AuditJobId};
use clouddoctor_domain::{
    AccessKey, AccountSummary, AttachedPolicy, AuditJob, AuditJobTransition, Bucket, BucketAcl,
    CheckDomain, CheckOutcome, CheckStatus, CreateVolumePermission, EncryptionConfiguration,
    IamUser, Instance, LaunchPermission, MachineImage, ReplicationConfiguration, Snapshot,
};
use serde_json::Value;
use tokio::sync::{Mutex, Notify};

use crate::audit_ports::AuditJobRepository;
use crate::checks::Check;
use crate::cloud_ports::{
    CloudResourceClient, CloudSessionProvider, ComputeClient, IdentityClient, ProviderError,
    ProviderResult, StorageClient,
};

/// Account state served from maps; missing entries answer like the provider does.
#[derive(Default)]
pub(crate) struct FakeCloud {
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) bucket_listing_error: Option<ProviderError>,
    pub(crate) policies: HashMap<String, ProviderResult<String>>,
    pub(crate) acls: HashMap<String, ProviderResult<BucketAcl>>,
    pub(crate) replications: HashMap<String, ProviderResult<ReplicationConfiguration>>,
    pub(crate) encryptions: HashMap<String, ProviderResult<EncryptionConfiguration>>,
    /// Delay before answering an encryption lookup, per bucket.
    pub(crate) encryption_latency: HashMap<String, Duration>,
    pub(crate) inline_policies: HashMap<String, Vec<(String, Value)>>,
    pub(crate) attached_policies: HashMap<String, Vec<AttachedPolicy>>,
    pub(crate) managed_policies: HashMap<String, Value>,
    pub(crate) account_summary: Option<ProviderResult<AccountSummary>>,
    pub(crate) users: Vec<IamUser>,
    pub(crate) access_keys: HashMap<String, ProviderResult<Vec<AccessKey>>>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) snapshots: Vec<Snapshot>,
    pub(crate) volume_permissions: HashMap<String, ProviderResult<Vec<CreateVolumePermission>>>,
    pub(crate) images: Vec<MachineImage>,
    pub(crate) launch_permissions: HashMap<String, ProviderResult<Vec<LaunchPermission>>>,
}

impl FakeCloud {
    pub(crate) fn with_buckets(names: &[&str]) -> Self {
        Self {
            buckets: names.iter().map(|name| Bucket::named(*name)).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn client(self) -> CloudResourceClient {
        let cloud = Arc::new(self);
        CloudResourceClient::new(cloud.clone(), cloud.clone(), cloud)
    }
}

pub(crate) fn service_error(code: &str) -> ProviderError {
    ProviderError::from_code(code, "simulated provider failure")
}

#[async_trait]
impl StorageClient for FakeCloud {
    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>> {
        match &self.bucket_listing_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.buckets.clone()),
        }
    }

    async fn get_bucket_policy(&self, bucket: &str) -> ProviderResult<String> {
        self.policies.get(bucket).cloned().unwrap_or_else(|| {
            Err(ProviderError::from_code(
                "NoSuchBucketPolicy",
                "The bucket policy does not exist",
            ))
        })
    }

    async fn get_bucket_acl(&self, bucket: &str) -> ProviderResult<BucketAcl> {
        self.acls
            .get(bucket)
            .cloned()
            .unwrap_or_else(|| Ok(BucketAcl::default()))
    }

    async fn get_bucket_replication(
        &self,
        bucket: &str,
    ) -> ProviderResult<ReplicationConfiguration> {
        self.replications.get(bucket).cloned().unwrap_or_else(|| {
            Err(ProviderError::from_code(
                "ReplicationConfigurationNotFoundError",
                "The replication configuration was not found",
            ))
        })
    }

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ProviderResult<EncryptionConfiguration> {
        if let Some(latency) = self.encryption_latency.get(bucket) {
            tokio::time::sleep(*latency).await;
        }
        self.encryptions.get(bucket).cloned().unwrap_or_else(|| {
            Err(ProviderError::from_code(
                "ServerSideEncryptionConfigurationNotFoundError",
                "The server side encryption configuration was not found",
            ))
        })
    }
}

#[async_trait]
impl IdentityClient for FakeCloud {
    async fn list_role_policies(&self, role_name: &str) -> ProviderResult<Vec<String>> {
        Ok(self
            .inline_policies
            .get(role_name)
            .map(|policies| policies.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> ProviderResult<Value> {
        self.inline_policies
            .get(role_name)
            .and_then(|policies| policies.iter().find(|(name, _)| name == policy_name))
            .map(|(_, document)| document.clone())
            .ok_or_else(|| ProviderError::from_code("NoSuchEntity", "inline policy not found"))
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
    ) -> ProviderResult<Vec<AttachedPolicy>> {
        Ok(self
            .attached_policies
            .get(role_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_policy_default_version(&self, policy_arn: &str) -> ProviderResult<String> {
        if self.managed_policies.contains_key(policy_arn) {
            Ok("v1".to_owned())
        } else {
            Err(ProviderError::from_code("NoSuchEntity", "policy not found"))
        }
    }

    async fn get_policy_version_document(
        &self,
        policy_arn: &str,
        _version_id: &str,
    ) -> ProviderResult<Value> {
        self.managed_policies
            .get(policy_arn)
            .cloned()
            .ok_or_else(|| ProviderError::from_code("NoSuchEntity", "policy not found"))
    }

    async fn list_users(&self) -> ProviderResult<Vec<IamUser>> {
        Ok(self.users.clone())
    }

    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKey>> {
        self.access_keys
            .get(user_name)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_account_summary(&self) -> ProviderResult<AccountSummary> {
        self.account_summary
            .clone()
            .unwrap_or_else(|| Ok(AccountSummary::default()))
    }
}

#[async_trait]
impl ComputeClient for FakeCloud {
    async fn describe_instances(&self) -> ProviderResult<Vec<Instance>> {
        Ok(self.instances.clone())
    }

    async fn describe_owned_snapshots(&self) -> ProviderResult<Vec<Snapshot>> {
        Ok(self.snapshots.clone())
    }

    async fn get_snapshot_create_volume_permissions(
        &self,
        snapshot_id: &str,
    ) -> ProviderResult<Vec<CreateVolumePermission>> {
        self.volume_permissions
            .get(snapshot_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn describe_owned_images(&self) -> ProviderResult<Vec<MachineImage>> {
        Ok(self.images.clone())
    }

    async fn get_image_launch_permissions(
        &self,
        image_id: &str,
    ) -> ProviderResult<Vec<LaunchPermission>> {
        self.launch_permissions
            .get(image_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Hands out one prepared client, or refuses every session.
pub(crate) struct FakeSessionProvider {
    client: Option<CloudResourceClient>,
}

impl FakeSessionProvider {
    pub(crate) fn granting(client: CloudResourceClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub(crate) fn refusing() -> Self {
        Self { client: None }
    }
}

#[async_trait]
impl CloudSessionProvider for FakeSessionProvider {
    async fn open_session(&self, _account: &AccountReference) -> AppResult<CloudResourceClient> {
        self.client
            .clone()
            .ok_or_else(|| AppError::Unauthorized("role assumption was refused".to_owned()))
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditJobRepository {
    jobs: Mutex<HashMap<AuditJobId, AuditJob>>,
}

impl FakeAuditJobRepository {
    pub(crate) async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }
}

#[async_trait]
impl AuditJobRepository for FakeAuditJobRepository {
    async fn insert_job(&self, job: AuditJob) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&job.job_id()) {
            return Err(AppError::Conflict("job exists".to_owned()));
        }
        jobs.insert(job.job_id(), job);
        Ok(())
    }

    async fn find_job(&self, job_id: AuditJobId) -> AppResult<Option<AuditJob>> {
        Ok(self.jobs.lock().await.get(&job_id).cloned())
    }

    async fn apply_transition(
        &self,
        job_id: AuditJobId,
        transition: AuditJobTransition,
    ) -> AppResult<AuditJob> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;
        job.apply(transition, chrono::Utc::now())?;
        Ok(job.clone())
    }
}

/// Check that finishes only once released.
pub(crate) struct GatedCheck {
    pub(crate) id: &'static str,
    pub(crate) gate: Arc<Notify>,
}

#[async_trait]
impl Check for GatedCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    fn guideline_id(&self) -> u16 {
        90
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::S3
    }

    fn description(&self) -> &'static str {
        "gated test check"
    }

    async fn run(&self, _client: &CloudResourceClient) -> CheckOutcome {
        self.gate.notified().await;
        CheckOutcome::resourceless(self.id, 90, CheckStatus::Pass, "released")
    }
}

/// Check that finishes immediately.
pub(crate) struct InstantCheck {
    pub(crate) id: &'static str,
}

#[async_trait]
impl Check for InstantCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    fn guideline_id(&self) -> u16 {
        91
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Iam
    }

    fn description(&self) -> &'static str {
        "instant test check"
    }

    async fn run(&self, _client: &CloudResourceClient) -> CheckOutcome {
        CheckOutcome::resourceless(self.id, 91, CheckStatus::Pass, "done")
    }
}

/// Check whose evaluation panics.
pub(crate) struct PanickingCheck;

#[async_trait]
impl Check for PanickingCheck {
    fn id(&self) -> &'static str {
        "panicking"
    }

    fn guideline_id(&self) -> u16 {
        92
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Ec2
    }

    fn description(&self) -> &'static str {
        "panicking test check"
    }

    async fn run(&self, _client: &CloudResourceClient) -> CheckOutcome {
        panic!("evaluation blew up")
    }
}
