use async_trait::async_trait;
use clouddoctor_application::{
    ComputeClient, IdentityClient, ProviderError, ProviderResult, StorageClient,
};
use clouddoctor_domain::{
    AccessKey, AccountSummary, AttachedPolicy, Bucket, BucketAcl, CreateVolumePermission,
    EncryptionConfiguration, IamUser, Instance, LaunchPermission, MachineImage,
    ReplicationConfiguration, Snapshot,
};
use serde_json::Value;

use super::account_snapshot::{AccountSnapshot, BucketEntry, RoleEntry, replay_or_absent};

fn no_such_bucket(bucket: &str) -> ProviderError {
    ProviderError::from_code(
        "NoSuchBucket",
        format!("The specified bucket '{bucket}' does not exist"),
    )
}

fn no_such_entity(kind: &str, name: &str) -> ProviderError {
    ProviderError::from_code(
        "NoSuchEntity",
        format!("The {kind} with name {name} cannot be found."),
    )
}

impl AccountSnapshot {
    fn bucket(&self, bucket: &str) -> ProviderResult<&BucketEntry> {
        self.buckets
            .answer()?
            .iter()
            .find(|entry| entry.name == bucket)
            .ok_or_else(|| no_such_bucket(bucket))
    }

    fn role(&self, role_name: &str) -> ProviderResult<&RoleEntry> {
        self.roles
            .get(role_name)
            .ok_or_else(|| no_such_entity("role", role_name))
    }
}

#[async_trait]
impl StorageClient for AccountSnapshot {
    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>> {
        Ok(self
            .buckets
            .answer()?
            .iter()
            .map(|entry| Bucket {
                name: entry.name.clone(),
                creation_date: entry.creation_date,
            })
            .collect())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> ProviderResult<String> {
        let entry = self.bucket(bucket)?;
        let policy = replay_or_absent(
            entry.policy.as_ref(),
            "NoSuchBucketPolicy",
            "The bucket policy does not exist",
        )?;

        Ok(match policy {
            Value::String(text) => text,
            document => document.to_string(),
        })
    }

    async fn get_bucket_acl(&self, bucket: &str) -> ProviderResult<BucketAcl> {
        let entry = self.bucket(bucket)?;
        match entry.acl.as_ref() {
            Some(slot) => slot.replay(),
            None => Ok(BucketAcl::default()),
        }
    }

    async fn get_bucket_replication(
        &self,
        bucket: &str,
    ) -> ProviderResult<ReplicationConfiguration> {
        let entry = self.bucket(bucket)?;
        replay_or_absent(
            entry.replication.as_ref(),
            "ReplicationConfigurationNotFoundError",
            "The replication configuration was not found",
        )
    }

    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ProviderResult<EncryptionConfiguration> {
        let entry = self.bucket(bucket)?;
        replay_or_absent(
            entry.encryption.as_ref(),
            "ServerSideEncryptionConfigurationNotFoundError",
            "The server side encryption configuration was not found",
        )
    }
}

#[async_trait]
impl IdentityClient for AccountSnapshot {
    async fn list_role_policies(&self, role_name: &str) -> ProviderResult<Vec<String>> {
        Ok(self
            .role(role_name)?
            .inline_policies
            .answer()?
            .keys()
            .cloned()
            .collect())
    }

    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> ProviderResult<Value> {
        self.role(role_name)?
            .inline_policies
            .answer()?
            .get(policy_name)
            .cloned()
            .ok_or_else(|| no_such_entity("role policy", policy_name))
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
    ) -> ProviderResult<Vec<AttachedPolicy>> {
        self.role(role_name)?.attached_policies.replay()
    }

    async fn get_policy_default_version(&self, policy_arn: &str) -> ProviderResult<String> {
        self.managed_policies
            .get(policy_arn)
            .map(|policy| policy.default_version.clone())
            .ok_or_else(|| no_such_entity("policy", policy_arn))
    }

    async fn get_policy_version_document(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> ProviderResult<Value> {
        let policy = self
            .managed_policies
            .get(policy_arn)
            .ok_or_else(|| no_such_entity("policy", policy_arn))?;
        if policy.default_version != version_id {
            return Err(no_such_entity("policy version", version_id));
        }

        policy.document.replay()
    }

    async fn list_users(&self) -> ProviderResult<Vec<IamUser>> {
        Ok(self
            .users
            .answer()?
            .iter()
            .map(|entry| IamUser {
                user_name: entry.user_name.clone(),
                create_date: entry.create_date,
            })
            .collect())
    }

    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKey>> {
        self.users
            .answer()?
            .iter()
            .find(|entry| entry.user_name == user_name)
            .ok_or_else(|| no_such_entity("user", user_name))?
            .access_keys
            .replay()
    }

    async fn get_account_summary(&self) -> ProviderResult<AccountSummary> {
        self.account_summary.replay()
    }
}

#[async_trait]
impl ComputeClient for AccountSnapshot {
    async fn describe_instances(&self) -> ProviderResult<Vec<Instance>> {
        self.instances.replay()
    }

    async fn describe_owned_snapshots(&self) -> ProviderResult<Vec<Snapshot>> {
        Ok(self
            .snapshots
            .answer()?
            .iter()
            .map(|entry| Snapshot {
                snapshot_id: entry.snapshot_id.clone(),
                volume_id: entry.volume_id.clone(),
                encrypted: entry.encrypted,
            })
            .collect())
    }

    async fn get_snapshot_create_volume_permissions(
        &self,
        snapshot_id: &str,
    ) -> ProviderResult<Vec<CreateVolumePermission>> {
        self.snapshots
            .answer()?
            .iter()
            .find(|entry| entry.snapshot_id == snapshot_id)
            .ok_or_else(|| {
                ProviderError::from_code(
                    "InvalidSnapshot.NotFound",
                    format!("The snapshot '{snapshot_id}' does not exist."),
                )
            })?
            .create_volume_permissions
            .replay()
    }

    async fn describe_owned_images(&self) -> ProviderResult<Vec<MachineImage>> {
        Ok(self
            .images
            .answer()?
            .iter()
            .map(|entry| MachineImage {
                image_id: entry.image_id.clone(),
                name: entry.name.clone(),
                public: entry.public,
            })
            .collect())
    }

    async fn get_image_launch_permissions(
        &self,
        image_id: &str,
    ) -> ProviderResult<Vec<LaunchPermission>> {
        self.images
            .answer()?
            .iter()
            .find(|entry| entry.image_id == image_id)
            .ok_or_else(|| {
                ProviderError::from_code(
                    "InvalidAMIID.NotFound",
                    format!("The image id '[{image_id}]' does not exist"),
                )
            })?
            .launch_permissions
            .replay()
    }
}
