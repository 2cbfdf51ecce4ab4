use async_trait::async_trait;
use clouddoctor_domain::{Bucket, BucketAcl, EncryptionConfiguration, ReplicationConfiguration};

use super::ProviderResult;

/// Object-storage handle scoped to the audited account.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Lists every bucket owned by the account, in provider order.
    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>>;

    /// Returns the bucket policy as raw JSON text.
    async fn get_bucket_policy(&self, bucket: &str) -> ProviderResult<String>;

    /// Returns the bucket access-control list.
    async fn get_bucket_acl(&self, bucket: &str) -> ProviderResult<BucketAcl>;

    /// Returns the bucket replication configuration.
    async fn get_bucket_replication(
        &self,
        bucket: &str,
    ) -> ProviderResult<ReplicationConfiguration>;

    /// Returns the bucket default encryption configuration.
    async fn get_bucket_encryption(
        &self,
        bucket: &str,
    ) -> ProviderResult<EncryptionConfiguration>;
}
