use async_trait::async_trait;
use clouddoctor_domain::{
    CreateVolumePermission, Instance, LaunchPermission, MachineImage, Snapshot,
};

use super::ProviderResult;

/// Compute handle scoped to the audited account.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Lists every instance in provider order.
    async fn describe_instances(&self) -> ProviderResult<Vec<Instance>>;

    /// Lists snapshots owned by the account in provider order.
    async fn describe_owned_snapshots(&self) -> ProviderResult<Vec<Snapshot>>;

    /// Returns the create-volume permissions of one snapshot.
    async fn get_snapshot_create_volume_permissions(
        &self,
        snapshot_id: &str,
    ) -> ProviderResult<Vec<CreateVolumePermission>>;

    /// Lists machine images owned by the account in provider order.
    async fn describe_owned_images(&self) -> ProviderResult<Vec<MachineImage>>;

    /// Returns the launch permissions of one machine image.
    async fn get_image_launch_permissions(
        &self,
        image_id: &str,
    ) -> ProviderResult<Vec<LaunchPermission>>;
}
