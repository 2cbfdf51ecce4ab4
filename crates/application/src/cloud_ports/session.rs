use std::sync::Arc;

use async_trait::async_trait;
use clouddoctor_core::{AccountReference, AppResult};

use super::{ComputeClient, IdentityClient, StorageClient};

/// Per-service handles scoped to one audited account.
#[derive(Clone)]
pub struct CloudResourceClient {
    storage: Arc<dyn StorageClient>,
    identity: Arc<dyn IdentityClient>,
    compute: Arc<dyn ComputeClient>,
}

impl CloudResourceClient {
    /// Bundles service handles into one account-scoped client.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageClient>,
        identity: Arc<dyn IdentityClient>,
        compute: Arc<dyn ComputeClient>,
    ) -> Self {
        Self {
            storage,
            identity,
            compute,
        }
    }

    /// Returns the object-storage handle.
    #[must_use]
    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    /// Returns the identity handle.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityClient {
        self.identity.as_ref()
    }

    /// Returns the compute handle.
    #[must_use]
    pub fn compute(&self) -> &dyn ComputeClient {
        self.compute.as_ref()
    }
}

/// Establishes account sessions for audits.
#[async_trait]
pub trait CloudSessionProvider: Send + Sync {
    /// Assumes the audit role and returns account-scoped handles.
    ///
    /// A failure here is a job-level infrastructure failure.
    async fn open_session(&self, account: &AccountReference) -> AppResult<CloudResourceClient>;
}
