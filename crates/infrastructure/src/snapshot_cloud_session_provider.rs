use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use clouddoctor_application::{CloudResourceClient, CloudSessionProvider};
use clouddoctor_core::{AccountReference, AppError, AppResult};
use tracing::{info, warn};

use account_snapshot::AccountSnapshot;

mod account_snapshot;
mod clients;


/// Session provider replaying a recorded account state.
///
/// The snapshot is a JSON document holding the answer, or the recorded
/// `{"error": {"code", "message"}}` failure, of every provider call a
/// check may issue.
#[derive(Debug, Clone)]
pub struct SnapshotCloudSessionProvider {
    snapshot: Arc<AccountSnapshot>,
}

impl SnapshotCloudSessionProvider {
    /// Parses a snapshot document.
    pub fn from_json_str(document: &str) -> AppResult<Self> {
        let snapshot: AccountSnapshot = serde_json::from_str(document).map_err(|error| {
            AppError::Validation(format!("invalid account snapshot: {error}"))
        })?;

        Ok(Self {
            snapshot: Arc::new(snapshot),
        })
    }

    /// Reads and parses a snapshot file.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let document = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to read account snapshot '{}': {error}",
                path.display()
            ))
        })?;

        Self::from_json_str(document.as_str())
    }

    fn authorize(&self, account: &AccountReference) -> AppResult<()> {
        if account.account_id() != self.snapshot.account_id {
            return Err(AppError::Unauthorized(format!(
                "account '{}' is not reachable with this snapshot",
                account.account_id()
            )));
        }

        if !self
            .snapshot
            .assumable_roles
            .iter()
            .any(|role| role == account.role_name())
        {
            return Err(AppError::Unauthorized(format!(
                "role '{}' may not be assumed",
                account.role_arn()
            )));
        }

        if let Some(expected) = self.snapshot.external_id.as_deref()
            && account.external_id() != Some(expected)
        {
            return Err(AppError::Unauthorized(format!(
                "external id does not match the trust policy of '{}'",
                account.role_arn()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl CloudSessionProvider for SnapshotCloudSessionProvider {
    async fn open_session(&self, account: &AccountReference) -> AppResult<CloudResourceClient> {
        if let Err(error) = self.authorize(account) {
            warn!(
                account_id = account.account_id(),
                role_name = account.role_name(),
                error = %error,
                "session refused"
            );
            return Err(error);
        }

        info!(
            account_id = account.account_id(),
            role_name = account.role_name(),
            "session opened from account snapshot"
        );

        let snapshot = self.snapshot.clone();
        Ok(CloudResourceClient::new(
            snapshot.clone(),
            snapshot.clone(),
            snapshot,
        ))
    }
}
