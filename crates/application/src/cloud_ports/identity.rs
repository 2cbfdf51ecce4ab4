use async_trait::async_trait;
use clouddoctor_domain::{AccessKey, AccountSummary, AttachedPolicy, IamUser};
use serde_json::Value;

use super::ProviderResult;

/// Identity handle scoped to the audited account.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Lists inline policy names of a role.
    async fn list_role_policies(&self, role_name: &str) -> ProviderResult<Vec<String>>;

    /// Returns the document of one inline role policy.
    async fn get_role_policy(&self, role_name: &str, policy_name: &str) -> ProviderResult<Value>;

    /// Lists managed policies attached to a role.
    async fn list_attached_role_policies(
        &self,
        role_name: &str,
    ) -> ProviderResult<Vec<AttachedPolicy>>;

    /// Returns the default version id of a managed policy.
    async fn get_policy_default_version(&self, policy_arn: &str) -> ProviderResult<String>;

    /// Returns the document of one managed policy version.
    async fn get_policy_version_document(
        &self,
        policy_arn: &str,
        version_id: &str,
    ) -> ProviderResult<Value>;

    /// Lists every identity user in provider order.
    async fn list_users(&self) -> ProviderResult<Vec<IamUser>>;

    /// Lists access key metadata of one user.
    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKey>>;

    /// Returns the account-wide identity summary.
    async fn get_account_summary(&self) -> ProviderResult<AccountSummary>;
}
