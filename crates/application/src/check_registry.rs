use std::collections::BTreeMap;
use std::sync::Arc;

use clouddoctor_core::{AppError, AppResult};

use crate::checks::{
    Check, CheckSettings, EbsSnapshotPrivateCheck, Ec2AmiPrivateCheck, Ec2Imdsv2Check,
    Ec2PublicIpCheck, IamAccessKeyAgeCheck, IamRootAccessKeyCheck, IamRootMfaCheck,
    S3BucketPolicyCheck, S3EncryptionCheck, S3PublicAccessCheck, S3ReplicationRoleCheck,
};

/// Catalog grouped by domain: `{domain: {check_id: description}}`.
pub type CheckCatalog = BTreeMap<String, BTreeMap<String, String>>;

/// Explicit table of the checks an orchestrator may run.
#[derive(Clone)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Creates a registry from check instances. Identifiers must be unique.
    pub fn new(checks: Vec<Arc<dyn Check>>) -> AppResult<Self> {
        for (index, check) in checks.iter().enumerate() {
            if checks[..index]
                .iter()
                .any(|earlier| earlier.id() == check.id())
            {
                return Err(AppError::Conflict(format!(
                    "check '{}' is registered more than once",
                    check.id()
                )));
            }
        }

        Ok(Self { checks })
    }

    /// Creates a registry holding every built-in check.
    pub fn with_default_checks(settings: CheckSettings) -> AppResult<Self> {
        settings.validate()?;

        Self::new(vec![
            Arc::new(IamAccessKeyAgeCheck::new(settings)),
            Arc::new(IamRootAccessKeyCheck),
            Arc::new(IamRootMfaCheck),
            Arc::new(S3BucketPolicyCheck::new(settings)),
            Arc::new(S3PublicAccessCheck::new(settings)),
            Arc::new(S3EncryptionCheck::new(settings)),
            Arc::new(S3ReplicationRoleCheck::new(settings)),
            Arc::new(Ec2Imdsv2Check::new(settings)),
            Arc::new(Ec2PublicIpCheck::new(settings)),
            Arc::new(Ec2AmiPrivateCheck::new(settings)),
            Arc::new(EbsSnapshotPrivateCheck::new(settings)),
        ])
    }

    /// Returns one check by identifier.
    #[must_use]
    pub fn get(&self, check_id: &str) -> Option<Arc<dyn Check>> {
        self.checks
            .iter()
            .find(|check| check.id() == check_id)
            .cloned()
    }

    /// Returns every registered identifier in registration order.
    #[must_use]
    pub fn check_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.id()).collect()
    }

    /// Resolves requested identifiers to checks.
    ///
    /// Duplicates collapse to their first occurrence. Unknown identifiers
    /// are rejected together rather than dropped.
    pub fn resolve(&self, check_ids: &[String]) -> AppResult<Vec<Arc<dyn Check>>> {
        if check_ids.is_empty() {
            return Err(AppError::Validation(
                "at least one check must be requested".to_owned(),
            ));
        }

        let mut resolved: Vec<Arc<dyn Check>> = Vec::new();
        let mut unknown: Vec<&str> = Vec::new();
        for check_id in check_ids {
            let check_id = check_id.trim();
            match self.get(check_id) {
                Some(check) => {
                    if !resolved.iter().any(|known| known.id() == check.id()) {
                        resolved.push(check);
                    }
                }
                None => unknown.push(check_id),
            }
        }

        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "unknown check identifiers: {}",
                unknown.join(", ")
            )));
        }

        Ok(resolved)
    }

    /// Returns the read-only catalog grouped by domain.
    #[must_use]
    pub fn catalog(&self) -> CheckCatalog {
        let mut catalog = CheckCatalog::new();
        for check in &self.checks {
            catalog
                .entry(check.domain().as_str().to_owned())
                .or_default()
                .insert(check.id().to_owned(), check.description().to_owned());
        }

        catalog
    }
}
