use async_trait::async_trait;
use clouddoctor_domain::{
    Bucket, CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{AclAccessDeniedPolicy, Check, CheckSettings};
use crate::cloud_ports::{CloudResourceClient, ProviderError};

const CHECK_ID: &str = "s3_public_access";
const GUIDELINE_ID: u16 = 9;

/// Fails buckets whose ACL grants permissions to the public groups.
pub struct S3PublicAccessCheck {
    settings: CheckSettings,
}

impl S3PublicAccessCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for S3PublicAccessCheck {
    fn id(&self) -> &'static str {
        CHECK_ID
    }

    fn guideline_id(&self) -> u16 {
        GUIDELINE_ID
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::S3
    }

    fn description(&self) -> &'static str {
        "S3 bucket public ACL grants"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let buckets = client.storage().list_buckets().await;
        let denied_policy = self.settings.acl_access_denied;
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            buckets,
            "no S3 buckets exist",
            self.settings.resource_parallelism,
            |bucket| evaluate_bucket(client.clone(), bucket, denied_policy),
        )
        .await
    }
}

async fn evaluate_bucket(
    client: CloudResourceClient,
    bucket: Bucket,
    denied_policy: AclAccessDeniedPolicy,
) -> ResourceScan {
    let name = bucket.name.clone();
    let mut evidence = EvidenceRecord::new(name.as_str())
        .with_document("acl", Value::Null)
        .with_document("bucket_data", evidence_value(&bucket));

    let result = match client.storage().get_bucket_acl(name.as_str()).await {
        Ok(acl) => {
            let acl_value = evidence_value(&acl);
            evidence.insert_document("acl", acl_value.clone());

            let public_grants: Vec<&str> = acl.public_permissions().into_iter().collect();
            if public_grants.is_empty() {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Pass,
                    name.as_str(),
                    format!("bucket {name} ACL grants no public permissions"),
                )
                .with_details(json!({ "acl": acl_value }))
            } else {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Fail,
                    name.as_str(),
                    format!(
                        "bucket {name} ACL grants public permissions: {}",
                        public_grants.join(", ")
                    ),
                )
                .with_details(json!({ "acl": acl_value, "public_grants": public_grants }))
            }
        }
        Err(error @ ProviderError::AccessDenied { .. }) => {
            access_denied_result(name.as_str(), &error, denied_policy)
        }
        Err(error) => {
            CheckResult::new(CHECK_ID, CheckStatus::Error, name.as_str(), error.to_string())
        }
    };

    ResourceScan::new(result, evidence)
}

fn access_denied_result(
    name: &str,
    error: &ProviderError,
    denied_policy: AclAccessDeniedPolicy,
) -> CheckResult {
    match denied_policy {
        AclAccessDeniedPolicy::AssumeNotPublic => CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            name,
            format!("could not access ACL for bucket {name}; assuming non-public ACL"),
        )
        .with_details(json!({ "acl": null })),
        AclAccessDeniedPolicy::Warn => CheckResult::new(
            CHECK_ID,
            CheckStatus::Warn,
            name,
            format!("could not access ACL for bucket {name}: {error}"),
        )
        .with_details(json!({ "acl": null })),
        AclAccessDeniedPolicy::Error => {
            CheckResult::new(CHECK_ID, CheckStatus::Error, name, error.to_string())
        }
    }
}
