use async_trait::async_trait;
use clouddoctor_domain::policy_evaluator::evaluate_public_exposure;
use clouddoctor_domain::{
    Bucket, CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, PolicyDocument,
    PolicyVerdict, evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::{CloudResourceClient, Probe};

const CHECK_ID: &str = "s3_bucket_policy";
const GUIDELINE_ID: u16 = 8;
const NO_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

/// Actions that let anyone read or plant objects.
pub const PUBLIC_OBJECT_ACTIONS: &[&str] = &["s3:GetObject", "s3:PutObject", "s3:*"];

/// Fails buckets whose policy lets anyone get or put objects.
pub struct S3BucketPolicyCheck {
    settings: CheckSettings,
}

impl S3BucketPolicyCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for S3BucketPolicyCheck {
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
        "S3 bucket policy public exposure"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let buckets = client.storage().list_buckets().await;
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            buckets,
            "no S3 buckets exist",
            self.settings.resource_parallelism,
            |bucket| evaluate_bucket(client.clone(), bucket),
        )
        .await
    }
}

async fn evaluate_bucket(client: CloudResourceClient, bucket: Bucket) -> ResourceScan {
    let name = bucket.name.clone();
    let mut evidence = EvidenceRecord::new(name.as_str())
        .with_document("policy", Value::Null)
        .with_document("bucket_data", evidence_value(&bucket));

    let policy = match Probe::classify(
        client.storage().get_bucket_policy(name.as_str()).await,
        NO_BUCKET_POLICY,
    ) {
        Probe::Found(text) => match serde_json::from_str::<Value>(text.as_str()) {
            Ok(policy) => Some(policy),
            Err(error) => {
                evidence.insert_document("policy", Value::String(text));
                return ResourceScan::new(
                    CheckResult::new(
                        CHECK_ID,
                        CheckStatus::Error,
                        name.as_str(),
                        format!("bucket {name} policy is not valid JSON: {error}"),
                    ),
                    evidence,
                );
            }
        },
        Probe::Absent => None,
        Probe::Failed(error) => {
            return ResourceScan::new(
                CheckResult::new(CHECK_ID, CheckStatus::Error, name.as_str(), error.to_string()),
                evidence,
            );
        }
    };

    let document = match policy.as_ref().map(PolicyDocument::from_value).transpose() {
        Ok(document) => document,
        Err(error) => {
            evidence.insert_document("policy", policy.unwrap_or(Value::Null));
            return ResourceScan::new(
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Error,
                    name.as_str(),
                    format!("bucket {name} policy could not be evaluated: {error}"),
                ),
                evidence,
            );
        }
    };

    let policy = policy.unwrap_or(Value::Null);
    evidence.insert_document("policy", policy.clone());

    let result = match evaluate_public_exposure(document.as_ref(), PUBLIC_OBJECT_ACTIONS) {
        PolicyVerdict::NotConfigured => CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            name.as_str(),
            format!("bucket {name} has no bucket policy"),
        )
        .with_details(json!({ "policy": null })),
        PolicyVerdict::NotGranted => CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            name.as_str(),
            format!("bucket {name} policy does not allow public get/put access"),
        )
        .with_details(json!({ "policy": policy })),
        PolicyVerdict::Granted(statements) => {
            let vulnerable: Vec<Value> = statements
                .iter()
                .map(|statement| statement.raw().clone())
                .collect();
            CheckResult::new(
                CHECK_ID,
                CheckStatus::Fail,
                name.as_str(),
                format!("bucket {name} policy allows public get/put access"),
            )
            .with_details(json!({
                "policy": policy,
                "vulnerable_statements": vulnerable,
            }))
        }
    };

    ResourceScan::new(result, evidence)
}
