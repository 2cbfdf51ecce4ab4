use async_trait::async_trait;
use clouddoctor_domain::{
    Bucket, CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::{CloudResourceClient, Probe};

const CHECK_ID: &str = "s3_encryption";
const GUIDELINE_ID: u16 = 10;
const ENCRYPTION_NOT_FOUND: &str = "ServerSideEncryptionConfigurationNotFoundError";

/// Fails buckets without a default server-side encryption configuration.
pub struct S3EncryptionCheck {
    settings: CheckSettings,
}

impl S3EncryptionCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for S3EncryptionCheck {
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
        "S3 bucket encryption at rest"
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
        .with_document("encryption", Value::Null)
        .with_document("bucket_data", evidence_value(&bucket));

    let result = match Probe::classify(
        client.storage().get_bucket_encryption(name.as_str()).await,
        ENCRYPTION_NOT_FOUND,
    ) {
        Probe::Found(encryption) => {
            let encryption = evidence_value(&encryption);
            evidence.insert_document("encryption", encryption.clone());
            CheckResult::new(
                CHECK_ID,
                CheckStatus::Pass,
                name.as_str(),
                format!("bucket {name} has default encryption configured"),
            )
            .with_details(json!({ "encryption": encryption }))
        }
        Probe::Absent => CheckResult::new(
            CHECK_ID,
            CheckStatus::Fail,
            name.as_str(),
            format!("bucket {name} has no default encryption configured"),
        )
        .with_details(json!({ "encryption": null })),
        Probe::Failed(error) => {
            CheckResult::new(CHECK_ID, CheckStatus::Error, name.as_str(), error.to_string())
        }
    };

    ResourceScan::new(result, evidence)
}
