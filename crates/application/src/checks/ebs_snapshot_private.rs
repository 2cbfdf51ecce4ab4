use async_trait::async_trait;
use clouddoctor_domain::{
    CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, Snapshot, evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::CloudResourceClient;

const CHECK_ID: &str = "ebs_snapshot_private";
const GUIDELINE_ID: u16 = 13;

/// Fails snapshots that anyone may create volumes from.
pub struct EbsSnapshotPrivateCheck {
    settings: CheckSettings,
}

impl EbsSnapshotPrivateCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for EbsSnapshotPrivateCheck {
    fn id(&self) -> &'static str {
        CHECK_ID
    }

    fn guideline_id(&self) -> u16 {
        GUIDELINE_ID
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Ec2
    }

    fn description(&self) -> &'static str {
        "EBS snapshot private sharing"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let snapshots = client.compute().describe_owned_snapshots().await;
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            snapshots,
            "no EBS snapshots exist",
            self.settings.resource_parallelism,
            |snapshot| evaluate_snapshot(client.clone(), snapshot),
        )
        .await
    }
}

async fn evaluate_snapshot(client: CloudResourceClient, snapshot: Snapshot) -> ResourceScan {
    let snapshot_id = snapshot.snapshot_id.clone();
    let mut evidence = EvidenceRecord::new(snapshot_id.as_str())
        .with_document("create_volume_permissions", Value::Null)
        .with_document("snapshot_data", evidence_value(&snapshot));

    let permissions = client
        .compute()
        .get_snapshot_create_volume_permissions(snapshot_id.as_str())
        .await;
    let result = match permissions {
        Ok(permissions) => {
            let permissions_value = evidence_value(&permissions);
            evidence.insert_document("create_volume_permissions", permissions_value.clone());

            let result = if permissions.iter().any(|permission| permission.is_public()) {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Fail,
                    snapshot_id.as_str(),
                    format!("snapshot {snapshot_id} is shared publicly"),
                )
            } else {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Pass,
                    snapshot_id.as_str(),
                    format!("snapshot {snapshot_id} is private"),
                )
            };
            result.with_details(json!({ "create_volume_permissions": permissions_value }))
        }
        Err(error) => CheckResult::new(
            CHECK_ID,
            CheckStatus::Error,
            snapshot_id.as_str(),
            error.to_string(),
        ),
    };

    ResourceScan::new(result, evidence)
}
