use std::future;

use async_trait::async_trait;
use clouddoctor_domain::{
    CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, Instance, evidence_value,
};
use serde_json::json;

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::CloudResourceClient;

const CHECK_ID: &str = "ec2_imdsv2";
const GUIDELINE_ID: u16 = 12;

/// Fails instances whose metadata service answers without session tokens.
pub struct Ec2Imdsv2Check {
    settings: CheckSettings,
}

impl Ec2Imdsv2Check {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for Ec2Imdsv2Check {
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
        "EC2 IMDSv2 enforcement"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let instances = client.compute().describe_instances().await;
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            instances,
            "no EC2 instances exist",
            self.settings.resource_parallelism,
            |instance| future::ready(evaluate_instance(instance)),
        )
        .await
    }
}

fn evaluate_instance(instance: Instance) -> ResourceScan {
    let instance_id = instance.instance_id.as_str();
    let options = instance.metadata_options.clone().unwrap_or_default();
    let http_tokens = options.http_tokens.as_deref().unwrap_or("optional");
    let endpoint_disabled = options.http_endpoint.as_deref() == Some("disabled");
    let details = json!({
        "http_tokens": options.http_tokens,
        "http_endpoint": options.http_endpoint,
    });

    let result = if endpoint_disabled {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            instance_id,
            format!("instance {instance_id} has the metadata service disabled"),
        )
    } else if http_tokens == "required" {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            instance_id,
            format!("instance {instance_id} requires IMDSv2 session tokens"),
        )
    } else {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Fail,
            instance_id,
            format!("instance {instance_id} allows IMDSv1 requests without session tokens"),
        )
    };

    ResourceScan::new(
        result.with_details(details),
        EvidenceRecord::new(instance_id).with_document("instance", evidence_value(&instance)),
    )
}
