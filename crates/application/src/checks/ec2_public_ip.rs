use std::future;

use async_trait::async_trait;
use clouddoctor_domain::{
    CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, Instance, evidence_value,
};
use serde_json::json;

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::CloudResourceClient;

const CHECK_ID: &str = "ec2_public_ip";
const GUIDELINE_ID: u16 = 14;

/// Fails instances reachable through a public IPv4 address.
pub struct Ec2PublicIpCheck {
    settings: CheckSettings,
}

impl Ec2PublicIpCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for Ec2PublicIpCheck {
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
        "EC2 public IP exposure"
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
    let public_ip = instance
        .public_ip_address
        .as_deref()
        .filter(|address| !address.is_empty());

    let result = match public_ip {
        Some(address) => CheckResult::new(
            CHECK_ID,
            CheckStatus::Fail,
            instance_id,
            format!("instance {instance_id} has public IP address {address}"),
        ),
        None => CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            instance_id,
            format!("instance {instance_id} has no public IP address"),
        ),
    };

    ResourceScan::new(
        result.with_details(json!({ "public_ip_address": public_ip })),
        EvidenceRecord::new(instance_id).with_document("instance", evidence_value(&instance)),
    )
}
