use async_trait::async_trait;
use clouddoctor_domain::{
    CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, MachineImage,
    evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::CloudResourceClient;

const CHECK_ID: &str = "ec2_ami_private";
const GUIDELINE_ID: u16 = 15;

/// Fails machine images that anyone may launch.
pub struct Ec2AmiPrivateCheck {
    settings: CheckSettings,
}

impl Ec2AmiPrivateCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for Ec2AmiPrivateCheck {
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
        "EC2 AMI private sharing"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let images = client.compute().describe_owned_images().await;
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            images,
            "no AMIs exist",
            self.settings.resource_parallelism,
            |image| evaluate_image(client.clone(), image),
        )
        .await
    }
}

async fn evaluate_image(client: CloudResourceClient, image: MachineImage) -> ResourceScan {
    let image_id = image.image_id.clone();
    let mut evidence = EvidenceRecord::new(image_id.as_str())
        .with_document("launch_permissions", Value::Null)
        .with_document("image_data", evidence_value(&image));

    let permissions = client
        .compute()
        .get_image_launch_permissions(image_id.as_str())
        .await;
    let result = match permissions {
        Ok(permissions) => {
            let permissions_value = evidence_value(&permissions);
            evidence.insert_document("launch_permissions", permissions_value.clone());

            let shared_publicly =
                image.public || permissions.iter().any(|permission| permission.is_public());
            let result = if shared_publicly {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Fail,
                    image_id.as_str(),
                    format!("AMI {image_id} is shared publicly"),
                )
            } else {
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Pass,
                    image_id.as_str(),
                    format!("AMI {image_id} is private"),
                )
            };
            result.with_details(json!({
                "public": image.public,
                "launch_permissions": permissions_value,
            }))
        }
        Err(error) => {
            CheckResult::new(CHECK_ID, CheckStatus::Error, image_id.as_str(), error.to_string())
        }
    };

    ResourceScan::new(result, evidence)
}
