use async_trait::async_trait;
use clouddoctor_domain::policy_evaluator::is_resource_scoped;
use clouddoctor_domain::{
    Bucket, CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, PolicyDocument,
    evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::{CloudResourceClient, IdentityClient, Probe, ProviderResult};

const CHECK_ID: &str = "s3_replication_role";
const GUIDELINE_ID: u16 = 11;
const REPLICATION_NOT_FOUND: &str = "ReplicationConfigurationNotFoundError";

/// Actions a replication role needs on its destination.
pub const REPLICATION_ACTIONS: &[&str] = &["s3:ReplicateObject", "s3:ReplicateDelete", "s3:*"];

/// Fails buckets whose replication role may write outside the destination.
pub struct S3ReplicationRoleCheck {
    settings: CheckSettings,
}

impl S3ReplicationRoleCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for S3ReplicationRoleCheck {
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
        "S3 replication rule IAM role scope"
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

/// Role policy inspected while resolving replication scope.
struct ScannedPolicy {
    name: String,
    kind: &'static str,
    arn: Option<String>,
    document: Value,
    parsed: Result<PolicyDocument, String>,
}

impl ScannedPolicy {
    fn new(name: String, kind: &'static str, arn: Option<String>, document: Value) -> Self {
        let parsed = PolicyDocument::from_value(&document).map_err(|error| error.to_string());
        Self {
            name,
            kind,
            arn,
            document,
            parsed,
        }
    }

    fn scopes(&self, resource_arn: &str) -> bool {
        self.parsed
            .as_ref()
            .is_ok_and(|document| is_resource_scoped(document, REPLICATION_ACTIONS, resource_arn))
    }

    fn parse_error(&self) -> Option<&str> {
        self.parsed.as_ref().err().map(String::as_str)
    }

    fn to_evidence(&self) -> Value {
        let mut value = json!({
            "name": self.name,
            "type": self.kind,
            "document": self.document,
        });
        if let Some(object) = value.as_object_mut() {
            if let Some(arn) = self.arn.as_ref() {
                object.insert("arn".to_owned(), Value::String(arn.clone()));
            }
            if let Some(error) = self.parse_error() {
                object.insert("parse_error".to_owned(), Value::String(error.to_owned()));
            }
        }
        value
    }
}

async fn scan_role_policies(
    identity: &dyn IdentityClient,
    role_name: &str,
) -> ProviderResult<Vec<ScannedPolicy>> {
    let mut scanned = Vec::new();

    for policy_name in identity.list_role_policies(role_name).await? {
        let document = identity
            .get_role_policy(role_name, policy_name.as_str())
            .await?;
        scanned.push(ScannedPolicy::new(policy_name, "inline", None, document));
    }

    for attached in identity.list_attached_role_policies(role_name).await? {
        let version = identity
            .get_policy_default_version(attached.policy_arn.as_str())
            .await?;
        let document = identity
            .get_policy_version_document(attached.policy_arn.as_str(), version.as_str())
            .await?;
        scanned.push(ScannedPolicy::new(
            attached.policy_name,
            "attached",
            Some(attached.policy_arn),
            document,
        ));
    }

    Ok(scanned)
}

async fn evaluate_bucket(client: CloudResourceClient, bucket: Bucket) -> ResourceScan {
    let name = bucket.name.clone();
    let mut evidence = EvidenceRecord::new(name.as_str())
        .with_document("replication_configuration", Value::Null)
        .with_document("scanned_iam_policies", json!([]))
        .with_document("bucket_data", evidence_value(&bucket));
    let not_configured = CheckResult::new(
        CHECK_ID,
        CheckStatus::Pass,
        name.as_str(),
        format!("bucket {name} has no replication configured"),
    )
    .with_details(json!({ "replication_configuration": null }));

    let replication = client.storage().get_bucket_replication(name.as_str()).await;
    let configuration = match Probe::classify(replication, REPLICATION_NOT_FOUND) {
        Probe::Found(configuration) => configuration,
        Probe::Absent => return ResourceScan::new(not_configured, evidence),
        Probe::Failed(error) => {
            return ResourceScan::new(
                CheckResult::new(CHECK_ID, CheckStatus::Error, name.as_str(), error.to_string()),
                evidence,
            );
        }
    };

    let configuration_value = evidence_value(&configuration);
    evidence.insert_document("replication_configuration", configuration_value.clone());

    let role_name = match configuration.role_name() {
        Some(role_name) if !configuration.rules.is_empty() => role_name.to_owned(),
        _ => return ResourceScan::new(not_configured, evidence),
    };

    let mut destinations: Vec<&str> = Vec::new();
    for rule in &configuration.rules {
        let Some(destination) = rule.destination_bucket.as_deref() else {
            return ResourceScan::new(
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Warn,
                    name.as_str(),
                    format!("bucket {name} replication rule has no destination bucket"),
                )
                .with_details(json!({ "replication_configuration": configuration_value })),
                evidence,
            );
        };
        if !destinations.contains(&destination) {
            destinations.push(destination);
        }
    }

    let scanned = match scan_role_policies(client.identity(), role_name.as_str()).await {
        Ok(scanned) => scanned,
        Err(error) => {
            return ResourceScan::new(
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Error,
                    name.as_str(),
                    format!("failed to inspect replication role {role_name}: {error}"),
                ),
                evidence,
            );
        }
    };

    let scanned_value = Value::Array(scanned.iter().map(ScannedPolicy::to_evidence).collect());
    evidence.insert_document("scanned_iam_policies", scanned_value.clone());

    let unrestricted: Vec<&str> = destinations
        .iter()
        .copied()
        .filter(|destination| {
            let objects_arn = format!("{destination}/*");
            !scanned
                .iter()
                .any(|policy| policy.scopes(objects_arn.as_str()))
        })
        .collect();

    let unparsed: Vec<&str> = scanned
        .iter()
        .filter(|policy| policy.parse_error().is_some())
        .map(|policy| policy.name.as_str())
        .collect();

    let result = if unrestricted.is_empty() {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            name.as_str(),
            format!(
                "replication role {role_name} is restricted to destination {}",
                destinations.join(", ")
            ),
        )
        .with_details(json!({ "replication_configuration": configuration_value }))
    } else if !unparsed.is_empty() {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Error,
            name.as_str(),
            format!(
                "replication role {role_name} policies could not be evaluated: {}",
                unparsed.join(", ")
            ),
        )
        .with_details(json!({
            "replication_configuration": configuration_value,
            "scanned_iam_policies": scanned_value,
            "unrestricted_destinations": unrestricted,
        }))
    } else {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Fail,
            name.as_str(),
            format!(
                "replication role {role_name} is not restricted to destination {}",
                unrestricted.join(", ")
            ),
        )
        .with_details(json!({
            "replication_configuration": configuration_value,
            "scanned_iam_policies": scanned_value,
            "unrestricted_destinations": unrestricted,
        }))
    };

    ResourceScan::new(result, evidence)
}
