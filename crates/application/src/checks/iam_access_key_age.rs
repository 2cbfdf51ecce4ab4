use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clouddoctor_domain::{
    CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, IamUser, evidence_value,
};
use serde_json::{Value, json};

use super::scan::{ResourceScan, scan_resources};
use super::{Check, CheckSettings};
use crate::cloud_ports::CloudResourceClient;

const CHECK_ID: &str = "iam_access_key_age";
const GUIDELINE_ID: u16 = 3;

/// Fails users holding an active access key older than the configured age.
pub struct IamAccessKeyAgeCheck {
    settings: CheckSettings,
}

impl IamAccessKeyAgeCheck {
    /// Creates the check.
    #[must_use]
    pub fn new(settings: CheckSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for IamAccessKeyAgeCheck {
    fn id(&self) -> &'static str {
        CHECK_ID
    }

    fn guideline_id(&self) -> u16 {
        GUIDELINE_ID
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Iam
    }

    fn description(&self) -> &'static str {
        "IAM access key age"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        let users = client.identity().list_users().await;
        let max_age_days = i64::from(self.settings.access_key_max_age_days);
        let now = Utc::now();
        scan_resources(
            CHECK_ID,
            GUIDELINE_ID,
            users,
            "no IAM users exist",
            self.settings.resource_parallelism,
            |user| evaluate_user(client.clone(), user, max_age_days, now),
        )
        .await
    }
}

async fn evaluate_user(
    client: CloudResourceClient,
    user: IamUser,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> ResourceScan {
    let user_name = user.user_name.clone();
    let mut evidence = EvidenceRecord::new(user_name.as_str())
        .with_document("access_keys", Value::Null)
        .with_document("user_data", evidence_value(&user));

    let keys = match client.identity().list_access_keys(user_name.as_str()).await {
        Ok(keys) => keys,
        Err(error) => {
            return ResourceScan::new(
                CheckResult::new(
                    CHECK_ID,
                    CheckStatus::Error,
                    user_name.as_str(),
                    error.to_string(),
                ),
                evidence,
            );
        }
    };
    evidence.insert_document("access_keys", evidence_value(&keys));

    let stale: Vec<Value> = keys
        .iter()
        .filter(|key| key.is_active() && key.age_days(now) > max_age_days)
        .map(|key| {
            json!({
                "access_key_id": key.access_key_id,
                "age_days": key.age_days(now),
            })
        })
        .collect();

    let result = if stale.is_empty() {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Pass,
            user_name.as_str(),
            format!("user {user_name} has no active access key older than {max_age_days} days"),
        )
    } else {
        CheckResult::new(
            CHECK_ID,
            CheckStatus::Fail,
            user_name.as_str(),
            format!(
                "user {user_name} has {} active access key(s) older than {max_age_days} days",
                stale.len()
            ),
        )
    };

    ResourceScan::new(
        result.with_details(json!({
            "max_age_days": max_age_days,
            "stale_access_keys": stale,
        })),
        evidence,
    )
}
