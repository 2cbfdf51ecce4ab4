use async_trait::async_trait;
use clouddoctor_domain::{
    AccountSummary, CheckDomain, CheckOutcome, CheckResult, CheckStatus, EvidenceRecord,
    evidence_value,
};
use serde_json::json;

use super::Check;
use crate::cloud_ports::CloudResourceClient;

const ROOT_RESOURCE: &str = "root";

/// Fails accounts whose root user owns access keys.
#[derive(Default)]
pub struct IamRootAccessKeyCheck;

/// Fails accounts whose root user has no MFA device.
#[derive(Default)]
pub struct IamRootMfaCheck;

#[async_trait]
impl Check for IamRootAccessKeyCheck {
    fn id(&self) -> &'static str {
        "iam_root_access_key"
    }

    fn guideline_id(&self) -> u16 {
        1
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Iam
    }

    fn description(&self) -> &'static str {
        "Root account access keys"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        evaluate_root_account(self, client, |summary| {
            if summary.account_access_keys_present {
                (CheckStatus::Fail, "root account has active access keys")
            } else {
                (CheckStatus::Pass, "root account has no access keys")
            }
        })
        .await
    }
}

#[async_trait]
impl Check for IamRootMfaCheck {
    fn id(&self) -> &'static str {
        "iam_root_mfa"
    }

    fn guideline_id(&self) -> u16 {
        2
    }

    fn domain(&self) -> CheckDomain {
        CheckDomain::Iam
    }

    fn description(&self) -> &'static str {
        "Root account MFA"
    }

    async fn run(&self, client: &CloudResourceClient) -> CheckOutcome {
        evaluate_root_account(self, client, |summary| {
            if summary.account_mfa_enabled {
                (CheckStatus::Pass, "root account has MFA enabled")
            } else {
                (CheckStatus::Fail, "root account has no MFA enabled")
            }
        })
        .await
    }
}

async fn evaluate_root_account(
    check: &(dyn Check + '_),
    client: &CloudResourceClient,
    classify: impl Fn(&AccountSummary) -> (CheckStatus, &'static str),
) -> CheckOutcome {
    let summary = match client.identity().get_account_summary().await {
        Ok(summary) => summary,
        Err(error) => {
            return CheckOutcome::resourceless(
                check.id(),
                check.guideline_id(),
                CheckStatus::Error,
                format!("failed to read account summary: {error}"),
            );
        }
    };

    let (status, message) = classify(&summary);
    let mut outcome = CheckOutcome::new(check.id(), check.guideline_id());
    outcome.record(
        CheckResult::new(check.id(), status, ROOT_RESOURCE, message).with_details(json!({
            "account_mfa_enabled": summary.account_mfa_enabled,
            "account_access_keys_present": summary.account_access_keys_present,
        })),
        EvidenceRecord::new(ROOT_RESOURCE)
            .with_document("account_summary", evidence_value(&summary)),
    );
    outcome
}
