use std::future::Future;

use clouddoctor_domain::{CheckOutcome, CheckResult, CheckStatus, EvidenceRecord};
use futures::stream::{self, StreamExt};

use crate::cloud_ports::ProviderResult;

/// Verdict and evidence for one visited resource.
pub(crate) struct ResourceScan {
    result: CheckResult,
    evidence: EvidenceRecord,
}

impl ResourceScan {
    pub(crate) fn new(result: CheckResult, evidence: EvidenceRecord) -> Self {
        Self { result, evidence }
    }
}

/// Runs the enumerate-then-evaluate loop shared by per-resource checks.
///
/// Enumeration failure yields one resourceless `ERROR`, an empty collection
/// one resourceless `PASS`. Up to `parallelism` resources are evaluated at
/// once and recorded in enumeration order.
pub(crate) async fn scan_resources<R, F, Fut>(
    check_id: &'static str,
    guideline_id: u16,
    enumeration: ProviderResult<Vec<R>>,
    empty_message: &str,
    parallelism: usize,
    evaluate: F,
) -> CheckOutcome
where
    F: FnMut(R) -> Fut,
    Fut: Future<Output = ResourceScan>,
{
    let resources = match enumeration {
        Ok(resources) => resources,
        Err(error) => {
            return CheckOutcome::resourceless(
                check_id,
                guideline_id,
                CheckStatus::Error,
                format!("failed to enumerate resources: {error}"),
            );
        }
    };

    if resources.is_empty() {
        return CheckOutcome::resourceless(
            check_id,
            guideline_id,
            CheckStatus::Pass,
            empty_message,
        );
    }

    let scans: Vec<ResourceScan> = stream::iter(resources)
        .map(evaluate)
        .buffered(parallelism.max(1))
        .collect()
        .await;

    let mut outcome = CheckOutcome::new(check_id, guideline_id);
    for scan in scans {
        outcome.record(scan.result, scan.evidence);
    }

    outcome
}
