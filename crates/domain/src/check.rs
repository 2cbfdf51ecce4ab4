use std::str::FromStr;

use clouddoctor_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource identifier used when a check has no applicable resource.
pub const NO_RESOURCE: &str = "N/A";

/// Verdict of one check against one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// Resource complies with the rule.
    Pass,
    /// Resource violates the rule.
    Fail,
    /// Resource could not be judged conclusively.
    Warn,
    /// Evaluation failed for this resource.
    Error,
}

impl CheckStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl FromStr for CheckStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            "WARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            _ => Err(AppError::Validation(format!(
                "unknown check status '{value}'"
            ))),
        }
    }
}

/// Service family a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckDomain {
    /// Identity and access management.
    Iam,
    /// Object storage.
    S3,
    /// Compute instances and block storage.
    Ec2,
}

impl CheckDomain {
    /// Returns a stable catalog key for this domain.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iam => "iam",
            Self::S3 => "s3",
            Self::Ec2 => "ec2",
        }
    }
}

/// Verdict emitted by a check for a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Identifier of the emitting check.
    pub check_id: String,
    /// Verdict.
    pub status: CheckStatus,
    /// Evaluated resource, or [`NO_RESOURCE`].
    pub resource_id: String,
    /// Human-readable explanation.
    pub message: String,
    /// Check-specific structured details.
    pub details: Value,
}

impl CheckResult {
    /// Creates a result with empty details.
    #[must_use]
    pub fn new(
        check_id: impl Into<String>,
        status: CheckStatus,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            check_id: check_id.into(),
            status,
            resource_id: resource_id.into(),
            message: message.into(),
            details: Value::Object(Map::new()),
        }
    }

    /// Replaces the structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Returns whether this result refers to no concrete resource.
    #[must_use]
    pub fn is_resourceless(&self) -> bool {
        self.resource_id == NO_RESOURCE
    }
}

/// Raw provider documents that backed a verdict for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Visited resource.
    pub resource_id: String,
    /// Provider documents keyed by what they are (`policy`, `acl`, ...).
    pub documents: Map<String, Value>,
}

impl EvidenceRecord {
    /// Creates an evidence record without documents.
    #[must_use]
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            documents: Map::new(),
        }
    }

    /// Adds or replaces one document.
    #[must_use]
    pub fn with_document(mut self, key: &str, document: Value) -> Self {
        self.documents.insert(key.to_owned(), document);
        self
    }

    /// Adds or replaces one document in place.
    pub fn insert_document(&mut self, key: &str, document: Value) {
        self.documents.insert(key.to_owned(), document);
    }
}

/// Everything one check produced during one audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Identifier of the executed check.
    pub check_id: String,
    /// Numeric guideline classification of the check.
    pub guideline_id: u16,
    /// Results in resource enumeration order.
    pub results: Vec<CheckResult>,
    /// Evidence in resource enumeration order.
    pub evidence: Vec<EvidenceRecord>,
}

impl CheckOutcome {
    /// Creates an empty outcome for a check.
    #[must_use]
    pub fn new(check_id: impl Into<String>, guideline_id: u16) -> Self {
        Self {
            check_id: check_id.into(),
            guideline_id,
            results: Vec::new(),
            evidence: Vec::new(),
        }
    }

    /// Creates an outcome carrying one resourceless result.
    #[must_use]
    pub fn resourceless(
        check_id: impl Into<String>,
        guideline_id: u16,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> Self {
        let check_id = check_id.into();
        let result = CheckResult::new(check_id.clone(), status, NO_RESOURCE, message);
        Self {
            check_id,
            guideline_id,
            results: vec![result],
            evidence: Vec::new(),
        }
    }

    /// Appends the result and evidence of one visited resource.
    pub fn record(&mut self, result: CheckResult, evidence: EvidenceRecord) {
        self.results.push(result);
        self.evidence.push(evidence);
    }

    /// Counts results with the given status.
    #[must_use]
    pub fn count(&self, status: CheckStatus) -> usize {
        self.results
            .iter()
            .filter(|result| result.status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::{CheckOutcome, CheckResult, CheckStatus, EvidenceRecord, NO_RESOURCE};

    #[test]
    fn status_serializes_uppercase() {
        let value = serde_json::to_value(CheckStatus::Warn).unwrap_or_default();
        assert_eq!(value, json!("WARN"));
        assert!(matches!(CheckStatus::from_str("FAIL"), Ok(CheckStatus::Fail)));
        assert!(CheckStatus::from_str("fail").is_err());
    }

    #[test]
    fn results_default_to_empty_object_details() {
        let result = CheckResult::new("s3_encryption", CheckStatus::Pass, "bucket", "ok");
        assert_eq!(result.details, json!({}));
        assert!(!result.is_resourceless());
    }

    #[test]
    fn resourceless_outcome_uses_sentinel() {
        let outcome = CheckOutcome::resourceless("s3_encryption", 10, CheckStatus::Pass, "none");
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].resource_id, NO_RESOURCE);
        assert!(outcome.evidence.is_empty());
    }

    #[test]
    fn record_keeps_results_and_evidence_aligned() {
        let mut outcome = CheckOutcome::new("s3_encryption", 10);
        outcome.record(
            CheckResult::new("s3_encryption", CheckStatus::Fail, "a", "no encryption"),
            EvidenceRecord::new("a").with_document("encryption", json!(null)),
        );
        outcome.record(
            CheckResult::new("s3_encryption", CheckStatus::Pass, "b", "encrypted"),
            EvidenceRecord::new("b"),
        );

        assert_eq!(outcome.count(CheckStatus::Fail), 1);
        assert_eq!(outcome.evidence[0].resource_id, "a");
        assert_eq!(outcome.evidence[1].resource_id, "b");
    }
}
