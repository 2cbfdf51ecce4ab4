use chrono::{DateTime, Utc};
use clouddoctor_core::{AccountReference, AppError, AppResult, AuditJobId};
use serde::{Deserialize, Serialize};

use crate::CheckOutcome;

/// Lifecycle state of an audit job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditJobStatus {
    /// Created, execution not started yet.
    Pending,
    /// Checks are executing.
    Running,
    /// Every selected check produced an outcome.
    Completed,
    /// The job could not begin.
    Failed,
}

impl AuditJobStatus {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown audit job status '{value}'"
            ))),
        }
    }

    /// Returns whether no further transition is allowed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// State change applied to an audit job by its orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditJobTransition {
    /// `pending -> running`.
    Start,
    /// Appends one finished check outcome while running.
    RecordOutcome(CheckOutcome),
    /// `running -> completed`.
    Complete,
    /// `pending|running -> failed` with the infrastructure reason.
    Fail(String),
}

impl AuditJobTransition {
    fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RecordOutcome(_) => "record outcome",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
        }
    }
}

/// One audit of one account across a selection of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditJob {
    job_id: AuditJobId,
    account: AccountReference,
    check_ids: Vec<String>,
    status: AuditJobStatus,
    outcomes: Vec<CheckOutcome>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuditJob {
    /// Creates a pending job.
    pub fn new(
        job_id: AuditJobId,
        account: AccountReference,
        check_ids: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if check_ids.is_empty() {
            return Err(AppError::Validation(
                "an audit job requires at least one check".to_owned(),
            ));
        }

        Ok(Self {
            job_id,
            account,
            check_ids,
            status: AuditJobStatus::Pending,
            outcomes: Vec::new(),
            failure_reason: None,
            created_at,
            updated_at: created_at,
        })
    }

    /// Returns the job identifier.
    #[must_use]
    pub fn job_id(&self) -> AuditJobId {
        self.job_id
    }

    /// Returns the audited account.
    #[must_use]
    pub fn account(&self) -> &AccountReference {
        &self.account
    }

    /// Returns the requested check identifiers.
    #[must_use]
    pub fn check_ids(&self) -> &[String] {
        &self.check_ids
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AuditJobStatus {
        self.status
    }

    /// Returns outcomes in completion order.
    #[must_use]
    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    /// Returns the outcome of one check, if it finished.
    #[must_use]
    pub fn outcome(&self, check_id: &str) -> Option<&CheckOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.check_id == check_id)
    }

    /// Returns the infrastructure failure reason for failed jobs.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the latest transition.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies one orchestrator transition.
    ///
    /// Terminal jobs are immutable and outcomes are append-only: a second
    /// outcome for the same check or one for an unrequested check is rejected.
    pub fn apply(&mut self, transition: AuditJobTransition, at: DateTime<Utc>) -> AppResult<()> {
        let label = transition.label();
        match (self.status, transition) {
            (AuditJobStatus::Pending, AuditJobTransition::Start) => {
                self.status = AuditJobStatus::Running;
            }
            (AuditJobStatus::Running, AuditJobTransition::RecordOutcome(outcome)) => {
                if !self.check_ids.contains(&outcome.check_id) {
                    return Err(AppError::Conflict(format!(
                        "check '{}' was not requested by audit job '{}'",
                        outcome.check_id, self.job_id
                    )));
                }

                if self.outcome(outcome.check_id.as_str()).is_some() {
                    return Err(AppError::Conflict(format!(
                        "check '{}' already recorded an outcome in audit job '{}'",
                        outcome.check_id, self.job_id
                    )));
                }

                self.outcomes.push(outcome);
            }
            (AuditJobStatus::Running, AuditJobTransition::Complete) => {
                self.status = AuditJobStatus::Completed;
            }
            (
                AuditJobStatus::Pending | AuditJobStatus::Running,
                AuditJobTransition::Fail(reason),
            ) => {
                self.status = AuditJobStatus::Failed;
                self.failure_reason = Some(reason);
            }
            (status, _) => {
                return Err(AppError::Conflict(format!(
                    "cannot {label} audit job '{}' in status '{}'",
                    self.job_id,
                    status.as_str()
                )));
            }
        }

        self.updated_at = at;
        Ok(())
    }
}
