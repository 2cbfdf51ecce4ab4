use std::sync::Arc;

use clouddoctor_core::{AppError, AppResult, AuditJobId};
use clouddoctor_domain::{AuditJob, AuditJobStatus};
use serde::{Deserialize, Serialize};

use crate::audit_ports::AuditJobRepository;
use crate::check_registry::{CheckCatalog, CheckRegistry};
use crate::cloud_ports::CloudSessionProvider;

mod run;
mod start;
mod status;


/// Input accepted by [`AuditService::start_audit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAuditInput {
    /// Twelve digit account identifier.
    pub account_id: String,
    /// Role assumed in the audited account.
    pub role_name: String,
    /// Optional external id required by the role trust policy.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Requested check identifiers.
    pub check_ids: Vec<String>,
}

/// Handle returned once a job has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedAudit {
    /// Identifier to poll with.
    pub job_id: AuditJobId,
    /// Status at acceptance time.
    pub status: AuditJobStatus,
}

/// Orchestrates audit jobs: validation, background execution and status.
#[derive(Clone)]
pub struct AuditService {
    registry: Arc<CheckRegistry>,
    session_provider: Arc<dyn CloudSessionProvider>,
    repository: Arc<dyn AuditJobRepository>,
}

impl AuditService {
    /// Creates an audit service.
    #[must_use]
    pub fn new(
        registry: Arc<CheckRegistry>,
        session_provider: Arc<dyn CloudSessionProvider>,
        repository: Arc<dyn AuditJobRepository>,
    ) -> Self {
        Self {
            registry,
            session_provider,
            repository,
        }
    }

    /// Returns the read-only check catalog grouped by domain.
    #[must_use]
    pub fn list_checks(&self) -> CheckCatalog {
        self.registry.catalog()
    }

    async fn require_job(&self, job_id: AuditJobId) -> AppResult<AuditJob> {
        self.repository
            .find_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("audit job '{job_id}' does not exist")))
    }
}
