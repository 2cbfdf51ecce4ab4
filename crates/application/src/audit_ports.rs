use async_trait::async_trait;
use clouddoctor_core::{AppResult, AuditJobId};
use clouddoctor_domain::{AuditJob, AuditJobTransition};

/// Job store port. Only the orchestrator writes to it.
#[async_trait]
pub trait AuditJobRepository: Send + Sync {
    /// Stores a new job. Fails with a conflict when the id is taken.
    async fn insert_job(&self, job: AuditJob) -> AppResult<()>;

    /// Returns a snapshot of one job.
    async fn find_job(&self, job_id: AuditJobId) -> AppResult<Option<AuditJob>>;

    /// Applies one transition atomically and returns the updated snapshot.
    async fn apply_transition(
        &self,
        job_id: AuditJobId,
        transition: AuditJobTransition,
    ) -> AppResult<AuditJob>;
}
