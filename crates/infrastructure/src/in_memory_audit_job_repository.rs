use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use clouddoctor_application::AuditJobRepository;
use clouddoctor_core::{AppError, AppResult, AuditJobId};
use clouddoctor_domain::{AuditJob, AuditJobTransition};
use tokio::sync::RwLock;

/// In-memory job store.
///
/// Transitions run under the write lock, so readers always see whole
/// outcomes.
#[derive(Debug, Default)]
pub struct InMemoryAuditJobRepository {
    jobs: RwLock<HashMap<AuditJobId, AuditJob>>,
}

impl InMemoryAuditJobRepository {
    /// Creates an empty in-memory job store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditJobRepository for InMemoryAuditJobRepository {
    async fn insert_job(&self, job: AuditJob) -> AppResult<()> {
        let mut jobs = self.jobs.write().await;

        if jobs.contains_key(&job.job_id()) {
            return Err(AppError::Conflict(format!(
                "audit job '{}' already exists",
                job.job_id()
            )));
        }

        jobs.insert(job.job_id(), job);
        Ok(())
    }

    async fn find_job(&self, job_id: AuditJobId) -> AppResult<Option<AuditJob>> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn apply_transition(
        &self,
        job_id: AuditJobId,
        transition: AuditJobTransition,
    ) -> AppResult<AuditJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| AppError::NotFound(format!("audit job '{job_id}' does not exist")))?;

        job.apply(transition, Utc::now())?;
        Ok(job.clone())
    }
}
