use super::*;

use chrono::Utc;
use clouddoctor_core::AccountReference;
use tracing::info;

impl AuditService {
    /// Validates the request, persists a pending job and schedules it.
    ///
    /// Returns as soon as the job is stored; checks run in the background.
    /// Nothing is persisted when validation fails.
    pub async fn start_audit(&self, input: StartAuditInput) -> AppResult<StartedAudit> {
        let account = AccountReference::new(input.account_id, input.role_name, input.external_id)?;
        let checks = self.registry.resolve(&input.check_ids)?;
        let check_ids: Vec<String> = checks.iter().map(|check| check.id().to_owned()).collect();

        let job = AuditJob::new(AuditJobId::new(), account, check_ids, Utc::now())?;
        let job_id = job.job_id();
        let status = job.status();
        let account = job.account().clone();
        self.repository.insert_job(job).await?;

        info!(
            job_id = %job_id,
            account_id = account.account_id(),
            checks = checks.len(),
            "audit job accepted"
        );

        let service = self.clone();
        tokio::spawn(async move {
            service.run_job(job_id, account, checks).await;
        });

        Ok(StartedAudit { job_id, status })
    }
}
