use super::*;

use std::time::Duration;

impl AuditService {
    /// Returns a snapshot of one job.
    ///
    /// Running jobs expose the outcomes of every check finished so far.
    pub async fn get_status(&self, job_id: AuditJobId) -> AppResult<AuditJob> {
        self.require_job(job_id).await
    }

    /// Polls a job until it reaches a terminal state.
    ///
    /// Fails with a conflict when `timeout` elapses first.
    pub async fn wait_for_completion(
        &self,
        job_id: AuditJobId,
        poll_interval: Duration,
        timeout: Duration,
    ) -> AppResult<AuditJob> {
        if poll_interval.is_zero() {
            return Err(AppError::Validation(
                "poll interval must be greater than zero".to_owned(),
            ));
        }

        tokio::time::timeout(timeout, self.poll_until_terminal(job_id, poll_interval))
            .await
            .map_err(|_| {
                AppError::Conflict(format!(
                    "audit job '{job_id}' did not finish within {} ms",
                    timeout.as_millis()
                ))
            })?
    }

    async fn poll_until_terminal(
        &self,
        job_id: AuditJobId,
        poll_interval: Duration,
    ) -> AppResult<AuditJob> {
        loop {
            let job = self.require_job(job_id).await?;
            if job.status().is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
