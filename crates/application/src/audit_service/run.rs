use super::*;

use clouddoctor_core::AccountReference;
use clouddoctor_domain::{AuditJobTransition, CheckOutcome, CheckStatus};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{error, info, warn};

use crate::checks::Check;
use crate::cloud_ports::CloudResourceClient;

impl AuditService {
    /// Drives one job from pending to a terminal state.
    pub(super) async fn run_job(
        &self,
        job_id: AuditJobId,
        account: AccountReference,
        checks: Vec<Arc<dyn Check>>,
    ) {
        if let Err(error) = self.transition(job_id, AuditJobTransition::Start).await {
            error!(job_id = %job_id, error = %error, "failed to start audit job");
            return;
        }

        let client = match self.session_provider.open_session(&account).await {
            Ok(client) => client,
            Err(session_error) => {
                warn!(
                    job_id = %job_id,
                    account_id = account.account_id(),
                    error = %session_error,
                    "audit session could not be established"
                );
                let reason = format!("failed to open session: {session_error}");
                if let Err(error) = self
                    .transition(job_id, AuditJobTransition::Fail(reason))
                    .await
                {
                    error!(job_id = %job_id, error = %error, "failed to mark audit job failed");
                }
                return;
            }
        };

        let mut pending: FuturesUnordered<_> = checks
            .into_iter()
            .map(|check| run_check_task(check, client.clone()))
            .collect();

        while let Some(outcome) = pending.next().await {
            info!(
                job_id = %job_id,
                check_id = outcome.check_id.as_str(),
                results = outcome.results.len(),
                failures = outcome.count(CheckStatus::Fail),
                errors = outcome.count(CheckStatus::Error),
                "check finished"
            );
            if let Err(error) = self
                .transition(job_id, AuditJobTransition::RecordOutcome(outcome))
                .await
            {
                error!(job_id = %job_id, error = %error, "failed to record check outcome");
            }
        }

        match self.transition(job_id, AuditJobTransition::Complete).await {
            Ok(()) => info!(job_id = %job_id, "audit job completed"),
            Err(error) => error!(job_id = %job_id, error = %error, "failed to complete audit job"),
        }
    }

    async fn transition(&self, job_id: AuditJobId, transition: AuditJobTransition) -> AppResult<()> {
        self.repository
            .apply_transition(job_id, transition)
            .await
            .map(|_| ())
    }
}

/// Runs one check on its own task so a panic stays inside that check.
async fn run_check_task(check: Arc<dyn Check>, client: CloudResourceClient) -> CheckOutcome {
    let check_id = check.id();
    let guideline_id = check.guideline_id();

    match tokio::spawn(async move { check.run(&client).await }).await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            error!(check_id, error = %join_error, "check aborted");
            CheckOutcome::resourceless(
                check_id,
                guideline_id,
                CheckStatus::Error,
                format!("check aborted unexpectedly: {join_error}"),
            )
        }
    }
}
