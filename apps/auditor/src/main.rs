//! CloudDoctor audit runner.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use clouddoctor_application::{AuditService, CheckRegistry, CheckSettings, StartAuditInput};
use clouddoctor_core::{AppError, AppResult};
use clouddoctor_infrastructure::{InMemoryAuditJobRepository, SnapshotCloudSessionProvider};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AuditorConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    if env::args().nth(1).as_deref() == Some("checks") {
        let registry = CheckRegistry::with_default_checks(CheckSettings::default())?;
        println!("{}", to_pretty_json(&registry.catalog())?);
        return Ok(());
    }

    let config = AuditorConfig::load()?;
    let registry = Arc::new(CheckRegistry::with_default_checks(config.settings)?);
    let check_ids = config.check_ids.clone().unwrap_or_else(|| {
        registry
            .check_ids()
            .into_iter()
            .map(str::to_owned)
            .collect()
    });
    let session_provider =
        SnapshotCloudSessionProvider::from_path(config.snapshot_path.as_path()).await?;
    let service = AuditService::new(
        registry,
        Arc::new(session_provider),
        Arc::new(InMemoryAuditJobRepository::new()),
    );

    let started = service
        .start_audit(StartAuditInput {
            account_id: config.account_id.clone(),
            role_name: config.role_name.clone(),
            external_id: config.external_id.clone(),
            check_ids,
        })
        .await?;

    info!(
        job_id = %started.job_id,
        account_id = %config.account_id,
        snapshot = %config.snapshot_path.display(),
        "clouddoctor-auditor started"
    );

    let job = service
        .wait_for_completion(started.job_id, config.poll_interval, config.timeout)
        .await?;

    match job.failure_reason() {
        Some(reason) => warn!(job_id = %job.job_id(), reason, "audit job failed"),
        None => info!(
            job_id = %job.job_id(),
            status = job.status().as_str(),
            outcomes = job.outcomes().len(),
            "audit job finished"
        ),
    }

    println!("{}", to_pretty_json(&job)?);
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn to_pretty_json(value: &impl Serialize) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render JSON: {error}")))
}
