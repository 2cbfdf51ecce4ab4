//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_job_repository;
mod snapshot_cloud_session_provider;

pub use in_memory_audit_job_repository::InMemoryAuditJobRepository;
pub use snapshot_cloud_session_provider::SnapshotCloudSessionProvider;
