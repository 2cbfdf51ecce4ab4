//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod audit_service;
mod check_registry;
pub mod checks;
pub mod cloud_ports;

#[cfg(test)]
mod test_fakes;

pub use audit_ports::AuditJobRepository;
pub use audit_service::{AuditService, StartAuditInput, StartedAudit};
pub use check_registry::{CheckCatalog, CheckRegistry};
pub use checks::{AclAccessDeniedPolicy, Check, CheckSettings};
pub use cloud_ports::{
    CloudResourceClient, CloudSessionProvider, ComputeClient, IdentityClient, Probe,
    ProviderError, ProviderResult, StorageClient,
};
