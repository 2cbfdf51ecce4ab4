//! Provider ports: per-service clients and the session that scopes them to an account.

mod compute;
mod error;
mod identity;
mod session;
mod storage;

pub use compute::ComputeClient;
pub use error::{Probe, ProviderError, ProviderResult};
pub use identity::IdentityClient;
pub use session::{CloudResourceClient, CloudSessionProvider};
pub use storage::StorageClient;
