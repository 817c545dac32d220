//! Local record store
//!
//! A process-wide persisted key/value collection, keyed by logical
//! collection name, with typed views for deployment records and the
//! integration idempotency set. Construct one backend per process and share
//! it as `Arc<dyn RecordStore>`.

pub mod error;
pub mod idempotency;
pub mod repository;
pub mod sqlite_store;
pub mod store;

pub use error::StoreError;
pub use idempotency::IdempotencySet;
pub use repository::{DeploymentRepository, DeploymentStats};
pub use sqlite_store::SqliteStore;
pub use store::{InMemoryStore, RecordStore};

/// Collection holding serialized `DeploymentRecord`s
pub const DEPLOYMENTS_COLLECTION: &str = "deployment_records";

/// Collection holding identifiers of integrated entities
pub const INTEGRATED_COLLECTION: &str = "integrated_entities";
