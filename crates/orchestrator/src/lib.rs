//! Issuance and lending-integration orchestration
//!
//! - [`StepPipeline`]: ordered steps with FATAL / BEST_EFFORT failure policy
//! - [`DeploymentOrchestrator`]: token issuance, substituting a
//!   [`FallbackGenerator`] record when the fatal step fails
//! - [`IntegrationOrchestrator`]: lending-pool attach with admin prechecks,
//!   check-before-write steps and idempotent re-entry
//! - [`StatusAggregator`]: concurrent, failure-isolated status refresh
//! - [`ServiceBuilder`]: wires all of the above from an `AppConfig`

pub mod builder;
pub mod deployment;
pub mod error;
pub mod fallback;
pub mod integration;
pub mod pipeline;
pub mod status;

#[cfg(test)]
mod fixtures;

pub use builder::{IssuanceServices, ServiceBuilder};
pub use deployment::{DeploymentContext, DeploymentOrchestrator, DeploymentSettings};
pub use error::{BuilderError, DeploymentError, IntegrationError, StepError};
pub use fallback::{FallbackGenerator, FallbackPlaceholders, FALLBACK_REFERENCE_LEN};
pub use integration::{
    IntegrationContext, IntegrationOrchestrator, IntegrationOutcome, IntegrationSettings,
};
pub use pipeline::{PipelineResult, PipelineStep, StepPipeline};
pub use status::StatusAggregator;
