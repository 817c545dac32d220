//! Sequential step runner with per-step failure policy

use async_trait::async_trait;
use rwa_issuance_metrics::MetricsCollector;
use rwa_issuance_types::{StepPolicy, StepResult, TxHash};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::StepError;

/// One named unit of work in a pipeline.
///
/// `C` is the run context: steps read inputs from it and leave artifacts
/// (addresses, hashes) for the steps after them.
#[async_trait]
pub trait PipelineStep<C: Send>: Send + Sync {
    fn name(&self) -> &'static str;

    fn policy(&self) -> StepPolicy;

    /// Run the step. `Ok(None)` means nothing needed submitting.
    async fn run(&self, ctx: &mut C) -> Result<Option<TxHash>, StepError>;
}

/// Outcome of a pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    /// Every attempted step, in order, including the one that failed fatally
    pub completed_steps: Vec<StepResult>,
    pub fatal_error: Option<StepError>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.fatal_error.is_none()
    }

    /// The step that aborted the run
    pub fn fatal_step(&self) -> Option<&StepResult> {
        self.completed_steps.iter().find(|s| s.is_fatal_failure())
    }

    pub fn best_effort_failures(&self) -> usize {
        self.completed_steps
            .iter()
            .filter(|s| !s.success && s.policy == StepPolicy::BestEffort)
            .count()
    }

    pub fn into_parts(self) -> (Vec<StepResult>, Option<StepError>) {
        (self.completed_steps, self.fatal_error)
    }
}

/// Ordered list of steps run strictly one after another
pub struct StepPipeline<C> {
    name: &'static str,
    steps: Vec<Box<dyn PipelineStep<C>>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<C: Send> StepPipeline<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            metrics: None,
        }
    }

    pub fn step(mut self, step: impl PipelineStep<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<MetricsCollector>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order until the first fatal failure
    pub async fn run(&self, ctx: &mut C) -> PipelineResult {
        let mut completed_steps = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            let policy = step.policy();
            info!(pipeline = self.name, step = name, index, policy = %policy, "Running step");

            let outcome = step.run(ctx).await;
            if let Some(metrics) = &self.metrics {
                metrics.record_step(policy, outcome.is_ok());
            }

            match outcome {
                Ok(tx_hash) => {
                    info!(
                        pipeline = self.name,
                        step = name,
                        tx_hash = tx_hash.as_ref().map(TxHash::as_str).unwrap_or("-"),
                        "Step completed"
                    );
                    completed_steps.push(StepResult::succeeded(name, policy, tx_hash));
                }
                Err(e) => {
                    let mut result = StepResult::failed(name, policy, e.to_string());
                    result.tx_hash = e.tx_hash().cloned();
                    completed_steps.push(result);

                    match policy {
                        StepPolicy::BestEffort => {
                            warn!(
                                pipeline = self.name,
                                step = name,
                                error = %e,
                                kind = e.kind(),
                                "Best-effort step failed, continuing"
                            );
                        }
                        StepPolicy::Fatal => {
                            error!(
                                pipeline = self.name,
                                step = name,
                                error = %e,
                                error_type = e.kind(),
                                "Fatal step failed, aborting pipeline"
                            );
                            if let Some(metrics) = &self.metrics {
                                metrics.record_pipeline_aborted();
                            }
                            return PipelineResult {
                                completed_steps,
                                fatal_error: Some(e),
                            };
                        }
                    }
                }
            }
        }

        PipelineResult {
            completed_steps,
            fatal_error: None,
        }
    }
}
