use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSACTION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Signed envelopes accepted by the submission endpoint
    pub static ref TX_SUBMITTED: IntCounter = register_int_counter!(
        "rwa_issuance_tx_submitted_total",
        "Total number of transactions submitted"
    )
    .expect("register rwa_issuance_tx_submitted_total");

    /// Executor results by outcome
    pub static ref TX_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_tx_outcome_total",
        "Transaction executions by outcome",
        &["outcome"]
    )
    .expect("register rwa_issuance_tx_outcome_total");

    pub static ref TX_POLL_ATTEMPTS: Histogram = register_histogram!(
        "rwa_issuance_tx_poll_attempts",
        "Status polls issued per submitted transaction",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0]
    )
    .expect("register rwa_issuance_tx_poll_attempts");

    pub static ref TX_CONFIRMATION_DURATION: Histogram = register_histogram!(
        "rwa_issuance_tx_confirmation_ms",
        "Time from submission to terminal status in milliseconds",
        vec![500.0, 1000.0, 2000.0, 5000.0, 10000.0, 30000.0, 60000.0]
    )
    .expect("register rwa_issuance_tx_confirmation_ms");

    // ═══════════════════════════════════════════════════════════════════════════
    // PIPELINE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Attempted steps by policy and result
    pub static ref PIPELINE_STEPS: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_pipeline_steps_total",
        "Pipeline steps by policy and outcome",
        &["policy", "outcome"]
    )
    .expect("register rwa_issuance_pipeline_steps_total");

    pub static ref PIPELINE_ABORTS: IntCounter = register_int_counter!(
        "rwa_issuance_pipeline_aborts_total",
        "Pipelines stopped by a fatal step failure"
    )
    .expect("register rwa_issuance_pipeline_aborts_total");

    // ═══════════════════════════════════════════════════════════════════════════
    // DEPLOYMENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub static ref DEPLOYMENTS: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_deployments_total",
        "Completed deployment flows by record origin",
        &["origin"]
    )
    .expect("register rwa_issuance_deployments_total");

    pub static ref DEPLOYMENT_DURATION: Histogram = register_histogram!(
        "rwa_issuance_deployment_duration_ms",
        "Deployment flow duration in milliseconds",
        vec![1000.0, 5000.0, 10000.0, 30000.0, 60000.0, 120000.0, 300000.0]
    )
    .expect("register rwa_issuance_deployment_duration_ms");

    // ═══════════════════════════════════════════════════════════════════════════
    // INTEGRATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub static ref INTEGRATIONS: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_integrations_total",
        "Integration attempts by outcome",
        &["outcome"]
    )
    .expect("register rwa_issuance_integrations_total");

    pub static ref INTEGRATIONS_IN_FLIGHT: IntGauge = register_int_gauge!(
        "rwa_issuance_integrations_in_flight",
        "Integrations currently running"
    )
    .expect("register rwa_issuance_integrations_in_flight");

    // ═══════════════════════════════════════════════════════════════════════════
    // STATUS METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub static ref STATUS_QUERIES: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_status_queries_total",
        "Per-entity status queries by outcome",
        &["outcome"]
    )
    .expect("register rwa_issuance_status_queries_total");

    pub static ref STATUS_REFRESH_DURATION: Histogram = register_histogram!(
        "rwa_issuance_status_refresh_ms",
        "Duration of a full status refresh in milliseconds",
        vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .expect("register rwa_issuance_status_refresh_ms");

    /// Entities fully integrated as of the last refresh
    pub static ref ENTITIES_INTEGRATED: IntGauge = register_int_gauge!(
        "rwa_issuance_entities_integrated",
        "Entities integrated with the lending pool at last refresh"
    )
    .expect("register rwa_issuance_entities_integrated");

    // ═══════════════════════════════════════════════════════════════════════════
    // ERROR METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub static ref ERRORS: IntCounterVec = register_int_counter_vec!(
        "rwa_issuance_errors_total",
        "Error events by type",
        &["error_type"]
    )
    .expect("register rwa_issuance_errors_total");
}
