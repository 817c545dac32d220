use rwa_issuance_metrics::MetricsCollector;
use rwa_issuance_types::{ConfirmationStatus, OperationRequest, TxHash, UnsignedEnvelope};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{ExecutorError, Signer, SubmissionClient};

/// Confirmation polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// A confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: TxHash,
    /// Status reads issued before the terminal state was observed
    pub attempts: u32,
}

/// Builds, signs, submits and confirms a single contract call
pub struct TransactionExecutor {
    signer: Arc<dyn Signer>,
    network: Arc<dyn SubmissionClient>,
    network_passphrase: String,
    poll: PollConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl TransactionExecutor {
    pub fn new(
        signer: Arc<dyn Signer>,
        network: Arc<dyn SubmissionClient>,
        network_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            signer,
            network,
            network_passphrase: network_passphrase.into(),
            poll: PollConfig::default(),
            metrics: None,
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Execute one operation to a terminal confirmation state.
    ///
    /// Returns `Timeout` rather than `ExecutionFailed` when the polling
    /// budget runs out; the transaction may still land after that.
    pub async fn execute(&self, request: OperationRequest) -> Result<TxOutcome, ExecutorError> {
        let label = request.label();
        let result = self.execute_inner(request).await;

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            metrics.record_tx_outcome(outcome);
        }

        if let Err(e) = &result {
            warn!(operation = %label, error = %e, kind = e.kind(), "Transaction did not succeed");
        }

        result
    }

    async fn execute_inner(&self, request: OperationRequest) -> Result<TxOutcome, ExecutorError> {
        let source = self.signer.address().clone();
        let label = request.label();

        let sequence = self.network.next_sequence(&source).await?;
        let envelope = UnsignedEnvelope::new(source, &self.network_passphrase, sequence, request);

        debug!(
            operation = %label,
            payload_hash = %envelope.payload_hash,
            sequence,
            "Requesting signature"
        );

        // Unbounded: only the signer can end this wait
        let signed = self.signer.sign(envelope).await?;

        let hash = self.network.submit(signed).await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_tx_submitted();
        }
        info!(operation = %label, tx_hash = %hash, "Transaction submitted");

        self.await_confirmation(hash).await
    }

    /// Poll until the first terminal status or until the attempt budget is spent
    pub async fn await_confirmation(&self, hash: TxHash) -> Result<TxOutcome, ExecutorError> {
        let started = Instant::now();
        let mut status = ConfirmationStatus::NotFound;
        let mut attempts = 0;

        while attempts < self.poll.max_attempts {
            if attempts > 0 {
                tokio::time::sleep(self.poll.interval).await;
            }
            attempts += 1;

            match self.network.get_status(&hash).await {
                Ok(observed) => status = status.advance(observed),
                Err(e) => {
                    // The transaction is already submitted; a failed read says nothing about it
                    debug!(tx_hash = %hash, attempt = attempts, error = %e, "Status read failed");
                }
            }

            debug!(tx_hash = %hash, attempt = attempts, status = %status, "Polled transaction");

            if status.is_terminal() {
                break;
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_poll_attempts(attempts);
            metrics.record_confirmation_duration(started.elapsed());
        }

        match status {
            ConfirmationStatus::Success => {
                info!(tx_hash = %hash, attempts, "Transaction confirmed");
                Ok(TxOutcome { hash, attempts })
            }
            ConfirmationStatus::Failed => Err(ExecutorError::ExecutionFailed { hash }),
            ConfirmationStatus::NotFound | ConfirmationStatus::Pending => {
                Err(ExecutorError::Timeout { hash, attempts })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLedger;
    use rwa_issuance_types::Address;
    use ConfirmationStatus::*;

    const TOKEN: &str = "CCJGETMTUTETF3QV7EKVE6EIKD45TL2JWYF4VUCCXO3EVPPRRAMPAJ4O";

    fn request() -> OperationRequest {
        OperationRequest::new(Address::parse(TOKEN).unwrap(), "mint").arg("amount", 100i128)
    }

    fn executor(ledger: &Arc<MockLedger>, max_attempts: u32) -> TransactionExecutor {
        TransactionExecutor::new(ledger.clone(), ledger.clone(), "Test Network")
            .with_poll_config(PollConfig::new(Duration::from_millis(1000), max_attempts))
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_polling_at_first_terminal_status() {
        let ledger = Arc::new(MockLedger::new());
        ledger.script_statuses(vec![NotFound, Pending, Pending, Success, Failed]);

        let outcome = executor(&ledger, 60).execute(request()).await.unwrap();

        assert_eq!(outcome.attempts, 4);
        assert_eq!(ledger.status_polls(), 4);
        assert_eq!(ledger.submissions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_is_timeout_not_failure() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_default_status(Pending);

        let err = executor(&ledger, 5).execute(request()).await.unwrap_err();

        assert!(matches!(err, ExecutorError::Timeout { attempts: 5, .. }));
        assert!(err.tx_hash().is_some());
        assert_eq!(ledger.status_polls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_execution_failed() {
        let ledger = Arc::new(MockLedger::new());
        ledger.script_statuses(vec![Pending, Failed]);

        let err = executor(&ledger, 60).execute(request()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::ExecutionFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signer_rejection_skips_submission() {
        let ledger = Arc::new(MockLedger::new());
        ledger.reject_signatures(true);

        let err = executor(&ledger, 60).execute(request()).await.unwrap_err();

        assert!(matches!(err, ExecutorError::SignerRejected(_)));
        assert!(ledger.submissions().is_empty());
        assert_eq!(ledger.status_polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_network() {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_network_down(true);

        let err = executor(&ledger, 60).execute(request()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NetworkUnreachable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_interval() {
        let ledger = Arc::new(MockLedger::new());
        ledger.script_statuses(vec![NotFound, NotFound, Success]);

        let start = tokio::time::Instant::now();
        executor(&ledger, 60).execute(request()).await.unwrap();

        // Three reads, two sleeps in between
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }
}
