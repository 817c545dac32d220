use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rwa_issuance_types::{
    Address, ConfirmationStatus, NamedArg, OperationRequest, SignedEnvelope, TxHash,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{NetworkError, QueryClient, QueryError, SubmissionClient};

/// JSON-RPC endpoint settings
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub request_timeout: Duration,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn testnet() -> Self {
        Self::new("https://soroban-testnet.stellar.org")
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Network client speaking the ledger's JSON-RPC dialect
pub struct JsonRpcClient {
    config: RpcConfig,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(config: RpcConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NetworkError::Unreachable(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            config,
            client,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// POST one JSON-RPC call and return its `result` member
    async fn rpc(&self, method: &str, params: Value) -> Result<Value, NetworkError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "Sending RPC request");

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NetworkError::Unreachable(format!("RPC request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(NetworkError::Unreachable(format!(
                "RPC error: {}",
                response.status()
            )));
        }

        let mut body: Value = response.json().await.map_err(|e| {
            NetworkError::InvalidResponse(format!("failed to parse RPC response: {}", e))
        })?;

        if let Some(error) = body.get("error") {
            return Err(NetworkError::InvalidResponse(format!("RPC error: {}", error)));
        }

        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(NetworkError::InvalidResponse(
                "missing result in RPC response".to_string(),
            )),
        }
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<String, NetworkError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| NetworkError::InvalidResponse(format!("failed to encode: {}", e)))?;
        Ok(BASE64.encode(bytes))
    }
}

fn string_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, NetworkError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| NetworkError::InvalidResponse(format!("missing string field '{}'", field)))
}

#[async_trait]
impl SubmissionClient for JsonRpcClient {
    async fn next_sequence(&self, account: &Address) -> Result<u64, NetworkError> {
        let result = self
            .rpc("getAccount", json!({ "address": account.as_str() }))
            .await?;

        let current = string_field(&result, "sequence")?
            .parse::<u64>()
            .map_err(|e| NetworkError::InvalidResponse(format!("invalid sequence: {}", e)))?;
        Ok(current + 1)
    }

    async fn submit(&self, envelope: SignedEnvelope) -> Result<TxHash, NetworkError> {
        let transaction = Self::encode(&envelope)?;
        let result = self
            .rpc("sendTransaction", json!({ "transaction": transaction }))
            .await?;

        let status = string_field(&result, "status")?;
        if status == "ERROR" {
            let detail = result
                .get("errorResult")
                .map(Value::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(detail = %detail, "Transaction rejected at submission");
            return Err(NetworkError::InvalidResponse(format!(
                "submission rejected: {}",
                detail
            )));
        }

        Ok(TxHash::new(string_field(&result, "hash")?))
    }

    async fn get_status(&self, hash: &TxHash) -> Result<ConfirmationStatus, NetworkError> {
        let result = self
            .rpc("getTransaction", json!({ "hash": hash.as_str() }))
            .await?;

        string_field(&result, "status")?
            .parse::<ConfirmationStatus>()
            .map_err(NetworkError::InvalidResponse)
    }
}

#[async_trait]
impl QueryClient for JsonRpcClient {
    async fn call(
        &self,
        contract: &Address,
        method: &str,
        args: &[NamedArg],
    ) -> Result<Value, QueryError> {
        let mut request = OperationRequest::new(contract.clone(), method);
        request.args = args.to_vec();
        let transaction = Self::encode(&request)?;

        let mut result = self
            .rpc("simulateTransaction", json!({ "transaction": transaction }))
            .await?;

        if let Some(error) = result.get("error").and_then(Value::as_str) {
            return Err(QueryError::NotFound(format!(
                "{} on {}: {}",
                method,
                contract.short(),
                error
            )));
        }

        result
            .get_mut("retval")
            .map(Value::take)
            .ok_or_else(|| QueryError::NotFound(format!("no return value for {}", method)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_field_fails_closed() {
        let value = json!({"status": 3, "hash": "abc"});
        assert_eq!(string_field(&value, "hash").unwrap(), "abc");
        assert!(matches!(
            string_field(&value, "status"),
            Err(NetworkError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let client = JsonRpcClient::new(RpcConfig::testnet().with_timeout(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(client.url(), "https://soroban-testnet.stellar.org");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let client = JsonRpcClient::new(
            RpcConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500)),
        )
        .unwrap();
        let hash = TxHash::new("00");
        assert!(matches!(
            client.get_status(&hash).await,
            Err(NetworkError::Unreachable(_))
        ));
    }
}
