//! Configuration validation

use crate::{AppConfig, ConfigError, Result, StoreBackend};
use rust_decimal::Decimal;
use rwa_issuance_types::{Address, AddressKind};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Network
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if let Err(e) = validate_url(&config.network.rpc_url) {
        errors.push(ValidationError::new("network.rpc_url", e));
    }

    if config.network.network_passphrase.trim().is_empty() {
        errors.push(ValidationError::new(
            "network.network_passphrase",
            "network passphrase is required",
        ));
    }

    if config.network.request_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "network.request_timeout_ms",
            "must be greater than 0",
        ));
    }

    if config.network.metrics_enabled && config.network.metrics_port == 0 {
        errors.push(ValidationError::new(
            "network.metrics_port",
            "metrics port must be greater than 0",
        ));
    }

    // Executor
    if config.executor.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "executor.poll_interval_ms",
            "must be greater than 0",
        ));
    }

    if config.executor.max_poll_attempts == 0 {
        errors.push(ValidationError::new(
            "executor.max_poll_attempts",
            "must be greater than 0",
        ));
    }

    // Contracts
    let contracts = &config.contracts;
    for (field, value) in [
        ("contracts.asset_token", &contracts.asset_token),
        ("contracts.compliance_core", &contracts.compliance_core),
        ("contracts.identity_registry", &contracts.identity_registry),
        ("contracts.claim_topics_registry", &contracts.claim_topics_registry),
        (
            "contracts.trusted_issuers_registry",
            &contracts.trusted_issuers_registry,
        ),
        ("contracts.lending_adapter", &contracts.lending_adapter),
    ] {
        if let Err(e) = validate_contract_address(value) {
            errors.push(ValidationError::new(field, e));
        }
    }

    // Deployment
    let placeholders = &config.deployment.placeholders;
    for (field, value) in [
        ("deployment.placeholders.compliance", &placeholders.compliance),
        (
            "deployment.placeholders.identity_registry",
            &placeholders.identity_registry,
        ),
        (
            "deployment.placeholders.claim_topics_registry",
            &placeholders.claim_topics_registry,
        ),
        (
            "deployment.placeholders.trusted_issuers_registry",
            &placeholders.trusted_issuers_registry,
        ),
    ] {
        if let Err(e) = validate_contract_address(value) {
            errors.push(ValidationError::new(field, e));
        }
    }

    if config.deployment.initial_supply == 0 {
        errors.push(ValidationError::new(
            "deployment.initial_supply",
            "must be greater than 0",
        ));
    }

    if config.deployment.claim_validity_secs == 0 {
        errors.push(ValidationError::new(
            "deployment.claim_validity_secs",
            "must be greater than 0",
        ));
    }

    // Integration
    let integration = &config.integration;
    if let Err(e) = validate_contract_address(&integration.pool_address) {
        errors.push(ValidationError::new("integration.pool_address", e));
    }

    if let Err(e) = validate_contract_address(&integration.oracle) {
        errors.push(ValidationError::new("integration.oracle", e));
    }

    if integration.pool_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "integration.pool_name",
            "pool name is required",
        ));
    }

    if integration.max_positions == 0 {
        errors.push(ValidationError::new(
            "integration.max_positions",
            "must be greater than 0",
        ));
    }

    if let Err(e) = validate_risk_parameters(integration.ltv_ratio, integration.liquidation_threshold)
    {
        errors.push(ValidationError::new("integration.ltv_ratio", e));
    }

    // Store
    if config.store.backend == StoreBackend::Sqlite
        && config
            .store
            .sqlite_path
            .as_deref()
            .map_or(true, |p| p.trim().is_empty())
    {
        errors.push(ValidationError::new(
            "store.sqlite_path",
            "sqlite backend requires a database path",
        ));
    }

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate a contract address (`C...` strkey)
pub fn validate_contract_address(raw: &str) -> std::result::Result<(), String> {
    let address = Address::parse(raw).map_err(|e| e.to_string())?;
    if address.kind() != AddressKind::Contract {
        return Err(format!("'{}' is not a contract address", address.short()));
    }
    Ok(())
}

/// Require `0 < ltv < liquidation_threshold <= 1`
pub fn validate_risk_parameters(
    ltv_ratio: Decimal,
    liquidation_threshold: Decimal,
) -> std::result::Result<(), String> {
    if ltv_ratio <= Decimal::ZERO {
        return Err("ltv_ratio must be greater than 0".to_string());
    }
    if ltv_ratio >= liquidation_threshold {
        return Err(format!(
            "ltv_ratio {ltv_ratio} must be below liquidation_threshold {liquidation_threshold}"
        ));
    }
    if liquidation_threshold > Decimal::ONE {
        return Err("liquidation_threshold must be <= 1".to_string());
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }

    Ok(())
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}
