//! Integration tests for the config crate

use rust_decimal::Decimal;
use rwa_issuance_config::{
    validate_config, AppConfig, ConfigLoader, Environment, StoreBackend,
};
use std::io::Write;
use std::path::PathBuf;

fn config_path(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn test_load_mainnet_config() {
    let config = ConfigLoader::from_file(&config_path("mainnet.toml"))
        .expect("Failed to load mainnet config");

    assert_eq!(config.network.environment, Environment::Mainnet);
    assert_eq!(
        config.network.network_passphrase,
        Environment::Mainnet.network_passphrase()
    );
    assert_eq!(config.executor.max_poll_attempts, 120);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_testnet_config() {
    let config = ConfigLoader::from_file(&config_path("testnet.toml"))
        .expect("Failed to load testnet config");

    assert_eq!(config.network.environment, Environment::Testnet);
    assert_eq!(config.network.log_level, "debug");
    assert_eq!(config.integration.ltv_ratio, Decimal::new(80, 2));
    assert_eq!(config.integration.liquidation_threshold, Decimal::new(85, 2));
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_local_config() {
    let config = ConfigLoader::from_file(&config_path("local.toml"))
        .expect("Failed to load local config");

    assert_eq!(config.network.environment, Environment::Local);
    assert_eq!(config.network.log_level, "trace");
    assert_eq!(config.deployment.fallback_delay_ms, 0);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_file_matches_builtin_defaults() {
    let from_file = ConfigLoader::from_file(&config_path("testnet.toml")).unwrap();
    let builtin = AppConfig::for_environment(Environment::Testnet);

    assert_eq!(from_file.contracts.lending_adapter, builtin.contracts.lending_adapter);
    assert_eq!(from_file.integration.pool_address, builtin.integration.pool_address);
    assert_eq!(
        from_file.deployment.claim_validity_secs,
        builtin.deployment.claim_validity_secs
    );
}

#[test]
fn test_config_validation_rejects_inverted_risk() {
    let mut config = AppConfig::for_environment(Environment::Testnet);
    config.integration.ltv_ratio = Decimal::new(90, 2);

    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("integration.ltv_ratio"));
}

#[test]
fn test_config_validation_rejects_malformed_placeholder() {
    let mut config = AppConfig::for_environment(Environment::Testnet);
    config.deployment.placeholders.identity_registry = "CSTORAGE_PLACEHOLDER".to_string();

    let err = validate_config(&config).unwrap_err();
    assert!(err
        .to_string()
        .contains("deployment.placeholders.identity_registry"));
}

#[test]
fn test_yaml_format() {
    let yaml = serde_yaml::to_string(&AppConfig::for_environment(Environment::Local)).unwrap();

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = ConfigLoader::from_file(file.path()).unwrap();
    assert_eq!(config.network.environment, Environment::Local);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_json_format() {
    let json = serde_json::to_string_pretty(&AppConfig::for_environment(Environment::Testnet))
        .unwrap();

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = ConfigLoader::from_file(file.path()).unwrap();
    assert_eq!(config.integration.max_positions, 10);
}

#[test]
fn test_default_values() {
    let config = AppConfig::default();

    assert_eq!(config.network.environment, Environment::Testnet);
    assert_eq!(config.network.request_timeout_ms, 30000);
    assert_eq!(config.executor.poll_interval_ms, 1000);
    assert_eq!(config.executor.max_poll_attempts, 60);
    assert_eq!(config.deployment.fallback_delay_ms, 1000);
    assert_eq!(config.deployment.initial_supply, 1_000_000_000_000);
    assert_eq!(config.deployment.claim_validity_secs, 31_536_000);
    assert_eq!(config.integration.pool_name, "SRWA Lending Pool");
}

#[test]
fn test_missing_file_is_io_error() {
    let result = ConfigLoader::from_file(&config_path("staging.toml"));
    assert!(result.is_err());
}
