use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Address;

const BPS_SCALE: u32 = 10_000;

/// Risk parameters applied when an asset is attached to a lending pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Loan-to-value ratio in [0, 1]
    pub ltv_ratio: Decimal,
    /// Liquidation threshold in [0, 1], above the LTV ratio
    pub liquidation_threshold: Decimal,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            ltv_ratio: Decimal::new(80, 2),
            liquidation_threshold: Decimal::new(85, 2),
        }
    }
}

impl RiskParameters {
    pub fn new(ltv_ratio: Decimal, liquidation_threshold: Decimal) -> Self {
        Self {
            ltv_ratio,
            liquidation_threshold,
        }
    }

    /// Both ratios within (0, 1] and the LTV strictly below the threshold
    pub fn is_valid(&self) -> bool {
        self.ltv_ratio > Decimal::ZERO
            && self.ltv_ratio < self.liquidation_threshold
            && self.liquidation_threshold <= Decimal::ONE
    }

    pub fn ltv_bps(&self) -> Option<u32> {
        to_bps(self.ltv_ratio)
    }

    pub fn liquidation_threshold_bps(&self) -> Option<u32> {
        to_bps(self.liquidation_threshold)
    }
}

fn to_bps(ratio: Decimal) -> Option<u32> {
    if ratio.is_sign_negative() || ratio > Decimal::ONE {
        return None;
    }
    (ratio * Decimal::from(BPS_SCALE)).round().to_u32()
}

/// Lending pool the integration targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pub address: Address,
    pub name: String,
    pub oracle: Address,
    pub max_positions: u32,
}

/// An issued asset that can be attached to a lending pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetEntity {
    pub contract_address: Address,
    pub symbol: String,
    pub admin: Address,
}

impl AssetEntity {
    pub fn new(contract_address: Address, symbol: impl Into<String>, admin: Address) -> Self {
        Self {
            contract_address,
            symbol: symbol.into(),
            admin,
        }
    }

    /// Identifier used for idempotency and status maps
    pub fn id(&self) -> &str {
        self.contract_address.as_str()
    }
}

/// Lending-protocol status of one asset against one pool.
///
/// Recomputed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntegrationStatus {
    pub registered: bool,
    pub configured: bool,
    pub has_reserve: bool,
    pub can_lend: bool,
    pub pool_address: Option<String>,
    pub error: Option<String>,
}

impl IntegrationStatus {
    /// Derive a status from the read-only checks: pool registered, token
    /// attached to that pool, reserve enabled for the token
    pub fn from_checks(
        pool: &Address,
        pool_exists: bool,
        token_attached: bool,
        reserve_enabled: bool,
    ) -> Self {
        Self {
            registered: pool_exists,
            configured: token_attached,
            has_reserve: reserve_enabled,
            can_lend: pool_exists && token_attached && reserve_enabled,
            pool_address: Some(pool.to_string()),
            error: None,
        }
    }

    /// Entry for an entity whose query failed
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_integrated(&self) -> bool {
        self.error.is_none() && self.registered && self.configured && self.has_reserve
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "CAQ4DF5FLQHGAUEXYJKTVFFIVHVIUN6XNUE7NW27BJGWEPNHQKZYMRQ6";

    #[test]
    fn test_default_risk_parameters_in_bps() {
        let params = RiskParameters::default();
        assert!(params.is_valid());
        assert_eq!(params.ltv_bps(), Some(8000));
        assert_eq!(params.liquidation_threshold_bps(), Some(8500));
    }

    #[test]
    fn test_invalid_risk_parameters() {
        let inverted = RiskParameters::new(Decimal::new(90, 2), Decimal::new(85, 2));
        assert!(!inverted.is_valid());

        let over_one = RiskParameters::new(Decimal::new(80, 2), Decimal::new(110, 2));
        assert!(!over_one.is_valid());
        assert_eq!(over_one.liquidation_threshold_bps(), None);
    }

    #[test]
    fn test_status_from_checks() {
        let pool = Address::parse(POOL).unwrap();

        let ready = IntegrationStatus::from_checks(&pool, true, true, true);
        assert!(ready.is_integrated());
        assert!(ready.can_lend);

        let unattached = IntegrationStatus::from_checks(&pool, true, false, false);
        assert!(unattached.registered);
        assert!(!unattached.has_reserve);
        assert!(!unattached.is_integrated());

        let no_reserve = IntegrationStatus::from_checks(&pool, true, true, false);
        assert!(no_reserve.configured);
        assert!(!no_reserve.has_reserve);
        assert!(!no_reserve.can_lend);
        assert!(!no_reserve.is_integrated());
    }

    #[test]
    fn test_errored_status() {
        let status = IntegrationStatus::errored("Failed to check status");
        assert!(status.is_error());
        assert!(!status.is_integrated());
        assert!(status.pool_address.is_none());
    }
}
