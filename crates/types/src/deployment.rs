use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StepResult;

/// Issuance template selected in the creation wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TokenTemplate {
    RwaEquity,
    RwaDebt,
    FundShare,
    PermissionedStable,
    #[default]
    Custom,
}

impl TokenTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTemplate::RwaEquity => "RwaEquity",
            TokenTemplate::RwaDebt => "RwaDebt",
            TokenTemplate::FundShare => "FundShare",
            TokenTemplate::PermissionedStable => "PermissionedStable",
            TokenTemplate::Custom => "Custom",
        }
    }
}

/// Issuer trusted to attest a given claim topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedIssuer {
    pub issuer: String,
    pub topic_id: u32,
}

/// Input supplied by the form layer for a new token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCreationForm {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,

    /// Admin principal as entered; validated when the operation is built
    pub admin: String,

    #[serde(default)]
    pub template: TokenTemplate,

    /// Overrides the configured initial supply (base units)
    #[serde(default)]
    pub initial_supply: Option<u128>,

    #[serde(default)]
    pub claim_topics: Vec<u32>,

    #[serde(default)]
    pub trusted_issuers: Vec<TrustedIssuer>,

    #[serde(default)]
    pub compliance_modules: Vec<String>,

    #[serde(default)]
    pub max_holders: Option<u32>,

    #[serde(default)]
    pub allowed_jurisdictions: Vec<String>,

    #[serde(default)]
    pub denied_jurisdictions: Vec<String>,
}

impl TokenCreationForm {
    /// KYC and AML claim topics, required unless the caller changes them
    pub const DEFAULT_CLAIM_TOPICS: [u32; 2] = [1, 2];

    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u32,
        admin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            admin: admin.into(),
            template: TokenTemplate::default(),
            initial_supply: None,
            claim_topics: Self::DEFAULT_CLAIM_TOPICS.to_vec(),
            trusted_issuers: Vec::new(),
            compliance_modules: Vec::new(),
            max_holders: None,
            allowed_jurisdictions: Vec::new(),
            denied_jurisdictions: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: TokenTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_initial_supply(mut self, supply: u128) -> Self {
        self.initial_supply = Some(supply);
        self
    }

    pub fn with_claim_topics(mut self, topics: Vec<u32>) -> Self {
        self.claim_topics = topics;
        self
    }

    pub fn with_max_holders(mut self, max_holders: u32) -> Self {
        self.max_holders = Some(max_holders);
        self
    }

    pub fn with_jurisdictions(mut self, allowed: Vec<String>, denied: Vec<String>) -> Self {
        self.allowed_jurisdictions = allowed;
        self.denied_jurisdictions = denied;
        self
    }
}

/// Configuration captured at deployment time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfigSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    /// Base units, kept as a string to survive JSON round-trips intact
    pub initial_supply: String,
    pub admin: String,
    pub compliance_modules: Vec<String>,
    pub claim_topics: Vec<u32>,
    pub trusted_issuers: Vec<TrustedIssuer>,
    pub max_holders: Option<u32>,
    pub allowed_jurisdictions: Vec<String>,
    pub denied_jurisdictions: Vec<String>,
}

impl TokenConfigSnapshot {
    pub fn from_form(form: &TokenCreationForm, initial_supply: u128) -> Self {
        Self {
            name: form.name.clone(),
            symbol: form.symbol.clone(),
            decimals: form.decimals,
            initial_supply: initial_supply.to_string(),
            admin: form.admin.clone(),
            compliance_modules: form.compliance_modules.clone(),
            claim_topics: form.claim_topics.clone(),
            trusted_issuers: form.trusted_issuers.clone(),
            max_holders: form.max_holders,
            allowed_jurisdictions: form.allowed_jurisdictions.clone(),
            denied_jurisdictions: form.denied_jurisdictions.clone(),
        }
    }
}

/// Role of an auxiliary contract attached to a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryRole {
    Compliance,
    IdentityRegistry,
    ClaimTopicsRegistry,
    TrustedIssuersRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryAddress {
    pub role: AuxiliaryRole,
    pub address: String,
}

impl AuxiliaryAddress {
    pub fn new(role: AuxiliaryRole, address: impl Into<String>) -> Self {
        Self {
            role,
            address: address.into(),
        }
    }
}

/// Whether a record reflects a real network deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentOrigin {
    Real,
    Fallback,
}

impl fmt::Display for DeploymentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentOrigin::Real => f.write_str("REAL"),
            DeploymentOrigin::Fallback => f.write_str("FALLBACK"),
        }
    }
}

/// Persisted result of an issuance flow. Append-only once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// UUID v4, unique across the store
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub admin: String,
    pub template: TokenTemplate,

    /// Asset contract address
    pub primary_address: String,

    /// Hash of the transaction that created the asset. For fallback records
    /// this is an opaque placeholder with no on-chain counterpart.
    pub tx_reference: String,

    pub auxiliary_addresses: Vec<AuxiliaryAddress>,
    pub created_at: DateTime<Utc>,
    pub origin: DeploymentOrigin,
    pub config_snapshot: TokenConfigSnapshot,
}

impl DeploymentRecord {
    pub fn is_fallback(&self) -> bool {
        self.origin == DeploymentOrigin::Fallback
    }

    pub fn auxiliary(&self, role: AuxiliaryRole) -> Option<&str> {
        self.auxiliary_addresses
            .iter()
            .find(|a| a.role == role)
            .map(|a| a.address.as_str())
    }
}

/// Terminal state of a deployment flow.
///
/// Both variants present as success to the form layer; callers that depend
/// on on-chain truth must branch on the variant.
#[derive(Debug, Clone)]
pub enum DeploymentOutcome {
    DeployedReal {
        record: DeploymentRecord,
        steps: Vec<StepResult>,
    },
    DeployedFallback {
        record: DeploymentRecord,
        steps: Vec<StepResult>,
        /// Error from the fatal step that triggered the fallback
        cause: String,
    },
}

impl DeploymentOutcome {
    pub fn record(&self) -> &DeploymentRecord {
        match self {
            DeploymentOutcome::DeployedReal { record, .. }
            | DeploymentOutcome::DeployedFallback { record, .. } => record,
        }
    }

    pub fn into_record(self) -> DeploymentRecord {
        match self {
            DeploymentOutcome::DeployedReal { record, .. }
            | DeploymentOutcome::DeployedFallback { record, .. } => record,
        }
    }

    pub fn steps(&self) -> &[StepResult] {
        match self {
            DeploymentOutcome::DeployedReal { steps, .. }
            | DeploymentOutcome::DeployedFallback { steps, .. } => steps,
        }
    }

    pub fn origin(&self) -> DeploymentOrigin {
        self.record().origin
    }
}
