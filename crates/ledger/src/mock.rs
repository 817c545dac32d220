//! In-process ledger double.
//!
//! `MockLedger` plays all three external roles (signer, submission endpoint,
//! query endpoint) and keeps a call log that separates mutating submissions
//! from read-only queries. Successful submissions apply a small model of the
//! token and lending-adapter contracts, so check-before-write queries observe
//! the effect of earlier steps.

use async_trait::async_trait;
use rwa_issuance_types::{
    Address, ConfirmationStatus, ContractArg, NamedArg, OperationRequest, SignedEnvelope,
    TxHash, UnsignedEnvelope,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::{NetworkError, QueryClient, QueryError, Signer, SignerError, SubmissionClient};

/// Account the mock signs as unless told otherwise
pub const MOCK_SIGNER: &str = "GDQNY3PBOJOKYZSRMK2S7LHHGWZIUISD4QORETLMXEWXBI7KFZZMKTL3";

/// A read-only query seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCall {
    pub contract: Address,
    pub method: String,
    pub args: Vec<NamedArg>,
}

#[derive(Default)]
struct ContractModel {
    admins: HashMap<Address, Address>,
    pools: HashSet<Address>,
    token_configs: HashMap<Address, Value>,
    reserves: HashMap<(Address, Address), Value>,
}

struct MockState {
    status_script: VecDeque<ConfirmationStatus>,
    default_status: ConfirmationStatus,
    reject_signatures: bool,
    network_down: bool,
    failing_methods: HashSet<String>,
    unreachable_methods: HashSet<String>,
    query_overrides: HashMap<(String, Option<String>), Result<Value, QueryError>>,
    submissions: Vec<OperationRequest>,
    queries: Vec<QueryCall>,
    status_polls: u32,
    sequence: u64,
    pending: HashMap<TxHash, OperationRequest>,
    model: ContractModel,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            status_script: VecDeque::new(),
            default_status: ConfirmationStatus::Success,
            reject_signatures: false,
            network_down: false,
            failing_methods: HashSet::new(),
            unreachable_methods: HashSet::new(),
            query_overrides: HashMap::new(),
            submissions: Vec::new(),
            queries: Vec::new(),
            status_polls: 0,
            sequence: 0,
            pending: HashMap::new(),
            model: ContractModel::default(),
        }
    }
}

pub struct MockLedger {
    signer: Address,
    state: Mutex<MockState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        match Address::parse(MOCK_SIGNER) {
            Ok(signer) => Self::with_signer(signer),
            Err(_) => unreachable!("MOCK_SIGNER is a valid account address"),
        }
    }

    pub fn with_signer(signer: Address) -> Self {
        Self {
            signer,
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SCRIPTING
    // ═══════════════════════════════════════════════════════════════════════

    /// Statuses returned by successive `get_status` calls, across all transactions
    pub fn script_statuses(&self, statuses: Vec<ConfirmationStatus>) {
        self.state().status_script = statuses.into();
    }

    /// Status reported once the script is exhausted
    pub fn set_default_status(&self, status: ConfirmationStatus) {
        self.state().default_status = status;
    }

    pub fn reject_signatures(&self, reject: bool) {
        self.state().reject_signatures = reject;
    }

    /// Make every submission and query fail as unreachable
    pub fn set_network_down(&self, down: bool) {
        self.state().network_down = down;
    }

    /// Transactions calling `method` are accepted but confirm as `Failed`
    pub fn fail_method(&self, method: &str) {
        self.state().failing_methods.insert(method.to_string());
    }

    /// Submissions calling `method` fail as unreachable
    pub fn unreachable_method(&self, method: &str) {
        self.state().unreachable_methods.insert(method.to_string());
    }

    /// Fixed response for `method`, regardless of arguments
    pub fn respond(&self, method: &str, response: Result<Value, QueryError>) {
        self.state()
            .query_overrides
            .insert((method.to_string(), None), response);
    }

    /// Fixed response for `method` when its first address argument is `subject`
    pub fn respond_for(&self, method: &str, subject: &Address, response: Result<Value, QueryError>) {
        self.state()
            .query_overrides
            .insert((method.to_string(), Some(subject.to_string())), response);
    }

    /// Seed the recorded admin of `contract`
    pub fn set_admin(&self, contract: &Address, admin: &Address) {
        self.state()
            .model
            .admins
            .insert(contract.clone(), admin.clone());
    }

    pub fn add_pool(&self, pool: &Address) {
        self.state().model.pools.insert(pool.clone());
    }

    /// Seed an authorized token entry for `pool`
    pub fn attach_token(&self, pool: &Address, token: &Address) {
        self.state()
            .model
            .token_configs
            .insert(token.clone(), token_config(pool, token, 8000, 8500));
    }

    /// Seed an enabled reserve for `asset` in `pool`
    pub fn enable_reserve(&self, pool: &Address, asset: &Address) {
        self.state()
            .model
            .reserves
            .insert((pool.clone(), asset.clone()), reserve_info(asset));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Mutating calls submitted, in order
    pub fn submissions(&self) -> Vec<OperationRequest> {
        self.state().submissions.clone()
    }

    pub fn submitted_methods(&self) -> Vec<String> {
        self.state()
            .submissions
            .iter()
            .map(|r| r.method.clone())
            .collect()
    }

    /// Read-only queries issued, in order
    pub fn queries(&self) -> Vec<QueryCall> {
        self.state().queries.clone()
    }

    pub fn status_polls(&self) -> u32 {
        self.state().status_polls
    }

    pub fn clear_log(&self) {
        let mut state = self.state();
        state.submissions.clear();
        state.queries.clear();
        state.status_polls = 0;
    }
}

/// `get_token_config` result in the adapter's shape
fn token_config(pool: &Address, token: &Address, ltv_ratio: u32, liq_threshold: u32) -> Value {
    json!({
        "is_authorized": true,
        "liq_threshold": liq_threshold,
        "ltv_ratio": ltv_ratio,
        "pool_address": pool.to_string(),
        "token_address": token.to_string(),
    })
}

/// `get_reserve_info` result in the adapter's shape
fn reserve_info(asset: &Address) -> Value {
    json!({
        "asset": asset.to_string(),
        "c_factor": 7500,
        "enabled": true,
        "l_factor": 7500,
        "max_util": 9500,
        "r_base": 100,
        "r_one": 500,
        "r_two": 5000,
        "r_three": 15000,
        "reactivity": 40,
        "supply_cap": "170141183460469231731687303715884105727",
        "util": 0,
    })
}

fn first_address(args: &[NamedArg]) -> Option<&Address> {
    args.iter().find_map(|a| match &a.value {
        ContractArg::Address(addr) => Some(addr),
        _ => None,
    })
}

fn address_named<'a>(args: &'a [NamedArg], name: &str) -> Option<&'a Address> {
    args.iter().find_map(|a| match &a.value {
        ContractArg::Address(addr) if a.name == name => Some(addr),
        _ => None,
    })
}

fn address_arg<'a>(request: &'a OperationRequest, name: &str) -> Option<&'a Address> {
    match request.get_arg(name) {
        Some(ContractArg::Address(addr)) => Some(addr),
        _ => None,
    }
}

fn u32_arg(request: &OperationRequest, name: &str) -> Option<u32> {
    match request.get_arg(name) {
        Some(ContractArg::U32(v)) => Some(*v),
        _ => None,
    }
}

impl ContractModel {
    fn apply(&mut self, request: &OperationRequest) {
        match request.method.as_str() {
            "initialize" => {
                if let Some(admin) = address_arg(request, "admin") {
                    self.admins
                        .entry(request.contract.clone())
                        .or_insert_with(|| admin.clone());
                }
            }
            "register_pool" => {
                if let Some(pool) = address_arg(request, "pool_address") {
                    self.pools.insert(pool.clone());
                }
            }
            "add_token_to_pool" => {
                if let (Some(pool), Some(token)) = (
                    address_arg(request, "pool_address"),
                    address_arg(request, "token"),
                ) {
                    let config = token_config(
                        pool,
                        token,
                        u32_arg(request, "ltv_ratio").unwrap_or_default(),
                        u32_arg(request, "liq_threshold").unwrap_or_default(),
                    );
                    self.token_configs.insert(token.clone(), config);
                }
            }
            "setup_pool_reserve" => {
                if let (Some(pool), Some(asset)) = (
                    address_arg(request, "pool_address"),
                    address_arg(request, "asset"),
                ) {
                    self.reserves
                        .insert((pool.clone(), asset.clone()), reserve_info(asset));
                }
            }
            _ => {}
        }
    }

    fn query(&self, contract: &Address, method: &str, args: &[NamedArg]) -> Result<Value, QueryError> {
        match method {
            "get_admin" => Ok(self
                .admins
                .get(contract)
                .map(|a| Value::String(a.to_string()))
                .unwrap_or(Value::Null)),
            "pool_exists" => {
                let pool = first_address(args)
                    .ok_or_else(|| QueryError::NotFound("pool_address argument".to_string()))?;
                Ok(Value::Bool(self.pools.contains(pool)))
            }
            "get_token_config" => {
                let token = first_address(args)
                    .ok_or_else(|| QueryError::NotFound("token argument".to_string()))?;
                Ok(self.token_configs.get(token).cloned().unwrap_or(Value::Null))
            }
            "get_reserve_info" => {
                let (Some(pool), Some(asset)) = (
                    address_named(args, "pool_address"),
                    address_named(args, "asset"),
                ) else {
                    return Err(QueryError::NotFound(
                        "pool_address and asset arguments".to_string(),
                    ));
                };
                Ok(self
                    .reserves
                    .get(&(pool.clone(), asset.clone()))
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            other => Err(QueryError::NotFound(format!("method {other}"))),
        }
    }
}

#[async_trait]
impl Signer for MockLedger {
    fn address(&self) -> &Address {
        &self.signer
    }

    async fn sign(&self, envelope: UnsignedEnvelope) -> Result<SignedEnvelope, SignerError> {
        if self.state().reject_signatures {
            return Err(SignerError::Rejected("user declined".to_string()));
        }

        Ok(SignedEnvelope {
            signature: format!("mock-{}", envelope.payload_hash),
            envelope,
            signer: self.signer.clone(),
        })
    }
}

#[async_trait]
impl SubmissionClient for MockLedger {
    async fn next_sequence(&self, _account: &Address) -> Result<u64, NetworkError> {
        let mut state = self.state();
        if state.network_down {
            return Err(NetworkError::Unreachable("mock network down".to_string()));
        }
        state.sequence += 1;
        Ok(state.sequence)
    }

    async fn submit(&self, envelope: SignedEnvelope) -> Result<TxHash, NetworkError> {
        let mut state = self.state();
        let request = envelope.envelope.request;

        if state.network_down || state.unreachable_methods.contains(&request.method) {
            return Err(NetworkError::Unreachable(format!(
                "cannot reach network for {}",
                request.method
            )));
        }

        let hash = TxHash::new(envelope.envelope.payload_hash);
        state.submissions.push(request.clone());
        state.pending.insert(hash.clone(), request);
        Ok(hash)
    }

    async fn get_status(&self, hash: &TxHash) -> Result<ConfirmationStatus, NetworkError> {
        let mut state = self.state();
        state.status_polls += 1;

        let Some(request) = state.pending.get(hash).cloned() else {
            return Ok(ConfirmationStatus::NotFound);
        };

        let scripted = state
            .status_script
            .pop_front()
            .unwrap_or(state.default_status);

        let status = if scripted.is_terminal() && state.failing_methods.contains(&request.method) {
            ConfirmationStatus::Failed
        } else {
            scripted
        };

        if status.is_terminal() {
            state.pending.remove(hash);
            if status == ConfirmationStatus::Success {
                state.model.apply(&request);
            }
        }

        Ok(status)
    }
}

#[async_trait]
impl QueryClient for MockLedger {
    async fn call(
        &self,
        contract: &Address,
        method: &str,
        args: &[NamedArg],
    ) -> Result<Value, QueryError> {
        let mut state = self.state();
        state.queries.push(QueryCall {
            contract: contract.clone(),
            method: method.to_string(),
            args: args.to_vec(),
        });

        if state.network_down {
            return Err(QueryError::NetworkUnreachable("mock network down".to_string()));
        }

        let subject = first_address(args).map(|a| a.to_string());
        if let Some(response) = state
            .query_overrides
            .get(&(method.to_string(), subject))
            .or_else(|| state.query_overrides.get(&(method.to_string(), None)))
        {
            return response.clone();
        }

        state.model.query(contract, method, args)
    }
}
