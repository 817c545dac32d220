//! Typed read-only contract queries.
//!
//! Each query names its method, its arguments and how to decode the raw JSON
//! result. Decoding fails closed: anything other than the expected shape is a
//! `DecodeError`, never a coerced default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::{Address, NamedArg, OperationRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct DecodeError {
    pub expected: &'static str,
    pub found: String,
}

impl DecodeError {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: describe(found),
        }
    }

    /// Like [`DecodeError::new`], keeping the reason the value was rejected
    pub fn with_reason(expected: &'static str, found: &Value, reason: impl fmt::Display) -> Self {
        Self {
            expected,
            found: format!("{} ({})", describe(found), reason),
        }
    }
}

/// Decode a JSON object into `T`, or `None` for null
fn decode_optional<T: DeserializeOwned>(
    expected: &'static str,
    raw: Value,
) -> Result<Option<T>, DecodeError> {
    match raw {
        Value::Null => Ok(None),
        Value::Object(_) => T::deserialize(&raw)
            .map(Some)
            .map_err(|e| DecodeError::with_reason(expected, &raw, e)),
        other => Err(DecodeError::new(expected, &other)),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(a) => format!("array of {}", a.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// A read-only contract call with a typed result
pub trait ContractQuery {
    type Output;

    fn method(&self) -> &'static str;

    fn args(&self) -> Vec<NamedArg>;

    fn decode(&self, raw: Value) -> Result<Self::Output, DecodeError>;

    /// Request form, for clients that simulate through the submission path
    fn to_request(&self, contract: Address) -> OperationRequest {
        let mut request = OperationRequest::new(contract, self.method());
        request.args = self.args();
        request
    }
}

/// `get_admin()` on the lending adapter. `None` when never initialised.
#[derive(Debug, Clone, Default)]
pub struct GetAdmin;

impl ContractQuery for GetAdmin {
    type Output = Option<Address>;

    fn method(&self) -> &'static str {
        "get_admin"
    }

    fn args(&self) -> Vec<NamedArg> {
        Vec::new()
    }

    fn decode(&self, raw: Value) -> Result<Self::Output, DecodeError> {
        match raw {
            Value::Null => Ok(None),
            Value::String(s) => Address::parse(&s)
                .map(Some)
                .map_err(|_| DecodeError::new("address", &Value::String(s))),
            other => Err(DecodeError::new("address or null", &other)),
        }
    }
}

/// `pool_exists(pool_address)`
#[derive(Debug, Clone)]
pub struct PoolExists {
    pub pool: Address,
}

impl ContractQuery for PoolExists {
    type Output = bool;

    fn method(&self) -> &'static str {
        "pool_exists"
    }

    fn args(&self) -> Vec<NamedArg> {
        vec![NamedArg {
            name: "pool_address".to_string(),
            value: self.pool.clone().into(),
        }]
    }

    fn decode(&self, raw: Value) -> Result<Self::Output, DecodeError> {
        raw.as_bool().ok_or_else(|| DecodeError::new("bool", &raw))
    }
}

/// Per-token configuration held by the lending adapter.
///
/// Fields beyond these are ignored; a missing or mistyped field is a decode
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPoolConfig {
    pub is_authorized: bool,
    pub ltv_ratio: u32,
    pub liq_threshold: u32,
    pub pool_address: Address,
    pub token_address: Address,
}

impl TokenPoolConfig {
    /// Authorized as collateral in `pool`
    pub fn is_attached_to(&self, pool: &Address) -> bool {
        self.is_authorized && &self.pool_address == pool
    }
}

/// `get_token_config(token)`. `None` when the token is unknown to the adapter.
#[derive(Debug, Clone)]
pub struct GetTokenConfig {
    pub token: Address,
}

impl ContractQuery for GetTokenConfig {
    type Output = Option<TokenPoolConfig>;

    fn method(&self) -> &'static str {
        "get_token_config"
    }

    fn args(&self) -> Vec<NamedArg> {
        vec![NamedArg {
            name: "token".to_string(),
            value: self.token.clone().into(),
        }]
    }

    fn decode(&self, raw: Value) -> Result<Self::Output, DecodeError> {
        decode_optional("token config", raw)
    }
}

/// Reserve bookkeeping for one asset in one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveInfo {
    pub asset: Address,
    pub enabled: bool,
    pub c_factor: u32,
    pub l_factor: u32,
    pub max_util: u32,
}

/// `get_reserve_info(pool_address, asset)`. `None` when no reserve was set up.
#[derive(Debug, Clone)]
pub struct GetReserveInfo {
    pub pool: Address,
    pub asset: Address,
}

impl ContractQuery for GetReserveInfo {
    type Output = Option<ReserveInfo>;

    fn method(&self) -> &'static str {
        "get_reserve_info"
    }

    fn args(&self) -> Vec<NamedArg> {
        vec![
            NamedArg {
                name: "pool_address".to_string(),
                value: self.pool.clone().into(),
            },
            NamedArg {
                name: "asset".to_string(),
                value: self.asset.clone().into(),
            },
        ]
    }

    fn decode(&self, raw: Value) -> Result<Self::Output, DecodeError> {
        decode_optional("reserve info", raw)
    }
}
