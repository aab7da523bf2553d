//! JSON-RPC 2.0 wire types and request validation
//!
//! See: https://www.jsonrpc.org/specification

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request id. An absent or null id marks a notification and is kept as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl RequestId {
    /// `Ok(None)` for absent or null, `Err` for any other non-id value.
    fn from_value(value: Option<&Value>) -> Result<Option<Self>, ()> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(RequestId::Number(n.clone()))),
            Some(Value::String(s)) => Ok(Some(RequestId::String(s.clone()))),
            Some(_) => Err(()),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Named(Map::new())
    }
}

/// A structurally valid request.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub params: Params,
    pub id: Option<RequestId>,
}

impl RpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Why a request body was refused, with whatever id could be read before the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub error: RpcError,
    pub id: Option<RequestId>,
}

impl Rejection {
    fn new(error: RpcError, id: Option<RequestId>) -> Self {
        Self { error, id }
    }
}

/// Parse and validate one request body.
///
/// Checks run in order and stop at the first failure: valid JSON, top-level
/// object, usable `id`, `jsonrpc == "2.0"`, string `method`, array/object `params`.
pub fn parse_request(body: &[u8]) -> Result<RpcRequest, Rejection> {
    let data: Value =
        serde_json::from_slice(body).map_err(|_| Rejection::new(RpcError::parse_error(), None))?;

    let Value::Object(mut object) = data else {
        return Err(Rejection::new(
            RpcError::invalid_request("Request must be a JSON object."),
            None,
        ));
    };

    let id = RequestId::from_value(object.get("id")).map_err(|_| {
        Rejection::new(
            RpcError::invalid_request("'id' must be a string, number, or null."),
            None,
        )
    })?;

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(Rejection::new(
            RpcError::invalid_request("'jsonrpc' version must be '2.0'."),
            id,
        ));
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => {
            return Err(Rejection::new(
                RpcError::invalid_request("'method' must be a string."),
                id,
            ))
        }
    };

    let params = match object.remove("params") {
        None => Params::default(),
        Some(Value::Array(values)) => Params::Positional(values),
        Some(Value::Object(map)) => Params::Named(map),
        Some(_) => {
            return Err(Rejection::new(
                RpcError::invalid_params("'params' must be an array or object."),
                id,
            ))
        }
    };

    Ok(RpcRequest { method, params, id })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub payload: Payload,
    /// Serialized as `null` when the id is unknown
    pub id: Option<RequestId>,
}

impl RpcResponse {
    pub fn result(result: Value, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            payload: Payload::Result(result),
            id,
        }
    }

    pub fn error(error: RpcError, id: Option<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            payload: Payload::Error(error),
            id,
        }
    }
}
