//! RPC error types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Standard JSON-RPC 2.0 error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Default code for application errors
    pub const SERVER_ERROR: i64 = -32000;
}

/// JSON-RPC error object.
///
/// Returned from a method handler (with `?` or `Err(..into())`), it is sent to the
/// caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Application error with the default code
    pub fn application(message: impl Into<String>) -> Self {
        Self::new(codes::SERVER_ERROR, message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn unsupported_content_type() -> Self {
        Self::new(
            codes::PARSE_ERROR,
            "Parse error: Content-Type must be application/json.",
        )
    }

    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "Parse error: Invalid JSON format.")
    }

    pub fn invalid_request(reason: &str) -> Self {
        Self::new(codes::INVALID_REQUEST, format!("Invalid Request: {reason}"))
    }

    pub fn invalid_params(reason: &str) -> Self {
        Self::new(codes::INVALID_PARAMS, format!("Invalid params: {reason}"))
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::invalid_request(&format!("request body exceeds {limit} bytes."))
    }

    pub fn method_not_found() -> Self {
        Self::new(codes::METHOD_NOT_FOUND, "Method not found.")
    }

    pub fn internal_error() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal error")
    }

    /// Generic error for unexpected failures. Only the type name leaves the server.
    pub fn server_error(type_name: &str) -> Self {
        Self::new(codes::SERVER_ERROR, format!("Server error: {type_name}"))
    }
}

/// Error returned by a method handler.
///
/// Any `std::error::Error` converts into it with `?`. An `RpcError` is surfaced to
/// the caller as-is; anything else is reported by type name only.
pub struct MethodError {
    type_name: &'static str,
    inner: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl MethodError {
    /// Ad-hoc failure with a message that stays server-side.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            type_name: "Error",
            inner: Box::new(Message(message.into())),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn as_rpc(&self) -> Option<&RpcError> {
        self.inner.downcast_ref::<RpcError>()
    }

    pub fn source(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.inner
    }
}

impl<E> From<E> for MethodError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            type_name: short_type_name::<E>(),
            inner: Box::new(error),
        }
    }
}

impl fmt::Debug for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodError")
            .field("type_name", &self.type_name)
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.inner)
    }
}

#[derive(Error, Debug)]
#[error("{0}")]
struct Message(String);

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("RPC method name '{0}' is already registered")]
    Duplicate(String),

    #[error("Handler {0} has no usable name; pass one explicitly")]
    Unnamed(&'static str),

    #[error("Invalid RPC method name: '{0}'")]
    InvalidName(String),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid server configuration: {0}")]
    Config(String),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server thread panicked")]
    Panicked,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_object_shape() {
        let err = RpcError::application("quota exceeded").with_data(json!({"limit": 3}));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({"code": -32000, "message": "quota exceeded", "data": {"limit": 3}})
        );

        let bare = serde_json::to_value(RpcError::method_not_found()).unwrap();
        assert!(bare.get("data").is_none());
    }

    #[test]
    fn test_method_error_keeps_rpc_error() {
        let err: MethodError = RpcError::new(-32010, "window is closed").into();
        assert_eq!(err.type_name(), "RpcError");
        assert_eq!(err.as_rpc().unwrap().code, -32010);
    }

    #[test]
    fn test_method_error_records_type_name() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: MethodError = parse.into();
        assert_eq!(err.type_name(), "Error");
        assert!(err.as_rpc().is_none());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = MethodError::from(io);
        assert_eq!(err.type_name(), "Error");
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<RpcError>(), "RpcError");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<std::fmt::Error>(), "Error");
    }
}
