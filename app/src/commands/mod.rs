//! RPC methods
//!
//! Every method declares `ctx`: the shell handle is only reachable through the
//! per-call context.

pub mod clipboard;
pub mod diagnostics;
pub mod execute;
pub mod store;
pub mod windows;

use hostlink_core::{CoreError, Shell};
use hostlink_rpc::{Call, MethodError, MethodInfo, RegistryError, RpcError, RpcRegistry};
use serde_json::json;
use std::sync::Arc;

/// Application error codes, in the JSON-RPC server error range
pub mod codes {
    pub const WINDOW_NOT_FOUND: i64 = -32001;
    pub const INVALID_WINDOW_OPERATION: i64 = -32002;
    pub const COMMAND_TIMEOUT: i64 = -32003;
    pub const SHELL_UNAVAILABLE: i64 = -32004;
}

/// Build the registry with every built-in method, plus `methods` to list them.
pub fn registry() -> Result<RpcRegistry<Shell>, RegistryError> {
    let mut registry = RpcRegistry::new();

    windows::register(&mut registry)?;
    store::register(&mut registry)?;
    clipboard::register(&mut registry)?;
    diagnostics::register(&mut registry)?;
    execute::register(&mut registry)?;

    let mut described = registry.describe();
    described.push(MethodInfo {
        name: "methods".to_string(),
        params: Vec::new(),
        accepts_context: false,
    });
    described.sort_by(|a, b| a.name.cmp(&b.name));

    registry.register(Some("methods"), &[], move |_call: Call<Shell>| {
        let described = described.clone();
        async move { Ok::<_, MethodError>(described) }
    })?;

    Ok(registry)
}

pub(crate) fn shell(call: &Call<Shell>) -> Result<Arc<Shell>, RpcError> {
    Ok(Arc::clone(call.context()?.application()))
}

/// Map a shell failure to the error object sent to the frontend.
pub(crate) fn shell_error(error: CoreError) -> RpcError {
    match error {
        CoreError::WindowNotFound(window_id) => RpcError::new(
            codes::WINDOW_NOT_FOUND,
            format!("Window not found: {window_id}"),
        )
        .with_data(json!({ "window_id": window_id })),
        error @ (CoreError::InvalidTransition { .. }
        | CoreError::InvalidSize { .. }
        | CoreError::Url(_)) => {
            RpcError::new(codes::INVALID_WINDOW_OPERATION, error.to_string())
        }
        error if error.is_timeout() => {
            RpcError::new(codes::COMMAND_TIMEOUT, "Shell did not answer in time")
        }
        CoreError::Bridge(_) => {
            RpcError::new(codes::SHELL_UNAVAILABLE, "Shell is not running")
        }
        error => {
            tracing::error!(error = %error, "Shell operation failed");
            RpcError::server_error("CoreError")
        }
    }
}
