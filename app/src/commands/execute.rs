//! Raw owner-thread command
//!
//! `{"type": "set_position", "params": {"window_id": "...", "x": 0, "y": 0}}` runs the
//! matching `ShellCommand` as-is. An unknown type is an invalid-params error.

use hostlink_core::{Shell, ShellCommand};
use hostlink_rpc::{Call, MethodError, RegistryError, RpcError, RpcRegistry};
use serde_json::{json, Value};

use super::{shell, shell_error};

pub fn register(registry: &mut RpcRegistry<Shell>) -> Result<(), RegistryError> {
    registry.register(None, &["ctx", "type", "params"], execute)?;
    Ok(())
}

pub async fn execute(call: Call<Shell>) -> Result<Value, MethodError> {
    let kind: String = call.get("type")?;
    let params: Option<Value> = call.opt("params")?;

    let raw = match params {
        Some(params) => json!({ "type": kind, "params": params }),
        None => json!({ "type": kind }),
    };
    let command: ShellCommand = serde_json::from_value(raw)
        .map_err(|e| RpcError::invalid_params(&format!("command '{kind}': {e}.")))?;

    if !command.is_idempotent() {
        tracing::debug!(kind = command.kind(), "Executing non-idempotent command");
    }

    let value = shell(&call)?
        .execute_async(command)
        .await
        .map_err(shell_error)?;
    Ok(value)
}
