//! Persistent key/value methods

use hostlink_core::Shell;
use hostlink_rpc::{Call, MethodError, RegistryError, RpcRegistry};
use serde_json::Value;

use super::{shell, shell_error};

pub fn register(registry: &mut RpcRegistry<Shell>) -> Result<(), RegistryError> {
    registry
        .register(None, &["ctx", "key"], store_get)?
        .register(None, &["ctx", "key", "value"], store_set)?
        .register(None, &["ctx", "key"], store_remove)?
        .register(None, &["ctx"], store_keys)?;
    Ok(())
}

pub async fn store_get(call: Call<Shell>) -> Result<Option<Value>, MethodError> {
    let key: String = call.get("key")?;
    let value = shell(&call)?
        .store()
        .get(&key)
        .map_err(|e| shell_error(e.into()))?;
    Ok(value)
}

pub async fn store_set(call: Call<Shell>) -> Result<bool, MethodError> {
    let key: String = call.get("key")?;
    let value: Value = call.get("value")?;
    shell(&call)?
        .store()
        .set(&key, &value)
        .map_err(|e| shell_error(e.into()))?;

    tracing::debug!(key = %key, "Stored value");
    Ok(true)
}

/// Returns whether the key existed.
pub async fn store_remove(call: Call<Shell>) -> Result<bool, MethodError> {
    let key: String = call.get("key")?;
    let removed = shell(&call)?
        .store()
        .remove(&key)
        .map_err(|e| shell_error(e.into()))?;
    Ok(removed)
}

pub async fn store_keys(call: Call<Shell>) -> Result<Vec<String>, MethodError> {
    let keys = shell(&call)?
        .store()
        .keys()
        .map_err(|e| shell_error(e.into()))?;
    Ok(keys)
}
