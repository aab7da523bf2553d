use chrono::Utc;
use hostlink_core::Shell;
use hostlink_rpc::{Call, MethodError, RegistryError, RpcRegistry};
use serde::Serialize;
use serde_json::Value;

pub fn register(registry: &mut RpcRegistry<Shell>) -> Result<(), RegistryError> {
    registry
        .register(None, &[], ping)?
        .register(None, &["message"], echo)?
        .register(None, &["ctx"], frontend_ready)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct Pong {
    pub pong: bool,
    pub time: String,
}

pub async fn ping(_call: Call<Shell>) -> Result<Pong, MethodError> {
    Ok(Pong {
        pong: true,
        time: Utc::now().to_rfc3339(),
    })
}

pub async fn echo(call: Call<Shell>) -> Result<Value, MethodError> {
    Ok(call.get::<Value>("message")?)
}

pub async fn frontend_ready(call: Call<Shell>) -> Result<bool, MethodError> {
    let window_id = call.context()?.window().map(|window| window.id.clone());
    tracing::info!(window_id = ?window_id, "Frontend ready");
    Ok(true)
}
