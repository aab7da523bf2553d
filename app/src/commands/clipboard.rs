use hostlink_core::{Shell, ShellCommand};
use hostlink_rpc::{Call, MethodError, RegistryError, RpcRegistry};

use super::{shell, shell_error};

pub fn register(registry: &mut RpcRegistry<Shell>) -> Result<(), RegistryError> {
    registry
        .register(None, &["ctx", "text"], clipboard_set)?
        .register(None, &["ctx"], clipboard_get)?;
    Ok(())
}

pub async fn clipboard_set(call: Call<Shell>) -> Result<bool, MethodError> {
    let text: String = call.get("text")?;
    shell(&call)?
        .execute_async(ShellCommand::SetClipboardText { text })
        .await
        .map_err(shell_error)?;
    Ok(true)
}

pub async fn clipboard_get(call: Call<Shell>) -> Result<String, MethodError> {
    let text = shell(&call)?
        .request(ShellCommand::GetClipboardText)
        .await
        .map_err(shell_error)?;
    Ok(text)
}
