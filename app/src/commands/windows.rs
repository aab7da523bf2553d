//! Window methods

use hostlink_core::{Shell, ShellCommand, Window, WindowOptions};
use hostlink_rpc::{Call, MethodError, RegistryError, RpcError, RpcRegistry};

use super::{shell, shell_error};

pub fn register(registry: &mut RpcRegistry<Shell>) -> Result<(), RegistryError> {
    registry
        .register(
            None,
            &["ctx", "title", "url", "width", "height", "x", "y", "visible", "fullscreen"],
            create_window,
        )?
        .register(None, &["ctx", "window_id"], close_window)?
        .register(None, &["ctx", "title", "window_id"], set_title)?
        .register(None, &["ctx", "width", "height", "window_id"], set_size)?
        .register(None, &["ctx", "window_id"], toggle_fullscreen)?
        .register(None, &["ctx", "window_id"], get_window)?
        .register(None, &["ctx"], list_windows)?
        .register(None, &["ctx"], current_window)?;
    Ok(())
}

/// Explicit `window_id`, else the window the call came from.
fn target(call: &Call<Shell>) -> Result<String, RpcError> {
    if let Some(window_id) = call.opt::<String>("window_id")? {
        return Ok(window_id);
    }

    call.context()?
        .window()
        .map(|window| window.id.clone())
        .ok_or_else(|| {
            RpcError::invalid_params("'window_id' is required when the caller has no window.")
        })
}

pub async fn create_window(call: Call<Shell>) -> Result<Window, MethodError> {
    let defaults = WindowOptions::default();
    let options = WindowOptions {
        title: call.opt("title")?.unwrap_or(defaults.title),
        url: call.opt("url")?,
        width: call.opt("width")?.unwrap_or(defaults.width),
        height: call.opt("height")?.unwrap_or(defaults.height),
        x: call.opt("x")?.unwrap_or(defaults.x),
        y: call.opt("y")?.unwrap_or(defaults.y),
        visible: call.opt("visible")?.unwrap_or(defaults.visible),
        fullscreen: call.opt("fullscreen")?.unwrap_or(defaults.fullscreen),
    };

    let shell = shell(&call)?;
    let window = shell
        .request(ShellCommand::CreateWindow(options))
        .await
        .map_err(shell_error)?;
    Ok(window)
}

pub async fn close_window(call: Call<Shell>) -> Result<Window, MethodError> {
    let window_id = target(&call)?;
    let shell = shell(&call)?;
    let window = shell
        .request(ShellCommand::CloseWindow { window_id })
        .await
        .map_err(shell_error)?;
    Ok(window)
}

pub async fn set_title(call: Call<Shell>) -> Result<Window, MethodError> {
    let title: String = call.get("title")?;
    let window_id = target(&call)?;
    let shell = shell(&call)?;
    let window = shell
        .request(ShellCommand::SetTitle { window_id, title })
        .await
        .map_err(shell_error)?;
    Ok(window)
}

pub async fn set_size(call: Call<Shell>) -> Result<Window, MethodError> {
    let width: u32 = call.get("width")?;
    let height: u32 = call.get("height")?;
    let window_id = target(&call)?;
    let shell = shell(&call)?;
    let window = shell
        .request(ShellCommand::SetSize {
            window_id,
            width,
            height,
        })
        .await
        .map_err(shell_error)?;
    Ok(window)
}

pub async fn toggle_fullscreen(call: Call<Shell>) -> Result<bool, MethodError> {
    let window_id = target(&call)?;
    let shell = shell(&call)?;
    let window: Window = shell
        .request(ShellCommand::ToggleFullscreen { window_id })
        .await
        .map_err(shell_error)?;
    Ok(window.state == hostlink_core::WindowState::Fullscreen)
}

/// Snapshot read; does not go through the owner thread.
pub async fn get_window(call: Call<Shell>) -> Result<Window, MethodError> {
    let window_id = target(&call)?;
    let shell = shell(&call)?;
    let window = shell
        .find_window(&window_id)
        .ok_or_else(|| shell_error(hostlink_core::CoreError::WindowNotFound(window_id)))?;
    Ok(window)
}

pub async fn list_windows(call: Call<Shell>) -> Result<Vec<Window>, MethodError> {
    Ok(shell(&call)?.list_windows())
}

pub async fn current_window(call: Call<Shell>) -> Result<Option<Window>, MethodError> {
    Ok(call.context()?.window().cloned())
}
