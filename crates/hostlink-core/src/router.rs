//! Owner-thread dispatch for `ShellCommand`

use hostlink_bridge::Router;
use serde::Serialize;
use serde_json::Value;

use crate::command::ShellCommand;
use crate::error::CoreError;
use crate::windows::WindowManager;
use crate::Result;

/// Owner-thread state. Lives on the owner thread for its whole life.
pub struct ShellRouter {
    windows: WindowManager,
    clipboard: String,
    quitting: bool,
}

impl ShellRouter {
    pub fn new(windows: WindowManager) -> Self {
        Self {
            windows,
            clipboard: String::new(),
            quitting: false,
        }
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }
}

impl Router for ShellRouter {
    type Command = ShellCommand;
    type Output = Value;
    type Error = CoreError;

    fn dispatch(&mut self, command: ShellCommand) -> Result<Value> {
        let windows = &self.windows;

        match command {
            ShellCommand::CreateWindow(options) => encode(windows.create(options)?),
            ShellCommand::CloseWindow { window_id } => encode(windows.close(&window_id)?),
            ShellCommand::ShowWindow { window_id } => {
                encode(windows.update(&window_id, |w| w.show())?)
            }
            ShellCommand::HideWindow { window_id } => {
                encode(windows.update(&window_id, |w| w.hide())?)
            }
            ShellCommand::FocusWindow { window_id } => encode(windows.focus(&window_id)?),
            ShellCommand::SetTitle { window_id, title } => encode(windows.update(&window_id, |w| {
                w.set_title(title);
                Ok(())
            })?),
            ShellCommand::SetSize {
                window_id,
                width,
                height,
            } => encode(windows.update(&window_id, |w| w.set_size(width, height))?),
            ShellCommand::SetPosition { window_id, x, y } => {
                encode(windows.update(&window_id, |w| {
                    w.set_position(x, y);
                    Ok(())
                })?)
            }
            ShellCommand::Minimize { window_id } => {
                encode(windows.update(&window_id, |w| w.minimize())?)
            }
            ShellCommand::Maximize { window_id } => {
                encode(windows.update(&window_id, |w| w.maximize())?)
            }
            ShellCommand::Restore { window_id } => {
                encode(windows.update(&window_id, |w| w.restore())?)
            }
            ShellCommand::ToggleFullscreen { window_id } => {
                encode(windows.update(&window_id, |w| w.toggle_fullscreen())?)
            }
            ShellCommand::GetWindow { window_id } => encode(windows.get(&window_id)?),
            ShellCommand::ListWindows => encode(windows.list()),
            ShellCommand::CloseAllWindows => encode(windows.close_all()),
            ShellCommand::SetClipboardText { text } => {
                self.clipboard = text;
                Ok(Value::Null)
            }
            ShellCommand::GetClipboardText => Ok(Value::String(self.clipboard.clone())),
            ShellCommand::Quit => {
                tracing::info!("Quit requested");
                self.quitting = true;
                Ok(Value::Null)
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.quitting
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
