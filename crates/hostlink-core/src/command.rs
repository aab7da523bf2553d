//! Owner-thread operations
//!
//! The wire form is `{"type": "set_title", "params": {"window_id": "...", "title": "..."}}`.
//! Variants without fields may omit `params`.

use serde::{Deserialize, Serialize};

use crate::window::WindowOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum ShellCommand {
    CreateWindow(WindowOptions),
    CloseWindow { window_id: String },
    ShowWindow { window_id: String },
    HideWindow { window_id: String },
    FocusWindow { window_id: String },
    SetTitle { window_id: String, title: String },
    SetSize { window_id: String, width: u32, height: u32 },
    SetPosition { window_id: String, x: i32, y: i32 },
    Minimize { window_id: String },
    Maximize { window_id: String },
    Restore { window_id: String },
    ToggleFullscreen { window_id: String },
    GetWindow { window_id: String },
    ListWindows,
    CloseAllWindows,
    SetClipboardText { text: String },
    GetClipboardText,
    /// Stop the owner loop after this command
    Quit,
}

impl ShellCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            ShellCommand::CreateWindow(_) => "create_window",
            ShellCommand::CloseWindow { .. } => "close_window",
            ShellCommand::ShowWindow { .. } => "show_window",
            ShellCommand::HideWindow { .. } => "hide_window",
            ShellCommand::FocusWindow { .. } => "focus_window",
            ShellCommand::SetTitle { .. } => "set_title",
            ShellCommand::SetSize { .. } => "set_size",
            ShellCommand::SetPosition { .. } => "set_position",
            ShellCommand::Minimize { .. } => "minimize",
            ShellCommand::Maximize { .. } => "maximize",
            ShellCommand::Restore { .. } => "restore",
            ShellCommand::ToggleFullscreen { .. } => "toggle_fullscreen",
            ShellCommand::GetWindow { .. } => "get_window",
            ShellCommand::ListWindows => "list_windows",
            ShellCommand::CloseAllWindows => "close_all_windows",
            ShellCommand::SetClipboardText { .. } => "set_clipboard_text",
            ShellCommand::GetClipboardText => "get_clipboard_text",
            ShellCommand::Quit => "quit",
        }
    }

    /// Whether reissuing the command leaves the shell in the same state as issuing it
    /// once.
    ///
    /// An issued command runs at most once. A caller that times out cannot tell if it
    /// ran, and a retry is a new command, so only commands returning true are safe to
    /// retry blindly. This is about shell state, not the reply: a repeated
    /// `CloseWindow` changes nothing but reports `WindowNotFound`.
    pub fn is_idempotent(&self) -> bool {
        !matches!(
            self,
            ShellCommand::CreateWindow(_) | ShellCommand::ToggleFullscreen { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let command: ShellCommand = serde_json::from_value(json!({
            "type": "set_title",
            "params": {"window_id": "w1", "title": "Hello"}
        }))
        .unwrap();
        assert_eq!(
            command,
            ShellCommand::SetTitle {
                window_id: "w1".to_string(),
                title: "Hello".to_string()
            }
        );
        assert_eq!(command.kind(), "set_title");
    }

    #[test]
    fn test_unit_variant_without_params() {
        let command: ShellCommand = serde_json::from_value(json!({"type": "list_windows"})).unwrap();
        assert_eq!(command, ShellCommand::ListWindows);
    }

    #[test]
    fn test_create_window_fills_defaults() {
        let command: ShellCommand = serde_json::from_value(json!({
            "type": "create_window",
            "params": {"title": "Settings"}
        }))
        .unwrap();

        match command {
            ShellCommand::CreateWindow(options) => {
                assert_eq!(options.title, "Settings");
                assert_eq!(options.width, 800);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_value::<ShellCommand>(json!({"type": "format_disk"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_idempotency() {
        assert!(!ShellCommand::CreateWindow(WindowOptions::default()).is_idempotent());
        assert!(ShellCommand::ListWindows.is_idempotent());
        assert!(ShellCommand::Quit.is_idempotent());
        assert!(ShellCommand::CloseWindow {
            window_id: "w1".to_string()
        }
        .is_idempotent());
        assert!(!ShellCommand::ToggleFullscreen {
            window_id: "w1".to_string()
        }
        .is_idempotent());
    }
}
