//! Application handle shared with every RPC method
//!
//! `Shell` is the cross-thread face of the application: it reads window
//! snapshots directly and routes every change through the command bridge.

use hostlink_bridge::{channel, CommandBridge, OwnerLoop};
use hostlink_rpc::Application;
use hostlink_store::Store;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::command::ShellCommand;
use crate::config::Config;
use crate::router::ShellRouter;
use crate::window::Window;
use crate::windows::WindowManager;
use crate::Result;

pub struct Shell {
    config: Config,
    windows: WindowManager,
    bridge: CommandBridge<ShellRouter>,
    store: Store,
}

impl Shell {
    /// Open the store from `config` and build the shell.
    ///
    /// The returned loop must be run (or pumped) on the thread that is to own
    /// window state; commands queue until it is.
    pub fn new(config: Config) -> Result<(Self, OwnerLoop<ShellRouter>)> {
        let store = Store::open(&config.store_path)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Store) -> (Self, OwnerLoop<ShellRouter>) {
        let windows = WindowManager::new();
        let (bridge, owner) = channel(ShellRouter::new(windows.clone()));

        tracing::info!(
            app = %config.app_name,
            store = %config.store_path.display(),
            "Shell initialized"
        );

        let shell = Self {
            config,
            windows,
            bridge,
            store,
        };

        (shell, owner)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bridge(&self) -> &CommandBridge<ShellRouter> {
        &self.bridge
    }

    // === Snapshot reads ===

    pub fn find_window(&self, window_id: &str) -> Option<Window> {
        self.windows.find(window_id)
    }

    pub fn list_windows(&self) -> Vec<Window> {
        self.windows.list()
    }

    pub fn focused_window(&self) -> Option<Window> {
        self.windows.focused()
    }

    // === Owner-thread commands ===

    /// Run a command on the owner thread, blocking up to the configured timeout.
    pub fn execute(&self, command: ShellCommand) -> Result<Value> {
        tracing::debug!(kind = command.kind(), "Executing shell command");
        Ok(self.bridge.execute(command, self.config.command_timeout())?)
    }

    pub async fn execute_async(&self, command: ShellCommand) -> Result<Value> {
        tracing::debug!(kind = command.kind(), "Executing shell command");
        Ok(self
            .bridge
            .execute_async(command, self.config.command_timeout())
            .await?)
    }

    /// `execute_async`, decoding the result.
    pub async fn request<T: DeserializeOwned>(&self, command: ShellCommand) -> Result<T> {
        let value = self.execute_async(command).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Application for Shell {
    type Window = Window;

    fn window(&self, token: &str) -> Option<Window> {
        self.windows.find(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::window::WindowOptions;
    use hostlink_bridge::BridgeError;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;

    fn shell() -> (Shell, OwnerLoop<ShellRouter>) {
        let config = Config::new(PathBuf::from("/tmp/hostlink-shell-test"));
        Shell::with_store(config, Store::open_in_memory().unwrap())
    }

    #[test]
    fn test_commands_from_another_thread() {
        let (shell, owner) = shell();
        let shell = Arc::new(shell);

        let caller = {
            let shell = Arc::clone(&shell);
            thread::spawn(move || {
                let value = shell
                    .execute(ShellCommand::CreateWindow(WindowOptions::default()))
                    .unwrap();
                let id = value["id"].as_str().unwrap().to_string();

                assert!(shell.find_window(&id).is_some());
                shell.execute(ShellCommand::Quit).unwrap();
                id
            })
        };

        let router = owner.run();
        let id = caller.join().unwrap();

        assert!(router.is_quitting());
        assert_eq!(shell.window(&id).unwrap().id, id);
    }

    #[test]
    fn test_operation_errors_surface_unwrapped() {
        let (shell, owner) = shell();

        let caller = thread::spawn(move || {
            let err = shell
                .execute(ShellCommand::CloseWindow {
                    window_id: "nope".to_string(),
                })
                .unwrap_err();
            shell.execute(ShellCommand::Quit).unwrap();
            err
        });

        owner.run();
        assert!(matches!(
            caller.join().unwrap(),
            CoreError::WindowNotFound(_)
        ));
    }

    #[test]
    fn test_reentrant_call_rejected() {
        let (shell, mut owner) = shell();
        owner.pump();

        let err = shell.execute(ShellCommand::ListWindows).unwrap_err();
        assert!(matches!(err, CoreError::Bridge(BridgeError::Reentrant)));
    }

    #[test]
    fn test_owner_gone() {
        let (shell, owner) = shell();
        drop(owner);

        let err = shell.execute(ShellCommand::ListWindows).unwrap_err();
        assert!(matches!(err, CoreError::Bridge(BridgeError::OwnerGone)));
    }

    #[tokio::test]
    async fn test_request_decodes_result() {
        let (shell, owner) = shell();

        let owner_thread = thread::spawn(move || owner.run());

        let window: Window = shell
            .request(ShellCommand::CreateWindow(WindowOptions {
                title: "Async".to_string(),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(window.title, "Async");

        let windows: Vec<Window> = shell.request(ShellCommand::ListWindows).await.unwrap();
        assert_eq!(windows.len(), 1);

        shell.execute_async(ShellCommand::Quit).await.unwrap();
        owner_thread.join().unwrap();
    }
}
