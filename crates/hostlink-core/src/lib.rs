//! Hostlink Core
//!
//! Shell state and the owner-thread command table.
//! Window state is owned by the thread running the `OwnerLoop`; every other thread
//! goes through the `CommandBridge` to change it and reads cloned snapshots.

mod command;
mod config;
mod error;
mod router;
mod shell;
mod window;
mod windows;

pub use command::ShellCommand;
pub use config::Config;
pub use error::CoreError;
pub use router::ShellRouter;
pub use shell::Shell;
pub use window::{Window, WindowOptions, WindowState};
pub use windows::WindowManager;

// Re-export the layers the shell is built on
pub use hostlink_bridge::{BridgeError, CommandBridge, OwnerLoop};
pub use hostlink_rpc::{RpcConfig, RpcRegistry, RpcServer, ServerHandle};
pub use hostlink_store::{StorageError, Store};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
