//! Hostlink desktop shell
//!
//! The main thread owns window state and runs the owner loop. The RPC server runs
//! on its own thread and reaches window state only through the command bridge.

pub mod commands;

use anyhow::Context as _;
use hostlink_core::{Config, RpcServer, ServerHandle, Shell, WindowOptions};
use std::sync::Arc;

/// Bind the RPC endpoint for `shell` and start serving it in the background.
pub fn start_server(shell: Arc<Shell>) -> anyhow::Result<ServerHandle> {
    let registry = commands::registry().context("Failed to register RPC methods")?;
    let config = shell.config().rpc.clone();

    let server = RpcServer::bind(registry, shell, config).context("Failed to bind RPC server")?;
    Ok(server.spawn()?)
}

pub fn run() -> anyhow::Result<()> {
    hostlink_core::init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    let (shell, owner) = Shell::new(config).context("Failed to initialize shell")?;
    let shell = Arc::new(shell);

    let server = start_server(Arc::clone(&shell))?;

    // Still on the owner thread, so the registry can be touched directly.
    let main_window = owner.router().windows().create(WindowOptions {
        title: shell.config().app_name.clone(),
        ..Default::default()
    })?;

    tracing::info!(
        rpc_url = %server.url(),
        window_id = %main_window.id,
        "Hostlink started"
    );

    let router = owner.run();

    let open = router.windows().close_all();
    server.stop().context("RPC server failed")?;

    tracing::info!(closed_windows = open, "Hostlink stopped");
    Ok(())
}
