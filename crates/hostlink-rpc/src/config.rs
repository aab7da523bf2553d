//! Server configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Address to bind; loopback unless the frontend lives elsewhere
    pub host: String,
    /// Port to bind, 0 for an OS-assigned free port
    pub port: u16,
    /// URL path of the endpoint
    pub path: String,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Header carrying the caller's window token
    pub window_header: String,
    /// Resolve the window from the request `id` when the header is absent
    pub id_as_window_fallback: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            path: "/rpc".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            window_header: "x-window-id".to_string(),
            id_as_window_fallback: false,
        }
    }
}
