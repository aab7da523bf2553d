//! Shell configuration

use hostlink_rpc::RpcConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display name, also used for the data directory
    pub app_name: String,
    /// Root of everything the shell writes to disk
    pub data_dir: PathBuf,
    /// Path to the key/value store
    pub store_path: PathBuf,
    /// Default wait for owner-thread commands, in milliseconds. 0 waits forever.
    pub command_timeout: u64,
    pub rpc: RpcConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            app_name: "Hostlink".to_string(),
            store_path: data_dir.join("hostlink.db"),
            data_dir,
            command_timeout: 5000,
            rpc: RpcConfig::default(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Hostlink"))
            .unwrap_or_else(|| PathBuf::from(".hostlink"))
    }

    /// Defaults with `HOSTLINK_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("HOSTLINK_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => Self::new(PathBuf::from(dir)),
            _ => Self::default(),
        };

        if let Some(port) = env_number::<u16>("HOSTLINK_RPC_PORT")? {
            config.rpc.port = port;
        }
        if let Some(timeout) = env_number::<u64>("HOSTLINK_COMMAND_TIMEOUT_MS")? {
            config.command_timeout = timeout;
        }

        Ok(config)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout > 0).then(|| Duration::from_millis(self.command_timeout))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_data_dir() {
        let config = Config::new(PathBuf::from("/tmp/hostlink-test"));
        assert_eq!(config.store_path, PathBuf::from("/tmp/hostlink-test/hostlink.db"));
        assert_eq!(config.command_timeout(), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_default_data_dir() {
        let expected = dirs::data_local_dir()
            .map(|d| d.join("Hostlink"))
            .unwrap_or_else(|| PathBuf::from(".hostlink"));
        assert_eq!(Config::data_dir(), expected);
        assert_eq!(Config::default().store_path, expected.join("hostlink.db"));
    }

    #[test]
    fn test_zero_timeout_waits_forever() {
        let config = Config {
            command_timeout: 0,
            ..Config::new(PathBuf::from("."))
        };
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"command_timeout": 250, "rpc": {"port": 9000}}"#).unwrap();
        assert_eq!(config.command_timeout, 250);
        assert_eq!(config.rpc.port, 9000);
        assert_eq!(config.rpc.path, "/rpc");
        assert_eq!(config.app_name, "Hostlink");
    }

    #[test]
    fn test_env_number() {
        std::env::set_var("HOSTLINK_TEST_NUMBER", "42");
        assert_eq!(env_number::<u16>("HOSTLINK_TEST_NUMBER").unwrap(), Some(42));

        std::env::set_var("HOSTLINK_TEST_NUMBER", "lots");
        assert!(env_number::<u16>("HOSTLINK_TEST_NUMBER").is_err());

        std::env::remove_var("HOSTLINK_TEST_NUMBER");
        assert_eq!(env_number::<u16>("HOSTLINK_TEST_NUMBER").unwrap(), None);
    }
}
