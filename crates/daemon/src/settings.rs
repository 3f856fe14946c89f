//! Daemon settings
//!
//! Layered with the `config` crate: optional TOML file, then `PUSHBRIDGE__*`
//! environment variables on top.
//!
//! ```text
//! PUSHBRIDGE__BRIDGE__PROJECT=acme
//! PUSHBRIDGE__BRIDGE__LOCATION=us-central1
//! PUSHBRIDGE__BRIDGE__CALLBACK_URL=https://bridge.example.com/delivery
//! PUSHBRIDGE__CLOUD_TASKS__ACCESS_TOKEN=ya29...
//! ```

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use pushbridge_api_http::HttpServerConfig;
use pushbridge_api_rpc::RpcServerConfig;
use pushbridge_core::BridgeConfig;
use pushbridge_infra_cloudtasks::CloudTasksConfig;
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "PUSHBRIDGE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pushbridge.toml";
pub const DEFAULT_DATABASE_PATH: &str = "~/.pushbridge/inbox.db";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSettings {
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub cloud_tasks: CloudTasksConfig,
    #[serde(default)]
    pub rpc: RpcServerConfig,
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl DaemonSettings {
    /// Load from `$PUSHBRIDGE_CONFIG` (or `pushbridge.toml`) plus environment
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// A missing file is not an error; the environment may carry everything
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("PUSHBRIDGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read settings from {}", path))?;

        let settings: Self = settings
            .try_deserialize()
            .context("invalid daemon settings")?;

        settings
            .bridge
            .validate()
            .context("invalid [bridge] settings")?;

        Ok(settings)
    }

    /// Database path with `~` and env vars expanded
    pub fn database_path(&self) -> Result<String> {
        let expanded = shellexpand::full(&self.database.path)
            .with_context(|| format!("cannot expand database path {}", self.database.path))?;
        Ok(expanded.into_owned())
    }
}
