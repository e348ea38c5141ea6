mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::GatewayError;
use defaults::*;

/// Top-level wagate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_true")]
    pub cors: bool,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors: true,
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// WhatsApp session config.
///
/// Session data is stored in `auth_dir` and deleted wholesale on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_auth_dir")]
    pub auth_dir: String,
    /// Device name shown in the phone's linked-devices list.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Fixed delay before reconnecting a dropped connection.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Delay between a logout and the next pairing cycle.
    #[serde(default = "default_relogin_delay_ms")]
    pub relogin_delay_ms: u64,
    /// Also render QR challenges to stdout.
    #[serde(default)]
    pub print_qr_terminal: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            auth_dir: default_auth_dir(),
            device_name: default_device_name(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            relogin_delay_ms: default_relogin_delay_ms(),
            print_qr_terminal: false,
        }
    }
}

impl WhatsAppConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn relogin_delay(&self) -> Duration {
        Duration::from_millis(self.relogin_delay_ms)
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, GatewayError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| GatewayError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| GatewayError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

impl Config {
    /// Apply overrides that come from the environment or the command line.
    pub fn apply_overrides(&mut self, port: Option<u16>, auth_dir: Option<String>) {
        if let Some(port) = port {
            self.api.port = port;
        }
        if let Some(dir) = auth_dir {
            self.whatsapp.auth_dir = dir;
        }
        self.whatsapp.auth_dir = shellexpand(&self.whatsapp.auth_dir);
    }
}
