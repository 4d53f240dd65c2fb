use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use voyage_hub::HubConfig;

// =============================================================================
// Unified config (figment-deserialized from defaults / voyage.toml / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   voyage.toml:     [hub]
//                    send_timeout_ms = 500
//
//   env var:         VOYAGE_HUB__SEND_TIMEOUT_MS=500   (double underscore = nesting)
//
//   CLI:             --host / --port override the [server] section

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "voyage.toml";

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub hub: HubFileConfig,
}

/// Listener settings (lives under `[server]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Browser origins allowed by CORS. Empty = permissive.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Hub tuning knobs (lives under `[hub]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubFileConfig {
    #[serde(default = "default_limited_roles")]
    pub limited_roles: Vec<String>,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Outbound frames buffered per connection before sends start waiting
    #[serde(default = "default_send_channel_capacity")]
    pub send_channel_capacity: usize,
}

impl Default for HubFileConfig {
    fn default() -> Self {
        Self {
            limited_roles: default_limited_roles(),
            send_timeout_ms: default_send_timeout_ms(),
            history_limit: default_history_limit(),
            send_channel_capacity: default_send_channel_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://frontend:3000".to_string(),
    ]
}
fn default_limited_roles() -> Vec<String> {
    HubConfig::default().limited_roles
}
fn default_send_timeout_ms() -> u64 {
    2000
}
fn default_history_limit() -> usize {
    50
}
fn default_send_channel_capacity() -> usize {
    64
}

/// Build a figment that layers: defaults → voyage.toml (or `path`) → VOYAGE_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `VOYAGE_SERVER__PORT=9000`  →  `server.port = 9000`
///   `VOYAGE_HUB__HISTORY_LIMIT=0`  →  `hub.history_limit = 0`
pub fn load_config(path: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("VOYAGE_").split("__"))
}

// =============================================================================
// Runtime config structs (derived from FileConfig, used throughout the server)
// =============================================================================

/// Server configuration for runtime behavior.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    /// WebSocket-related settings
    pub websocket: WebSocketConfig,
}

#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// Channel capacity for messages to client
    pub send_channel_capacity: usize,
}

impl ServerConfig {
    pub fn from_file(fc: &FileConfig) -> Result<Self> {
        let bind_addr = format!("{}:{}", fc.server.host, fc.server.port)
            .parse::<SocketAddr>()
            .with_context(|| {
                format!(
                    "Invalid listen address {}:{}",
                    fc.server.host, fc.server.port
                )
            })?;

        Ok(Self {
            bind_addr,
            allowed_origins: fc.server.allowed_origins.clone(),
            websocket: WebSocketConfig {
                send_channel_capacity: fc.hub.send_channel_capacity.max(1),
            },
        })
    }
}

impl HubFileConfig {
    /// Hub construction settings. A zero timeout is raised to 1ms so sends
    /// still get a chance to complete.
    pub fn to_hub_config(&self) -> HubConfig {
        HubConfig {
            limited_roles: self.limited_roles.clone(),
            send_timeout: Duration::from_millis(self.send_timeout_ms.max(1)),
            history_limit: self.history_limit,
        }
    }
}
