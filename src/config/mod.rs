use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::store::DEFAULT_SHARDS;

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Storage node configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
  /// gRPC listening address
  #[serde(default = "default_node_addr")]
  pub listen_addr: String,

  /// Number of lock shards in the entity store
  #[serde(default = "default_shards")]
  pub shards: usize,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

fn default_node_addr() -> String {
  "0.0.0.0:8081".to_string()
}

fn default_shards() -> usize {
  DEFAULT_SHARDS
}

impl Default for NodeConfig {
  fn default() -> Self {
    Self {
      listen_addr: default_node_addr(),
      shards: default_shards(),
      log: LogConfig::default(),
    }
  }
}

impl NodeConfig {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self> {
    let config: NodeConfig = load(path)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.listen_addr.trim().is_empty() {
      return Err(Error::InvalidConfig("listen_addr must not be empty".to_string()));
    }
    if self.shards == 0 {
      return Err(Error::InvalidConfig("shards must be at least 1".to_string()));
    }
    Ok(())
  }
}

/// HTTP gateway configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
  /// HTTP listening address
  #[serde(default = "default_gateway_addr")]
  pub listen_addr: String,

  /// Address of the storage node's gRPC listener
  #[serde(default = "default_backend_addr")]
  pub backend_addr: String,

  /// Deadline for a single storage call, in milliseconds
  #[serde(default = "default_request_timeout_ms")]
  pub request_timeout_ms: u64,

  /// Deadline for establishing the connection to the node, in milliseconds
  #[serde(default = "default_connect_timeout_ms")]
  pub connect_timeout_ms: u64,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

fn default_gateway_addr() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_backend_addr() -> String {
  "localhost:8081".to_string()
}

fn default_request_timeout_ms() -> u64 {
  5000
}

fn default_connect_timeout_ms() -> u64 {
  1000
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      listen_addr: default_gateway_addr(),
      backend_addr: default_backend_addr(),
      request_timeout_ms: default_request_timeout_ms(),
      connect_timeout_ms: default_connect_timeout_ms(),
      log: LogConfig::default(),
    }
  }
}

impl GatewayConfig {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self> {
    let config: GatewayConfig = load(path)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.listen_addr.trim().is_empty() {
      return Err(Error::InvalidConfig("listen_addr must not be empty".to_string()));
    }
    if self.backend_addr.trim().is_empty() {
      return Err(Error::InvalidConfig("backend_addr must not be empty".to_string()));
    }
    if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
      return Err(Error::InvalidConfig("timeouts must be greater than zero".to_string()));
    }
    Ok(())
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }

  pub fn connect_timeout(&self) -> Duration {
    Duration::from_millis(self.connect_timeout_ms)
  }
}

fn load<T: DeserializeOwned>(path: &str) -> Result<T> {
  let config_str = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
    path: path.to_string(),
    source,
  })?;

  toml::from_str(&config_str).map_err(|source| Error::ConfigParse {
    path: path.to_string(),
    source,
  })
}
