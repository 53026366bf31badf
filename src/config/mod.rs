//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file (given with
//! `--config` or found at `./paper-registry.toml` or
//! `<config dir>/paper-registry/config.toml`), then
//! environment variables prefixed with `PAPER_REGISTRY_`, using `__` between
//! section and key:
//!
//! ```bash
//! export PAPER_REGISTRY_SERVER__PORT=9000
//! export PAPER_REGISTRY_CLIENT__SERVER_ADDR="10.0.0.5:9000"
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [events]
//! queue_capacity = 1024
//! subscriber_capacity = 256
//!
//! [client]
//! server_addr = "127.0.0.1:8080"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::events::publisher::DEFAULT_QUEUE_CAPACITY;
use crate::events::topic::DEFAULT_SUBSCRIBER_CAPACITY;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PAPER_REGISTRY";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Notification settings
    #[serde(default)]
    pub events: EventsConfig,

    /// Interactive client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Notification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Notifications waiting for the publish worker before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Notifications a subscriber may fall behind before it loses some
    #[serde(default = "default_subscriber_capacity")]
    pub subscriber_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            subscriber_capacity: default_subscriber_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_subscriber_capacity() -> usize {
    DEFAULT_SUBSCRIBER_CAPACITY
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Address of the registry server
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: default_server_addr(),
        }
    }
}

fn default_server_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when neither `-v` nor `RUST_LOG` is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Default location of the configuration file, if one exists
pub fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        Some(PathBuf::from("paper-registry.toml")),
        dirs::config_dir().map(|dir| dir.join("paper-registry").join("config.toml")),
    ];

    candidates.into_iter().flatten().find(|path| path.is_file())
}
