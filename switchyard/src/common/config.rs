/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::PathBuf;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::router::RoutingStrategy;
use crate::store::StoreBackend;

const APP_PREFIX: &str = "switchyard";

/// Configuration for a Switchyard container.
///
/// Loaded from TOML in XDG-compliant directories; every field has a default, so a partial
/// file only overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Limits and capacity configuration
    pub limits: LimitsConfig,
    /// Endpoint selection configuration
    pub routing: RoutingConfig,
    /// Exchange store configuration
    pub store: StoreConfig,
    /// Tracing and logging configuration
    pub tracing: TracingConfig,
    /// Path configuration for various directories
    pub paths: PathsConfig,
    /// Behavioral configuration switches
    pub behavior: BehaviorConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a synchronous send waits for the reply, in milliseconds
    pub sync_send_timeout_ms: u64,
    /// Default wait for a pull-style `accept`, in milliseconds; `0` waits forever
    pub accept_timeout_ms: u64,
    /// How long shutdown waits for in-flight exchanges to drain, in milliseconds
    pub shutdown_drain_timeout_ms: u64,
}

/// Limits and capacity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of the queue of a pull-style component
    pub component_queue_capacity: usize,
}

/// Routing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// How one endpoint is chosen when several match
    pub strategy: RoutingStrategy,
}

/// Exchange store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,
    /// Directory for file and clustered stores; empty means `<data_directory>/stores`
    pub directory: String,
    /// Node identity used to prefix generated ids in clustered stores
    pub node_id: String,
    /// Name of the store holding in-flight exchanges
    pub name: String,
}

/// Tracing and logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

/// Path configuration for various directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for log files
    pub log_directory: String,
    /// Directory for data files
    pub data_directory: String,
}

/// Behavioral configuration switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Enable file logging at launch
    pub enable_tracing: bool,
    /// Persist every exchange, not only those flagged persistent
    pub persist_exchanges: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sync_send_timeout_ms: 30_000,
            accept_timeout_ms: 0,
            shutdown_drain_timeout_ms: 10_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            component_queue_capacity: 256,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            directory: String::new(),
            node_id: "node".to_string(),
            name: "exchanges".to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX).ok();
        let data_home = xdg_dirs
            .as_ref()
            .map_or_else(|| PathBuf::from(".switchyard"), xdg::BaseDirectories::get_data_home);
        Self {
            log_directory: data_home.join("logs").to_string_lossy().into_owned(),
            data_directory: data_home.to_string_lossy().into_owned(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enable_tracing: true,
            persist_exchanges: false,
        }
    }
}

impl SwitchyardConfig {
    /// Timeout for synchronous sends.
    pub const fn sync_send_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.sync_send_timeout_ms)
    }

    /// Default `accept` timeout; `None` waits forever.
    pub const fn accept_timeout(&self) -> Option<Duration> {
        match self.timeouts.accept_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Time shutdown allows in-flight exchanges to finish.
    pub const fn shutdown_drain_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.shutdown_drain_timeout_ms)
    }

    /// Directory for file-backed stores.
    pub fn store_directory(&self) -> PathBuf {
        if self.store.directory.is_empty() {
            PathBuf::from(&self.paths.data_directory).join("stores")
        } else {
            PathBuf::from(&self.store.directory)
        }
    }

    /// Parses configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `switchyard/config.toml` under `$XDG_CONFIG_HOME` and then each entry
    /// of `$XDG_CONFIG_DIRS`.
    ///
    /// If no configuration file is found, returns the default configuration.
    /// If a configuration file exists but is malformed, logs an error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix(APP_PREFIX) {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: SwitchyardConfig = SwitchyardConfig::load();
}
