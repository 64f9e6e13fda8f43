//! Service Configuration
//!
//! Operational settings loaded from TOML, replacing hardcoded paths and
//! bounds with operator-tunable values. Decision thresholds are *not*
//! configuration - they are part of the trained model contract and live as
//! constants next to the code that applies them.
//!
//! ## Loading Order
//!
//! 1. `FLEET_SENTINEL_CONFIG` environment variable (path to TOML file)
//! 2. `fleet_sentinel.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Global service configuration, initialized once at startup.
static CONFIG: OnceLock<SentinelConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Repeated calls are ignored with a warning so tests that share a process
/// can each attempt initialization safely.
pub fn init(config: SentinelConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once - ignoring");
    }
}

/// Get a reference to the global configuration, falling back to defaults
/// when `init()` has not run (unit tests).
pub fn get() -> &'static SentinelConfig {
    CONFIG.get_or_init(SentinelConfig::default)
}

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
    pub hub: HubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the sled record store
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the three pretrained artifacts
    pub dir: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: "./models".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Admission bound on concurrent ingest calls
    pub max_concurrent_ingests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_ingests: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Per-observer broadcast channel capacity
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

impl SentinelConfig {
    /// Load configuration using the documented precedence. A present but
    /// unparseable file is a startup warning, not a fatal error - the
    /// service falls back to defaults rather than refusing to monitor.
    pub fn load() -> Self {
        let path = std::env::var("FLEET_SENTINEL_CONFIG")
            .unwrap_or_else(|_| "fleet_sentinel.toml".to_string());

        match std::fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    tracing::info!(path = %path, "Configuration loaded");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Invalid config file - using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path, "No config file found - using defaults");
                Self::default()
            }
        }
    }
}
