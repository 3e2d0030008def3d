//! Configuration management for the wallet bridge.
//!
//! Centralized configuration with defaults, TOML file loading, environment
//! variable overrides, and validation.

use crate::errors::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level bridge configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub rounds: RoundConfig,
}

/// Provider integration settings: the agent credentials every callback is
/// validated against, and the base URL games are launched from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub agent_id: String,
    pub secret_key: String,
    pub currency: String,
    pub launch_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            agent_id: "agent-demo".to_string(),
            secret_key: String::new(),
            currency: "USD".to_string(),
            launch_base_url: "https://games.provider.example".to_string(),
        }
    }
}

/// HTTP API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Session lifecycle thresholds and sweep cadences.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Provider session inactivity expiry.
    pub expiry_hours: i64,
    /// How often the provider-session expiry sweep runs.
    pub expiry_sweep_secs: u64,
    /// Game session heartbeat timeout.
    pub heartbeat_timeout_secs: i64,
    /// How often the heartbeat sweep runs.
    pub heartbeat_sweep_secs: u64,
    /// How often the durable cleanup sweep runs.
    pub durable_cleanup_secs: u64,
    /// Minimum gap between durable write-throughs of activity updates.
    pub activity_flush_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_hours: 24,
            expiry_sweep_secs: 3_600,
            heartbeat_timeout_secs: 300,
            heartbeat_sweep_secs: 30,
            durable_cleanup_secs: 300,
            activity_flush_secs: 60,
        }
    }
}

/// Round staleness and retention thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Open rounds older than this become recovery candidates.
    pub stale_after_mins: i64,
    /// Rounds older than this are purged.
    pub retention_days: i64,
    /// How often the round retention sweep runs.
    pub cleanup_sweep_secs: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            stale_after_mins: 30,
            retention_days: 90,
            cleanup_sweep_secs: 3_600,
        }
    }
}

/// Configuration loader with environment variable support.
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path.
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables.
    pub fn load(&self) -> BridgeResult<BridgeConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            BridgeConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> BridgeResult<BridgeConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| BridgeError::Config(format!("failed to parse TOML: {}", e)))
    }

    fn apply_env_overrides(&self, config: &mut BridgeConfig) -> BridgeResult<()> {
        if let Ok(agent_id) = env::var("WALLET_AGENT_ID") {
            config.provider.agent_id = agent_id;
        }
        if let Ok(secret) = env::var("WALLET_SECRET_KEY") {
            config.provider.secret_key = secret;
        }
        if let Ok(currency) = env::var("WALLET_CURRENCY") {
            config.provider.currency = currency;
        }
        if let Ok(base_url) = env::var("WALLET_LAUNCH_BASE_URL") {
            config.provider.launch_base_url = base_url;
        }
        if let Ok(host) = env::var("WALLET_API_HOST") {
            config.api.host = host;
        }
        if let Ok(port) = env::var("WALLET_API_PORT") {
            config.api.port = port
                .parse()
                .map_err(|_| BridgeError::Config(format!("invalid WALLET_API_PORT: {}", port)))?;
        }
        Ok(())
    }

    fn validate(&self, config: &BridgeConfig) -> BridgeResult<()> {
        if config.provider.agent_id.is_empty() {
            return Err(BridgeError::Config("provider.agent_id must not be empty".into()));
        }
        if config.provider.secret_key.is_empty() {
            return Err(BridgeError::Config("provider.secret_key must not be empty".into()));
        }
        if config.api.port == 0 {
            return Err(BridgeError::Config("api.port must not be 0".into()));
        }
        if config.sessions.expiry_hours <= 0
            || config.sessions.heartbeat_timeout_secs <= 0
            || config.sessions.activity_flush_secs <= 0
        {
            return Err(BridgeError::Config("session thresholds must be positive".into()));
        }
        if config.rounds.stale_after_mins <= 0 || config.rounds.retention_days <= 0 {
            return Err(BridgeError::Config("round thresholds must be positive".into()));
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
