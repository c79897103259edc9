//! Server configuration

use fraudwatch_runtime::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Time-to-live for cached responses, in seconds
    pub ttl_secs: u64,
    /// Key prefix for every cache entry
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 60,
            key_prefix: "fraudwatch".to_string(),
        }
    }
}

/// Rate limiting settings (fixed window, shared with the cache store)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: 100,
            window_secs: 60,
        }
    }
}

/// WebSocket hub settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WsSettings {
    /// Heartbeat interval in seconds; a client that misses one full interval
    /// is terminated
    pub heartbeat_secs: u64,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self { heartbeat_secs: 30 }
    }
}

/// Message-bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub transactions_topic: String,
    pub alerts_topic: String,
    /// NATS server URL; without it (or without the `nats` feature) topic
    /// publication is a logged no-op and no consumer is started
    pub nats_url: Option<String>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            transactions_topic: "fraud-transactions".to_string(),
            alerts_topic: "fraud-alerts".to_string(),
            nats_url: None,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// PostgreSQL URL for persistence; in-memory stores are used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// YAML rule file or directory seeded into the rule store at startup
    #[serde(default)]
    pub rules_path: Option<PathBuf>,

    /// Source identifier stamped on published bus envelopes
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub ws: WsSettings,

    #[serde(default)]
    pub bus: BusSettings,

    /// Log level
    pub log_level: String,
}

fn default_source() -> String {
    "fraudwatch-server".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            rules_path: None,
            source: default_source(),
            scoring: ScoringConfig::default(),
            cache: CacheSettings::default(),
            rate_limit: RateLimitSettings::default(),
            ws: WsSettings::default(),
            bus: BusSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("FRAUDWATCH").separator("__"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(_) => {
                tracing::info!("No config file found, using default configuration");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert!(config.rules_path.is_none());
        assert_eq!(config.source, "fraudwatch-server");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cache_settings_default() {
        let cache = CacheSettings::default();
        assert!(cache.enabled);
        assert_eq!(cache.ttl_secs, 60);
        assert_eq!(cache.key_prefix, "fraudwatch");
    }

    #[test]
    fn test_rate_limit_disabled_by_default() {
        let rl = RateLimitSettings::default();
        assert!(!rl.enabled);
        assert_eq!(rl.max_requests, 100);
        assert_eq!(rl.window_secs, 60);
    }

    #[test]
    fn test_ws_heartbeat_default() {
        assert_eq!(WsSettings::default().heartbeat_secs, 30);
    }

    #[test]
    fn test_bus_settings_default_topics() {
        let bus = BusSettings::default();
        assert_eq!(bus.transactions_topic, "fraud-transactions");
        assert_eq!(bus.alerts_topic, "fraud-alerts");
        assert!(bus.nats_url.is_none());
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: ServerConfig = serde_json::from_str(
            r#"{ "host": "0.0.0.0", "port": 9000, "log_level": "debug" }"#,
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert!(config.cache.enabled);
        assert_eq!(config.ws.heartbeat_secs, 30);
    }
}
