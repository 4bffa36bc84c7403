//! Configuration for the store connection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::store::DEFAULT_RANGES_KEY;

/// Connection settings for the Redis backing store.
///
/// Every knob passes through to the driver; the engine adds nothing of its
/// own beyond the ordered-map key name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// host:port of the Redis server
    pub addr: String,

    /// ACL username, empty for none
    pub username: String,

    /// Password, empty for none
    pub password: String,

    /// Database index selected after connecting
    pub db: i64,

    /// Negotiate TLS on the connection
    pub tls: bool,

    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Per-command response timeout in milliseconds
    pub response_timeout_ms: u64,

    /// Command retries before giving up
    pub retries: usize,

    /// Name of the ordered-map key holding the boundary scores. The default
    /// matches existing deployments; change it only for a fresh database.
    pub ranges_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            username: String::new(),
            password: String::new(),
            db: 0,
            tls: false,
            connect_timeout_ms: 5_000,
            response_timeout_ms: 3_000,
            retries: 3,
            ranges_key: DEFAULT_RANGES_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Split `addr` into host and port, defaulting the port to 6379.
    pub(crate) fn host_port(&self) -> (String, u16) {
        match self.addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().unwrap_or(6379);
                (host.to_string(), port)
            }
            None => (self.addr.clone(), 6379),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.addr, "127.0.0.1:6379");
        assert_eq!(config.db, 0);
        assert!(!config.tls);
        assert_eq!(config.ranges_key, DEFAULT_RANGES_KEY);
    }

    #[test]
    fn test_host_port_split() {
        let mut config = Config::default();
        assert_eq!(config.host_port(), ("127.0.0.1".to_string(), 6379));

        config.addr = "redis.internal:6380".to_string();
        assert_eq!(config.host_port(), ("redis.internal".to_string(), 6380));

        config.addr = "redis.internal".to_string();
        assert_eq!(config.host_port(), ("redis.internal".to_string(), 6379));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = Config::default();
        config.addr = "10.0.0.5:7000".to_string();
        config.ranges_key = "test_ranges".to_string();

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.addr, "10.0.0.5:7000");
        assert_eq!(parsed.ranges_key, "test_ranges");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("addr: example.com:6379\n").unwrap();
        assert_eq!(parsed.addr, "example.com:6379");
        assert_eq!(parsed.db, 0);
        assert_eq!(parsed.ranges_key, DEFAULT_RANGES_KEY);
    }
}
