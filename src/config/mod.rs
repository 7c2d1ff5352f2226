//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Display name shown next to the ship
    pub name: String,
    /// Hub relay websocket URL, e.g. ws://localhost:7927
    pub relay_url: String,
    /// Relay room to join (peers in the same room see each other)
    pub relay_room: String,
    /// Attempt direct UDP channels to peers, falling back to the relay
    pub direct_enabled: bool,
    /// Local bind address for direct channels
    pub direct_bind_addr: SocketAddr,
    /// Start parked in hyperspace, never respawning
    pub observe_only: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load client configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let direct_bind_addr = env::var("DIRECT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:0".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddress("DIRECT_BIND_ADDR"))?;

        Ok(Self {
            name: env::var("GRAVWELL_NAME").unwrap_or_default(),
            relay_url: env::var("RELAY_URL")
                .unwrap_or_else(|_| "ws://localhost:7927".to_string()),
            relay_room: env::var("RELAY_ROOM").unwrap_or_else(|_| "default".to_string()),
            direct_enabled: env_flag("DIRECT_ENABLED", true),
            direct_bind_addr,
            observe_only: env_flag("OBSERVE_ONLY", false),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Relay server configuration
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl RelayConfig {
    /// Load relay configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:7927".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress("SERVER_ADDR"))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid address in {0}")]
    InvalidAddress(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_parses_common_spellings() {
        env::set_var("GRAVWELL_TEST_FLAG", "true");
        assert!(env_flag("GRAVWELL_TEST_FLAG", false));
        env::set_var("GRAVWELL_TEST_FLAG", "0");
        assert!(!env_flag("GRAVWELL_TEST_FLAG", true));
        env::remove_var("GRAVWELL_TEST_FLAG");
        assert!(env_flag("GRAVWELL_TEST_FLAG", true));
    }
}
