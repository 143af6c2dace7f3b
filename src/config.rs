//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{FloodgateError, Result};

/// Main configuration for the Floodgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Deployment environment name, reported by the health check
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            environment: default_environment(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:4000".parse().unwrap()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Rate limiting configuration.
///
/// `requests_per_second` and `burst` seed every new client bucket; they are
/// global and identical for all clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Master on/off switch for rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Tokens replenished per second for each client bucket
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Maximum burst size (bucket capacity) for each client bucket
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Inactivity threshold in seconds before a client entry is reclaimed
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Period in seconds between reclaimer sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            stale_after_secs: default_stale_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_requests_per_second() -> f64 {
    2.0
}

fn default_burst() -> u32 {
    4
}

fn default_stale_after_secs() -> u64 {
    180
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl RateLimitSettings {
    /// Inactivity threshold as a [`Duration`].
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Sweep period as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl FloodgateConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Invalid limiter parameters are fatal at startup; they can never occur
    /// per-request.
    pub fn validate(&self) -> Result<()> {
        let rl = &self.rate_limiting;

        if !rl.requests_per_second.is_finite() || rl.requests_per_second <= 0.0 {
            return Err(FloodgateError::Config(format!(
                "requests_per_second must be a positive number, got {}",
                rl.requests_per_second
            )));
        }
        if rl.burst < 1 {
            return Err(FloodgateError::Config(
                "burst must be at least 1".to_string(),
            ));
        }
        if rl.stale_after_secs == 0 {
            return Err(FloodgateError::Config(
                "stale_after_secs must be greater than zero".to_string(),
            ));
        }
        if rl.sweep_interval_secs == 0 {
            return Err(FloodgateError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FloodgateConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.rate_limiting.enabled);
        assert_eq!(config.rate_limiting.burst, 4);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  listen_addr: "0.0.0.0:8080"
  environment: production
rate_limiting:
  enabled: false
  requests_per_second: 10.5
  burst: 20
  stale_after_secs: 300
  sweep_interval_secs: 30
"#;
        let config: FloodgateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.server.environment, "production");
        assert!(!config.rate_limiting.enabled);
        assert_eq!(config.rate_limiting.requests_per_second, 10.5);
        assert_eq!(config.rate_limiting.burst, 20);
        assert_eq!(
            config.rate_limiting.stale_after(),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
rate_limiting:
  burst: 8
"#;
        let config: FloodgateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rate_limiting.burst, 8);
        assert_eq!(config.rate_limiting.requests_per_second, 2.0);
        assert_eq!(config.server.listen_addr.port(), 4000);
    }

    #[test]
    fn test_validate_rejects_nonpositive_rate() {
        let mut config = FloodgateConfig::default();
        config.rate_limiting.requests_per_second = 0.0;
        assert!(config.validate().is_err());

        config.rate_limiting.requests_per_second = -1.0;
        assert!(config.validate().is_err());

        config.rate_limiting.requests_per_second = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let mut config = FloodgateConfig::default();
        config.rate_limiting.burst = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = FloodgateConfig::default();
        config.rate_limiting.stale_after_secs = 0;
        assert!(config.validate().is_err());

        let mut config = FloodgateConfig::default();
        config.rate_limiting.sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
