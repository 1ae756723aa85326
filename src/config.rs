use std::env;
use std::time::Duration;

use crate::mqtt::MqttSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }

    /// Staged and production deployments log JSON for the log collector.
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Stage | Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // MQTT broker
    pub mqtt_broker_host: String,
    pub mqtt_broker_port: u16,
    pub mqtt_client_id_prefix: String,
    pub mqtt_connect_timeout_seconds: u64,
    pub mqtt_keep_alive_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_broker_host: "broker.hivemq.com".to_string(),
            mqtt_broker_port: 1883,
            mqtt_client_id_prefix: "sensor_config_api".to_string(),
            mqtt_connect_timeout_seconds: 15,
            mqtt_keep_alive_seconds: 30,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            disable_rate_limiting: false,
            rate_limit_per_second: 1,
            rate_limit_burst: 30,
            deployment: Deployment::Local,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting is optional; unset or unparseable values keep their default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a setting parses but cannot be used,
    /// see [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            // MQTT broker
            mqtt_broker_host: env::var("MQTT_BROKER_HOST").unwrap_or(defaults.mqtt_broker_host),
            mqtt_broker_port: parse_var("MQTT_BROKER_PORT", defaults.mqtt_broker_port),
            mqtt_client_id_prefix: env::var("MQTT_CLIENT_ID_PREFIX")
                .unwrap_or(defaults.mqtt_client_id_prefix),
            mqtt_connect_timeout_seconds: parse_var(
                "MQTT_CONNECT_TIMEOUT_SECONDS",
                defaults.mqtt_connect_timeout_seconds,
            ),
            mqtt_keep_alive_seconds: parse_var(
                "MQTT_KEEP_ALIVE_SECONDS",
                defaults.mqtt_keep_alive_seconds,
            ),

            // API settings
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_var("API_PORT", defaults.api_port),

            // Rate limiting
            disable_rate_limiting: parse_var(
                "DISABLE_RATE_LIMITING",
                defaults.disable_rate_limiting,
            ),
            rate_limit_per_second: parse_var(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            ),
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", defaults.rate_limit_burst),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would fail at runtime rather than at startup.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the variable for an empty broker host, a zero
    /// connect timeout, or a zero rate limit period or burst while rate limiting is on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt_broker_host.trim().is_empty() {
            return Err(ConfigError::Invalid("MQTT_BROKER_HOST"));
        }
        if self.mqtt_connect_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("MQTT_CONNECT_TIMEOUT_SECONDS"));
        }
        if !self.disable_rate_limiting {
            if self.rate_limit_per_second == 0 {
                return Err(ConfigError::Invalid("RATE_LIMIT_PER_SECOND"));
            }
            if self.rate_limit_burst == 0 {
                return Err(ConfigError::Invalid("RATE_LIMIT_BURST"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Broker settings handed to the MQTT publisher.
    #[must_use]
    pub fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.mqtt_broker_host.clone(),
            port: self.mqtt_broker_port,
            client_id_prefix: self.mqtt_client_id_prefix.clone(),
            connect_timeout: Duration::from_secs(self.mqtt_connect_timeout_seconds),
            keep_alive: Duration::from_secs(self.mqtt_keep_alive_seconds),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
