use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

/// Where tours and bookings live. `memory` is for local runs and tests.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Child price as a percentage of the adult price when a tour has none.
    #[serde(default = "default_child_rate_percent")]
    pub child_rate_percent: i64,
    /// Attempts for a compensating seat release before it is declared fatal.
    #[serde(default = "default_release_retry_attempts")]
    pub release_retry_attempts: usize,
    #[serde(default = "default_release_retry_delay_ms")]
    pub release_retry_delay_ms: u64,
}

fn default_child_rate_percent() -> i64 { 70 }
fn default_release_retry_attempts() -> usize { 3 }
fn default_release_retry_delay_ms() -> u64 { 50 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            child_rate_percent: default_child_rate_percent(),
            release_retry_attempts: default_release_retry_attempts(),
            release_retry_delay_ms: default_release_retry_delay_ms(),
        }
    }
}

impl BusinessRules {
    pub fn release_retry_delay(&self) -> Duration {
        Duration::from_millis(self.release_retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    /// Topic prefix; the event kind is appended.
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_topic() -> String { "voyage.bookings".into() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `VOYAGE__SERVER__PORT=9000` sets `server.port`
            .add_source(config::Environment::with_prefix("VOYAGE").prefix_separator("__").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()
    }

    /// Parse a single TOML document, without files or environment.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()
    }

    fn validate(self) -> Result<Self, config::ConfigError> {
        let rate = self.business_rules.child_rate_percent;
        if !(0..=100).contains(&rate) {
            return Err(config::ConfigError::Message(format!(
                "business_rules.child_rate_percent must be between 0 and 100, got {}",
                rate
            )));
        }
        Ok(self)
    }
}
