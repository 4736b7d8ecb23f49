use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

/// Commercial knobs injected into the order services. Never hard-coded so
/// tests can run several commission regimes side by side.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold_cents: i64,
    pub shipping_fee_cents: i64,
    pub platform_commission_percent: f64,
    /// When true, payments referencing a missing supplier fail instead of
    /// falling back to the system supplier.
    #[serde(default)]
    pub strict_supplier_resolution: bool,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables with a prefix of VENDRA
            // Eg. `VENDRA__SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("VENDRA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
