//! Configuration management for QuoteWatch
//!
//! Loads from YAML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::polling::SHORT_DELAY;
use crate::types::LocationFilter;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub refresh: RefreshConfig,
    pub locations: LocationsConfig,
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Time between two price fetches in milliseconds
    pub interval_ms: u64,
    /// Start with auto-update enabled (false starts the watch paused)
    pub auto_update: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationsConfig {
    pub cities: bool,
    pub villages: bool,
    pub black_zone_outposts: bool,
}

impl LocationsConfig {
    pub fn filter(&self) -> LocationFilter {
        LocationFilter {
            cities: self.cities,
            villages: self.villages,
            black_zone_outposts: self.black_zone_outposts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Price endpoint base (item name and ".json" are appended)
    pub prices_url: String,
    /// Item metadata endpoint base
    pub items_url: String,
    /// HTTP timeout in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Culture code used for item names ("EN-US", "DE-DE", ...)
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let builder = Self::with_defaults(Config::builder())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (QUOTEWATCH__REFRESH__INTERVAL_MS, ...)
            .add_source(
                Environment::with_prefix("QUOTEWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            // Refresh defaults
            .set_default("refresh.interval_ms", 10_000)?
            .set_default("refresh.auto_update", true)?
            // Location defaults
            .set_default("locations.cities", true)?
            .set_default("locations.villages", false)?
            .set_default("locations.black_zone_outposts", false)?
            // API defaults
            .set_default(
                "api.prices_url",
                "https://www.albion-online-data.com/api/v2/stats/prices",
            )?
            .set_default(
                "api.items_url",
                "https://gameinfo.albiononline.com/api/gameinfo/items",
            )?
            .set_default("api.timeout_ms", 15_000)?
            // Display defaults
            .set_default("display.language", "EN-US")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder.build().context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the polling loop cannot honor
    pub fn validate(&self) -> Result<()> {
        let min_interval = SHORT_DELAY.as_millis() as u64;
        if self.refresh.interval_ms <= min_interval {
            bail!(
                "refresh.interval_ms must be greater than {} (got {})",
                min_interval,
                self.refresh.interval_ms
            );
        }
        if self.api.timeout_ms == 0 {
            bail!("api.timeout_ms must be greater than 0");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "interval_ms={} auto_update={} cities={} villages={} outposts={} language={}",
            self.refresh.interval_ms,
            self.refresh.auto_update,
            self.locations.cities,
            self.locations.villages,
            self.locations.black_zone_outposts,
            self.display.language
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
