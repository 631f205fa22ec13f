//! Configuration management for the Tripwise application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings. Provider
//! credentials are resolved here once and injected into the planner, so
//! no provider call ever reads the process environment.

use crate::TripwiseError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the Tripwise application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripwiseConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Routing and geocoding provider (GraphHopper)
    pub routing: RoutingConfig,
    /// Flight search provider (Amadeus)
    pub flights: FlightsConfig,
    /// Narrative generator (OpenAI-compatible chat completions)
    pub narrative: NarrativeConfig,
    /// Settings shared by every provider call
    pub providers: ProvidersConfig,
    /// Plan persistence
    pub storage: StorageConfig,
    /// Lookup table overrides
    pub data: DataConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the built frontend
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// GraphHopper API key, shared by routing and geocoding
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
    /// Upper bound on offers requested per search
    pub max_offers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Completions take longer than lookups, so they get their own timeout
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Per-call timeout in seconds
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `fjall` (on disk) or `memory`
    pub backend: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON file replacing the embedded city to airport table
    pub airports_file: Option<PathBuf>,
    /// JSON file replacing the embedded visa rules
    pub visa_rules_file: Option<PathBuf>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend/dist".to_string()
}

fn default_routing_base_url() -> String {
    "https://graphhopper.com/api/1".to_string()
}

fn default_flights_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_max_offers() -> u32 {
    5
}

fn default_narrative_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_narrative_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    700
}

fn default_temperature() -> f32 {
    0.7
}

fn default_narrative_timeout() -> u32 {
    30
}

fn default_provider_timeout() -> u32 {
    8
}

fn default_storage_backend() -> String {
    "fjall".to_string()
}

fn default_storage_path() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("tripwise").join("plans"))
        .unwrap_or_else(|| PathBuf::from("tripwise-data"))
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_routing_base_url(),
        }
    }
}

impl Default for FlightsConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: default_flights_base_url(),
            max_offers: default_max_offers(),
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_narrative_base_url(),
            model: default_narrative_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_narrative_timeout(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_provider_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Conventional secret variables accepted besides the `TRIPWISE__` ones
const SECRET_VARS: [&str; 5] = [
    "GRAPHHOPPER_API_KEY",
    "AMADEUS_CLIENT_ID",
    "AMADEUS_CLIENT_SECRET",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
];

impl TripwiseConfig {
    /// Load configuration from `config_path` (or the default location) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPWISE_ROUTING__API_KEY style overrides
        builder = builder.add_source(
            Environment::with_prefix("TRIPWISE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripwiseConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        let secrets = SECRET_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value)));
        config.apply_secrets(secrets);
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripwise").join("config.toml"))
    }

    /// Fill credentials from conventional variable names when the config left them unset
    pub fn apply_secrets<'a>(&mut self, vars: impl IntoIterator<Item = (&'a str, String)>) {
        for (name, value) in vars {
            if value.trim().is_empty() {
                continue;
            }
            match name {
                "GRAPHHOPPER_API_KEY" => {
                    self.routing.api_key.get_or_insert(value);
                }
                "AMADEUS_CLIENT_ID" => {
                    self.flights.client_id.get_or_insert(value);
                }
                "AMADEUS_CLIENT_SECRET" => {
                    self.flights.client_secret.get_or_insert(value);
                }
                "OPENAI_API_KEY" => {
                    self.narrative.api_key.get_or_insert(value);
                }
                "OPENAI_BASE_URL" => {
                    if self.narrative.base_url == default_narrative_base_url() {
                        self.narrative.base_url = value;
                    }
                }
                _ => {}
            }
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.routing.base_url.is_empty() {
            self.routing.base_url = default_routing_base_url();
        }
        if self.flights.base_url.is_empty() {
            self.flights.base_url = default_flights_base_url();
        }
        if self.flights.max_offers == 0 {
            self.flights.max_offers = default_max_offers();
        }
        if self.narrative.base_url.is_empty() {
            self.narrative.base_url = default_narrative_base_url();
        }
        if self.narrative.model.is_empty() {
            self.narrative.model = default_narrative_model();
        }
        if self.narrative.max_tokens == 0 {
            self.narrative.max_tokens = default_max_tokens();
        }
        if self.narrative.timeout_seconds == 0 {
            self.narrative.timeout_seconds = default_narrative_timeout();
        }
        if self.providers.timeout_seconds == 0 {
            self.providers.timeout_seconds = default_provider_timeout();
        }
        if self.storage.backend.is_empty() {
            self.storage.backend = default_storage_backend();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        // Blank secrets count as unset
        for secret in [
            &mut self.routing.api_key,
            &mut self.flights.client_id,
            &mut self.flights.client_secret,
            &mut self.narrative.api_key,
        ] {
            if secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *secret = None;
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.providers.timeout_seconds > 60 {
            return Err(
                TripwiseError::config("Provider timeout cannot exceed 60 seconds").into(),
            );
        }

        if self.narrative.timeout_seconds > 120 {
            return Err(
                TripwiseError::config("Narrative timeout cannot exceed 120 seconds").into(),
            );
        }

        if self.flights.max_offers > 50 {
            return Err(TripwiseError::config("Flight max offers cannot exceed 50").into());
        }

        if self.narrative.max_tokens > 4000 {
            return Err(
                TripwiseError::config("Narrative max tokens cannot exceed 4000").into(),
            );
        }

        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(TripwiseError::config(
                "Narrative temperature must be between 0.0 and 2.0",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripwiseError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripwiseError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_backends = ["fjall", "memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(TripwiseError::config(format!(
                "Invalid storage backend '{}'. Must be one of: {}",
                self.storage.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Routing", &self.routing.base_url),
            ("Flights", &self.flights.base_url),
            ("Narrative", &self.narrative.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripwiseError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
