//! Configuration for Skycast.
//!
//! Loaded from TOML; every field has a default so an empty (or missing)
//! file is valid. The API key may come from `SKYCAST_API_KEY` or
//! `WEATHER_API_KEY` instead of the file.

use crate::error::ConfigError;
use crate::location::normalizer::{RegionRule, SubdivisionRule};
use crate::location::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "SKYCAST_API_KEY";
/// Older deployments used this name.
pub const LEGACY_API_KEY_ENV: &str = "WEATHER_API_KEY";

const MAX_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkycastConfig {
    pub weather: WeatherConfig,
    pub geocoding: GeocodingConfig,
    pub normalizer: NormalizerConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// IANA zone whose calendar decides which day is "today".
    pub timezone: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            timeout_secs: 10,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub openweathermap_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub forward_chain: Vec<String>,
    pub reverse_chain: Vec<String>,
    pub placeholder_name: String,
    /// Search-term rewrites, matched case-insensitively.
    pub aliases: BTreeMap<String, String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            openweathermap_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("skycast/{}", crate::VERSION),
            timeout_secs: 5,
            forward_chain: vec!["openweathermap".to_string()],
            reverse_chain: vec!["nominatim".to_string(), "openweathermap".to_string()],
            placeholder_name: crate::location::resolver::DEFAULT_PLACEHOLDER_NAME.to_string(),
            aliases: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub subdivisions: Vec<SubdivisionRule>,
    pub regions: Vec<RegionRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// error, warn, info, debug, trace
    pub level: String,
    /// pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl SkycastConfig {
    /// Load from `path`, or from the default location if it exists, then
    /// apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// `~/.config/skycast/config.toml` (platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skycast").join("config.toml"))
    }

    /// Environment wins over the file. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(API_KEY_ENV)
            .or_else(|| lookup(LEGACY_API_KEY_ENV))
            .filter(|k| !k.trim().is_empty());
        if key.is_some() {
            self.weather.api_key = key;
        }
    }

    /// The configured key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.weather
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_chains()?;
        self.validate_network()?;
        self.validate_normalizer()?;
        self.validate_logging()?;
        Ok(())
    }

    fn validate_chains(&self) -> Result<(), ConfigError> {
        if self.geocoding.forward_chain.is_empty() {
            return Err(ConfigError::invalid(
                "geocoding.forward_chain needs at least one provider",
            ));
        }
        for name in self
            .geocoding
            .forward_chain
            .iter()
            .chain(&self.geocoding.reverse_chain)
        {
            name.parse::<ProviderKind>()?;
        }
        Ok(())
    }

    fn validate_network(&self) -> Result<(), ConfigError> {
        for (label, secs) in [
            ("weather.timeout_secs", self.weather.timeout_secs),
            ("geocoding.timeout_secs", self.geocoding.timeout_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                return Err(ConfigError::invalid(format!(
                    "{} must be between 1 and {} seconds",
                    label, MAX_TIMEOUT_SECS
                )));
            }
        }

        for (label, url) in [
            ("weather.base_url", &self.weather.base_url),
            ("geocoding.openweathermap_url", &self.geocoding.openweathermap_url),
            ("geocoding.nominatim_url", &self.geocoding.nominatim_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::invalid(format!(
                    "{} must be an HTTP or HTTPS URL",
                    label
                )));
            }
        }

        self.timezone()?;
        Ok(())
    }

    fn validate_normalizer(&self) -> Result<(), ConfigError> {
        for region in &self.normalizer.regions {
            if region.canonical.trim().is_empty() {
                return Err(ConfigError::invalid("normalizer region without canonical name"));
            }
            if !region.bounds.is_well_formed() {
                return Err(ConfigError::invalid(format!(
                    "bounding box for '{}' is inverted or not finite",
                    region.canonical
                )));
            }
        }
        for sub in &self.normalizer.subdivisions {
            if sub.parent.trim().is_empty() {
                return Err(ConfigError::invalid("normalizer subdivision without parent"));
            }
        }
        Ok(())
    }

    fn validate_logging(&self) -> Result<(), ConfigError> {
        let levels = ["error", "warn", "info", "debug", "trace"];
        if !levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid(format!(
                "invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                levels.join(", ")
            )));
        }
        let formats = ["pretty", "json"];
        if !formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid(format!(
                "invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                formats.join(", ")
            )));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.weather.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            ConfigError::invalid(format!(
                "unknown timezone '{}'. Use IANA format (e.g. Africa/Addis_Ababa).",
                self.weather.timezone
            ))
        })
    }
}
