//! Error types for the resolution pipeline.
//!
//! `Failure` is the only error a caller of the pipeline ever sees.
//! `ProviderError` describes one failed upstream call and is converted into
//! a `Failure` (or swallowed) at the resolver/fetcher boundary.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage that talks to an upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Current,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Forecast => write!(f, "forecast"),
        }
    }
}

/// What a collaborator layer should try next after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackHint {
    /// Ask the user for a location again.
    FixInput,
    /// Nothing will work until an API key is configured.
    ConfigureApiKey,
    /// Re-run with coordinates from the device (browser geolocation, GPS).
    RetryWithDeviceLocation,
    /// Transient upstream problem.
    RetryLater,
}

/// Structured pipeline failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    #[error("no location given: provide a place name or both coordinates")]
    InputInvalid,

    #[error("weather API key is not configured")]
    ApiKeyMissing,

    #[error("location not found: '{raw_query}'")]
    LocationNotFound { raw_query: String },

    #[error("upstream weather service unavailable at stage '{stage}'")]
    UpstreamUnavailable { stage: Stage },
}

impl Failure {
    pub fn location_not_found(raw_query: impl Into<String>) -> Self {
        Self::LocationNotFound {
            raw_query: raw_query.into(),
        }
    }

    pub fn upstream(stage: Stage) -> Self {
        Self::UpstreamUnavailable { stage }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputInvalid => "input_invalid",
            Self::ApiKeyMissing => "api_key_missing",
            Self::LocationNotFound { .. } => "location_not_found",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    pub fn fallback_hint(&self) -> FallbackHint {
        match self {
            Self::InputInvalid => FallbackHint::FixInput,
            Self::ApiKeyMissing => FallbackHint::ConfigureApiKey,
            Self::LocationNotFound { .. } => FallbackHint::RetryWithDeviceLocation,
            Self::UpstreamUnavailable { .. } => FallbackHint::RetryLater,
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InputInvalid => "Please enter a city name.".to_string(),
            Self::ApiKeyMissing => {
                "API key not configured. Set SKYCAST_API_KEY or weather.api_key.".to_string()
            }
            Self::LocationNotFound { raw_query } => {
                format!("City '{raw_query}' not found. Try your current location instead.")
            }
            Self::UpstreamUnavailable { .. } => {
                "Weather data unavailable for this location.".to_string()
            }
        }
    }
}

/// Failure of a single upstream HTTP call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for ProviderError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Network(t.to_string()),
        }
    }
}

impl From<std::io::Error> for ProviderError {
    // ureq surfaces body decode failures as io::Error
    fn from(err: std::io::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
