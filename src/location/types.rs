//! Core types for the location subsystem.

use crate::error::Failure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user asked for: a free-text place name or a raw coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum LocationQuery {
    ByText { raw: String },
    ByCoordinates { lat: f64, lon: f64 },
}

impl LocationQuery {
    /// Text query; the input is trimmed and must not be empty.
    pub fn text(raw: &str) -> Result<Self, Failure> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Failure::InputInvalid);
        }
        Ok(Self::ByText {
            raw: raw.to_string(),
        })
    }

    /// Coordinate query; both values must be finite and on the globe.
    pub fn coordinates(lat: f64, lon: f64) -> Result<Self, Failure> {
        if !valid_coordinates(lat, lon) {
            return Err(Failure::InputInvalid);
        }
        Ok(Self::ByCoordinates { lat, lon })
    }

    /// Build a query from loosely-typed form fields.
    ///
    /// Coordinates win when both `lat` and `lon` are non-empty; otherwise the
    /// trimmed city text is used.
    pub fn from_form(
        city: Option<&str>,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Self, Failure> {
        let lat = lat.map(str::trim).filter(|s| !s.is_empty());
        let lon = lon.map(str::trim).filter(|s| !s.is_empty());

        if let (Some(lat), Some(lon)) = (lat, lon) {
            let lat: f64 = lat.parse().map_err(|_| Failure::InputInvalid)?;
            let lon: f64 = lon.parse().map_err(|_| Failure::InputInvalid)?;
            return Self::coordinates(lat, lon);
        }

        Self::text(city.unwrap_or(""))
    }

    /// Re-check the invariants (the variants are public and may be built directly).
    pub fn validate(&self) -> Result<(), Failure> {
        match self {
            Self::ByText { raw } if raw.trim().is_empty() => Err(Failure::InputInvalid),
            Self::ByCoordinates { lat, lon } if !valid_coordinates(*lat, *lon) => {
                Err(Failure::InputInvalid)
            }
            _ => Ok(()),
        }
    }
}

fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// A lookup sent to a single geocoding provider.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    Forward(String),
    Reverse { lat: f64, lon: f64 },
}

impl fmt::Display for GeocodeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward(term) => write!(f, "'{}'", term),
            Self::Reverse { lat, lon } => write!(f, "{:.4}, {:.4}", lat, lon),
        }
    }
}

/// Which service named a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceSource {
    Nominatim,
    OpenWeatherMap,
    /// No provider answered; the name is a placeholder.
    Placeholder,
}

impl fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominatim => write!(f, "Nominatim"),
            Self::OpenWeatherMap => write!(f, "OpenWeatherMap"),
            Self::Placeholder => write!(f, "Placeholder"),
        }
    }
}

/// A raw place as returned by one geocoding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub name: String,
    pub country: Option<String>,
    pub admin_area: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub source: PlaceSource,
}

/// The place a request resolved to, after name normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub display_name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Set when the resolved name is not an obvious match for the user's text.
    #[serde(default)]
    pub match_note: Option<String>,
    pub source: PlaceSource,
}

impl ResolvedPlace {
    pub fn display_line(&self) -> String {
        let country_part = match &self.country {
            Some(cc) => format!(", {}", cc),
            None => String::new(),
        };
        format!(
            "{}{} ({:.4}, {:.4})",
            self.display_name, country_part, self.lat, self.lon
        )
    }
}
