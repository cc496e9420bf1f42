//! Geocoding providers: Nominatim (OpenStreetMap) and OpenWeatherMap Geo.
//!
//! Every provider answers a `GeocodeQuery` with at most one candidate.
//! Providers are blocking and bounded by the agent timeout.

use super::types::{GeocodeCandidate, GeocodeQuery, PlaceSource};
use crate::config::GeocodingConfig;
use crate::error::{ConfigError, ProviderError};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// One external geocoding service.
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the provider answered but knows no such place.
    fn lookup(&self, query: &GeocodeQuery) -> Result<Option<GeocodeCandidate>, ProviderError>;
}

/// Provider names accepted in the configured chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Nominatim,
    OpenWeatherMap,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nominatim" | "osm" => Ok(Self::Nominatim),
            "openweathermap" | "owm" => Ok(Self::OpenWeatherMap),
            other => Err(ConfigError::invalid(format!(
                "unknown geocoding provider '{}'. Use 'nominatim' or 'openweathermap'.",
                other
            ))),
        }
    }
}

/// Build an ordered provider chain from configured names.
pub fn build_chain(
    names: &[String],
    cfg: &GeocodingConfig,
    api_key: &str,
) -> Result<Vec<Box<dyn GeocodeProvider>>, ConfigError> {
    let agent = http_agent(cfg.timeout_secs, &cfg.user_agent);
    names
        .iter()
        .map(|name| {
            let provider: Box<dyn GeocodeProvider> = match name.parse::<ProviderKind>()? {
                ProviderKind::Nominatim => {
                    Box::new(NominatimGeocoder::new(agent.clone(), &cfg.nominatim_url))
                }
                ProviderKind::OpenWeatherMap => Box::new(OpenWeatherGeocoder::new(
                    agent.clone(),
                    &cfg.openweathermap_url,
                    api_key,
                )),
            };
            Ok(provider)
        })
        .collect()
}

pub(crate) fn http_agent(timeout_secs: u64, user_agent: &str) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
}

// ─── Nominatim ──────────────────────────────────────────────────

#[derive(Deserialize, Debug, Default)]
struct NominatimAddress {
    village: Option<String>,
    hamlet: Option<String>,
    town: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country_code: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NominatimPlace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
}

/// OpenStreetMap Nominatim. Reverse lookups use `/reverse`, forward `/search`.
pub struct NominatimGeocoder {
    agent: ureq::Agent,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(agent: ureq::Agent, base_url: &str) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    fn lookup(&self, query: &GeocodeQuery) -> Result<Option<GeocodeCandidate>, ProviderError> {
        match query {
            GeocodeQuery::Reverse { lat, lon } => {
                let place: NominatimPlace = self
                    .agent
                    .get(&format!("{}/reverse", self.base_url))
                    .query("format", "json")
                    .query("lat", &lat.to_string())
                    .query("lon", &lon.to_string())
                    .query("addressdetails", "1")
                    .query("accept-language", "en")
                    .call()?
                    .into_json()?;
                Ok(nominatim_candidate(place, Some((*lat, *lon))))
            }
            GeocodeQuery::Forward(term) => {
                let places: Vec<NominatimPlace> = self
                    .agent
                    .get(&format!("{}/search", self.base_url))
                    .query("q", term)
                    .query("format", "json")
                    .query("limit", "1")
                    .query("addressdetails", "1")
                    .query("accept-language", "en")
                    .call()?
                    .into_json()?;
                Ok(places
                    .into_iter()
                    .next()
                    .and_then(|p| nominatim_candidate(p, None)))
            }
        }
    }
}

/// Pick the most local name Nominatim reports: small settlements before cities.
fn nominatim_candidate(
    place: NominatimPlace,
    coords: Option<(f64, f64)>,
) -> Option<GeocodeCandidate> {
    let (lat, lon) = match coords {
        Some(c) => c,
        None => (
            place.lat.as_deref()?.parse::<f64>().ok()?,
            place.lon.as_deref()?.parse::<f64>().ok()?,
        ),
    };

    let addr = place.address.unwrap_or_default();
    let admin_area = addr.state.clone();
    let country = addr.country_code.as_ref().map(|cc| cc.to_uppercase());

    let name = addr
        .village
        .or(addr.hamlet)
        .or(addr.town)
        .or(addr.suburb)
        .or(addr.city)
        .or(addr.municipality)
        .or(place.name)
        .filter(|n| !n.trim().is_empty())?;

    Some(GeocodeCandidate {
        name,
        country,
        admin_area,
        lat,
        lon,
        source: PlaceSource::Nominatim,
    })
}

// ─── OpenWeatherMap Geo ─────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct OwmGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// OpenWeatherMap Geocoding API (`/direct` and `/reverse`, `limit=1`).
pub struct OpenWeatherGeocoder {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl OpenWeatherGeocoder {
    pub fn new(agent: ureq::Agent, base_url: &str, api_key: &str) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl GeocodeProvider for OpenWeatherGeocoder {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn lookup(&self, query: &GeocodeQuery) -> Result<Option<GeocodeCandidate>, ProviderError> {
        let request = match query {
            GeocodeQuery::Forward(term) => self
                .agent
                .get(&format!("{}/direct", self.base_url))
                .query("q", term)
                .query("lang", "en"),
            GeocodeQuery::Reverse { lat, lon } => self
                .agent
                .get(&format!("{}/reverse", self.base_url))
                .query("lat", &lat.to_string())
                .query("lon", &lon.to_string()),
        };

        let entries: Vec<OwmGeoEntry> = request
            .query("limit", "1")
            .query("appid", &self.api_key)
            .call()?
            .into_json()?;

        Ok(owm_candidate(entries))
    }
}

fn owm_candidate(entries: Vec<OwmGeoEntry>) -> Option<GeocodeCandidate> {
    let first = entries.into_iter().next()?;
    if first.name.trim().is_empty() {
        return None;
    }
    Some(GeocodeCandidate {
        name: first.name,
        country: first.country,
        admin_area: first.state,
        lat: first.lat,
        lon: first.lon,
        source: PlaceSource::OpenWeatherMap,
    })
}
