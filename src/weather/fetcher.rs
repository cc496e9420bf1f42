//! Weather retrieval from OpenWeatherMap.
//!
//! API: `{base}/weather` (current) and `{base}/forecast` (5 days, 3-hour steps),
//! both with `units=metric` so every value enters the crate in Celsius.

use super::types::{CurrentConditions, ForecastSample, WeatherReport};
use crate::error::{Failure, ProviderError, Stage};
use crate::location::providers::http_agent;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

const UNITS: &str = "metric";
const DEFAULT_VISIBILITY_KM: f64 = 10.0;

/// A weather service able to answer both endpoints for a coordinate pair.
pub trait WeatherSource: Send + Sync {
    fn current(&self, lat: f64, lon: f64) -> Result<CurrentReading, ProviderError>;
    fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastSample>, ProviderError>;
}

/// Current conditions plus what the provider says about the place.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentReading {
    pub conditions: CurrentConditions,
    pub country: Option<String>,
}

// ─── Wire format ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
struct OwmCondition {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OwmMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct OwmSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    #[serde(default)]
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    wind: Option<OwmWind>,
    /// Metres.
    #[serde(default)]
    visibility: Option<f64>,
    #[serde(default)]
    sys: Option<OwmSys>,
    #[serde(default)]
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    #[serde(default)]
    dt_txt: Option<String>,
    #[serde(default)]
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    #[serde(default)]
    list: Vec<OwmForecastItem>,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl OwmCurrentResponse {
    /// Temperature and a description are required; everything else has a default.
    fn into_reading(self) -> Result<CurrentReading, ProviderError> {
        let main = self.main.unwrap_or_default();
        let temperature = main
            .temp
            .ok_or_else(|| ProviderError::InvalidResponse("missing main.temp".into()))?;
        let condition = self
            .weather
            .into_iter()
            .next()
            .filter(|w| w.description.as_deref().is_some_and(|d| !d.trim().is_empty()))
            .ok_or_else(|| ProviderError::InvalidResponse("missing weather description".into()))?;

        let observed_at = self
            .dt
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);
        let wind_ms = self.wind.and_then(|w| w.speed).unwrap_or(0.0);

        Ok(CurrentReading {
            conditions: CurrentConditions {
                temperature,
                feels_like: main.feels_like.unwrap_or(temperature),
                condition_text: capitalize_first(condition.description.as_deref().unwrap_or("")),
                humidity_pct: main.humidity.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8,
                wind_kph: round1(wind_ms * 3.6),
                pressure_hpa: main.pressure.unwrap_or(0.0),
                visibility_km: self
                    .visibility
                    .map(|m| round1(m / 1000.0))
                    .unwrap_or(DEFAULT_VISIBILITY_KM),
                icon_code: condition.icon.unwrap_or_default(),
                observed_at,
            },
            country: self.sys.and_then(|s| s.country).filter(|c| !c.is_empty()),
        })
    }
}

impl OwmForecastItem {
    fn into_sample(self) -> Option<ForecastSample> {
        let at = NaiveDateTime::parse_from_str(self.dt_txt.as_deref()?, "%Y-%m-%d %H:%M:%S").ok()?;
        let main = self.main?;
        let condition = self.weather.into_iter().next()?;
        Some(ForecastSample {
            at,
            temp_max: main.temp_max.or(main.temp)?,
            temp_min: main.temp_min.or(main.temp)?,
            icon_code: condition.icon.unwrap_or_default(),
            description: condition.main.or(condition.description).unwrap_or_default(),
        })
    }
}

fn samples_from(response: OwmForecastResponse) -> Vec<ForecastSample> {
    let total = response.list.len();
    let samples: Vec<_> = response
        .list
        .into_iter()
        .filter_map(OwmForecastItem::into_sample)
        .collect();
    if samples.len() < total {
        debug!(skipped = total - samples.len(), "dropped malformed forecast items");
    }
    samples
}

// ─── Provider ───────────────────────────────────────────────────

/// OpenWeatherMap 2.5 current-weather and forecast endpoints.
pub struct OpenWeatherMap {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64, user_agent: &str) -> Self {
        Self {
            agent: http_agent(timeout_secs, user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn get(&self, endpoint: &str, lat: f64, lon: f64) -> Result<ureq::Response, ProviderError> {
        Ok(self
            .agent
            .get(&format!("{}/{}", self.base_url, endpoint))
            .query("lat", &lat.to_string())
            .query("lon", &lon.to_string())
            .query("units", UNITS)
            .query("lang", "en")
            .query("appid", &self.api_key)
            .call()?)
    }
}

impl WeatherSource for OpenWeatherMap {
    fn current(&self, lat: f64, lon: f64) -> Result<CurrentReading, ProviderError> {
        let body: OwmCurrentResponse = self.get("weather", lat, lon)?.into_json()?;
        body.into_reading()
    }

    fn forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastSample>, ProviderError> {
        let body: OwmForecastResponse = self.get("forecast", lat, lon)?.into_json()?;
        Ok(samples_from(body))
    }
}

// ─── Fetcher ────────────────────────────────────────────────────

/// Applies the failure policy on top of a `WeatherSource`:
/// current conditions are mandatory, the forecast is best-effort.
pub struct WeatherFetcher {
    source: Box<dyn WeatherSource>,
}

impl WeatherFetcher {
    pub fn new(source: Box<dyn WeatherSource>) -> Self {
        Self { source }
    }

    pub fn fetch_weather(&self, lat: f64, lon: f64) -> Result<WeatherReport, Failure> {
        let reading = self.source.current(lat, lon).map_err(|e| {
            warn!(stage = %Stage::Current, lat, lon, error = %e, "current conditions unavailable");
            Failure::upstream(Stage::Current)
        })?;

        let samples = self.source.forecast(lat, lon).unwrap_or_else(|e| {
            warn!(stage = %Stage::Forecast, lat, lon, error = %e, "forecast unavailable; continuing without it");
            Vec::new()
        });
        debug!(samples = samples.len(), "fetched forecast samples");

        Ok(WeatherReport {
            current: reading.conditions,
            reported_country: reading.country,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CURRENT_JSON: &str = r#"{
        "coord": {"lon": 42.03, "lat": 9.41},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": 21.37, "feels_like": 20.9, "pressure": 1016, "humidity": 48},
        "visibility": 8000,
        "wind": {"speed": 4.12, "deg": 90},
        "dt": 1792141200,
        "sys": {"country": "ET"},
        "name": "Alemaya"
    }"#;

    const FORECAST_JSON: &str = r#"{
        "cod": "200",
        "list": [
            {"dt_txt": "2026-10-17 09:00:00", "main": {"temp": 18.0, "temp_max": 19.2, "temp_min": 17.4},
             "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}]},
            {"dt_txt": "2026-10-17 12:00:00", "main": {"temp": 23.0, "temp_max": 24.1, "temp_min": 22.0},
             "weather": [{"main": "Clouds", "description": "few clouds", "icon": "02d"}]},
            {"dt_txt": "not a time", "main": {"temp": 1.0}, "weather": [{"main": "Clear"}]},
            {"dt_txt": "2026-10-17 15:00:00", "main": {"temp": 22.0}, "weather": []}
        ]
    }"#;

    #[test]
    fn test_current_normalization() {
        let body: OwmCurrentResponse = serde_json::from_str(CURRENT_JSON).unwrap();
        let reading = body.into_reading().unwrap();
        let c = &reading.conditions;
        assert_relative_eq!(c.temperature, 21.37);
        assert_relative_eq!(c.wind_kph, 14.8);
        assert_relative_eq!(c.visibility_km, 8.0);
        assert_relative_eq!(c.pressure_hpa, 1016.0);
        assert_eq!(c.humidity_pct, 48);
        assert_eq!(c.condition_text, "Broken clouds");
        assert_eq!(c.icon_code, "04d");
        assert_eq!(c.observed_at.timestamp(), 1792141200);
        assert_eq!(reading.country.as_deref(), Some("ET"));
    }

    #[test]
    fn test_current_defaults() {
        let body: OwmCurrentResponse = serde_json::from_str(
            r#"{"main": {"temp": 5.0}, "weather": [{"description": "mist", "icon": "50n"}]}"#,
        )
        .unwrap();
        let c = body.into_reading().unwrap().conditions;
        assert_relative_eq!(c.feels_like, 5.0);
        assert_relative_eq!(c.visibility_km, DEFAULT_VISIBILITY_KM);
        assert_relative_eq!(c.wind_kph, 0.0);
    }

    #[test]
    fn test_current_requires_temperature() {
        let body: OwmCurrentResponse = serde_json::from_str(
            r#"{"main": {"humidity": 40}, "weather": [{"description": "haze"}]}"#,
        )
        .unwrap();
        assert!(matches!(body.into_reading(), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn test_current_requires_description() {
        let body: OwmCurrentResponse =
            serde_json::from_str(r#"{"main": {"temp": 12.0}, "weather": []}"#).unwrap();
        assert!(body.into_reading().is_err());
    }

    #[test]
    fn test_forecast_skips_malformed_items() {
        let body: OwmForecastResponse = serde_json::from_str(FORECAST_JSON).unwrap();
        let samples = samples_from(body);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].description, "Clouds");
        assert_relative_eq!(samples[1].temp_max, 24.1);
        assert_relative_eq!(samples[1].temp_min, 22.0);
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("light rain"), "Light rain");
        assert_eq!(capitalize_first(""), "");
    }

    struct Canned {
        current_ok: bool,
        forecast_ok: bool,
    }

    impl WeatherSource for Canned {
        fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentReading, ProviderError> {
            if !self.current_ok {
                return Err(ProviderError::Status(500));
            }
            let body: OwmCurrentResponse = serde_json::from_str(CURRENT_JSON).unwrap();
            body.into_reading()
        }

        fn forecast(&self, _lat: f64, _lon: f64) -> Result<Vec<ForecastSample>, ProviderError> {
            if !self.forecast_ok {
                return Err(ProviderError::Network("timed out".into()));
            }
            let body: OwmForecastResponse = serde_json::from_str(FORECAST_JSON).unwrap();
            Ok(samples_from(body))
        }
    }

    #[test]
    fn test_fetcher_current_failure_is_fatal() {
        let fetcher = WeatherFetcher::new(Box::new(Canned { current_ok: false, forecast_ok: true }));
        assert_eq!(
            fetcher.fetch_weather(9.41, 42.03).unwrap_err(),
            Failure::upstream(Stage::Current)
        );
    }

    #[test]
    fn test_fetcher_forecast_failure_is_tolerated() {
        let fetcher = WeatherFetcher::new(Box::new(Canned { current_ok: true, forecast_ok: false }));
        let report = fetcher.fetch_weather(9.41, 42.03).unwrap();
        assert!(report.samples.is_empty());
        assert_eq!(report.reported_country.as_deref(), Some("ET"));
    }
}
