//! The caller-facing operation: query in, weather result (or failure) out.

use crate::config::SkycastConfig;
use crate::error::{ConfigError, Failure};
use crate::location::{build_chain, AliasTable, LocationQuery, LocationResolver, PlaceNameNormalizer};
use crate::result::{assemble, WeatherResult};
use crate::weather::{reduce, OpenWeatherMap, WeatherFetcher};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{info, instrument};

/// Resolve → fetch → reduce → assemble, strictly in that order.
pub struct WeatherPipeline {
    api_key: Option<String>,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    timezone: Tz,
}

impl WeatherPipeline {
    pub fn new(
        api_key: Option<String>,
        resolver: LocationResolver,
        fetcher: WeatherFetcher,
        timezone: Tz,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            resolver,
            fetcher,
            timezone,
        }
    }

    /// Wire real providers from a validated configuration.
    pub fn from_config(config: &SkycastConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key().map(str::to_string);
        let key = api_key.as_deref().unwrap_or_default();
        let geo = &config.geocoding;

        let forward = build_chain(&geo.forward_chain, geo, key)?;
        let reverse = build_chain(&geo.reverse_chain, geo, key)?;
        let resolver = LocationResolver::new(forward, reverse)
            .with_aliases(AliasTable::new(geo.aliases.iter()))
            .with_normalizer(PlaceNameNormalizer::from_tables(
                &config.normalizer.subdivisions,
                &config.normalizer.regions,
            ))
            .with_placeholder_name(geo.placeholder_name.clone());

        let source = OpenWeatherMap::new(
            &config.weather.base_url,
            key,
            config.weather.timeout_secs,
            &geo.user_agent,
        );

        Ok(Self::new(
            api_key,
            resolver,
            WeatherFetcher::new(Box::new(source)),
            config.timezone()?,
        ))
    }

    /// Today's date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub fn resolve_weather(&self, query: &LocationQuery) -> Result<WeatherResult, Failure> {
        self.resolve_weather_on(query, self.today())
    }

    /// Same as [`resolve_weather`](Self::resolve_weather) with a fixed "today".
    #[instrument(skip(self))]
    pub fn resolve_weather_on(
        &self,
        query: &LocationQuery,
        today: NaiveDate,
    ) -> Result<WeatherResult, Failure> {
        query.validate()?;
        if self.api_key.is_none() {
            return Err(Failure::ApiKeyMissing);
        }

        let place = self.resolver.resolve(query)?;
        let report = self.fetcher.fetch_weather(place.lat, place.lon)?;
        let days = reduce(&report.samples, today);

        info!(
            place = %place.display_name,
            lat = place.lat,
            lon = place.lon,
            days = days.len(),
            "weather resolved"
        );
        Ok(assemble(place, report, days))
    }
}
