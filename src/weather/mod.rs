//! Weather retrieval and forecast condensation.

pub mod fetcher;
pub mod reducer;
pub mod types;

pub use fetcher::{CurrentReading, OpenWeatherMap, WeatherFetcher, WeatherSource};
pub use reducer::{reduce, MAX_FORECAST_DAYS};
pub use types::{CurrentConditions, ForecastDay, ForecastSample, WeatherReport};
