//! Result assembly: the immutable success value handed back to callers.

use crate::location::ResolvedPlace;
use crate::weather::{CurrentConditions, ForecastDay, WeatherReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub place: ResolvedPlace,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

/// Combine the pipeline stages into one result. Never fails.
///
/// When the geocoder supplied no country, the weather provider's country
/// for the same coordinates is used.
pub fn assemble(place: ResolvedPlace, report: WeatherReport, days: Vec<ForecastDay>) -> WeatherResult {
    let place = match place.country {
        Some(_) => place,
        None => ResolvedPlace {
            country: report.reported_country,
            ..place
        },
    };
    WeatherResult {
        place,
        current: report.current,
        forecast: days,
    }
}
