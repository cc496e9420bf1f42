use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Current conditions, normalized to Celsius, km/h, hPa and km.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    pub condition_text: String,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub pressure_hpa: f64,
    pub visibility_km: f64,
    pub icon_code: String,
    pub observed_at: DateTime<Utc>,
}

impl CurrentConditions {
    pub fn icon_url(&self) -> String {
        format!("{}/{}@4x.png", ICON_BASE_URL, self.icon_code)
    }
}

/// One sub-daily forecast sample (3-hour step), timestamped in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub at: NaiveDateTime,
    pub temp_max: f64,
    pub temp_min: f64,
    pub icon_code: String,
    pub description: String,
}

impl ForecastSample {
    pub fn date(&self) -> NaiveDate {
        self.at.date()
    }
}

/// One day of the condensed forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Short weekday name, e.g. "Mon".
    pub day_label: String,
    /// Short month/day, e.g. "Oct 17".
    pub date_label: String,
    pub calendar_date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub icon_code: String,
    pub description: String,
}

impl ForecastDay {
    pub fn from_sample(sample: &ForecastSample) -> Self {
        let date = sample.date();
        Self {
            day_label: date.format("%a").to_string(),
            date_label: date.format("%b %-d").to_string(),
            calendar_date: date,
            temp_max: sample.temp_max,
            temp_min: sample.temp_min,
            icon_code: sample.icon_code.clone(),
            description: sample.description.clone(),
        }
    }

    pub fn icon_url(&self) -> String {
        format!("{}/{}@2x.png", ICON_BASE_URL, self.icon_code)
    }
}

/// What the weather fetcher hands back for one coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    /// Country code the weather provider associates with the coordinates.
    pub reported_country: Option<String>,
    pub samples: Vec<ForecastSample>,
}
