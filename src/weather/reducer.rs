//! Forecast reduction: 3-hour samples → at most five daily entries.
//!
//! Each future calendar date is represented by its midday sample when one
//! exists, otherwise by its earliest sample. Samples on or before today are
//! dropped; sample dates are UTC while today may be in a zone ahead of UTC.

use super::types::{ForecastDay, ForecastSample};
use chrono::{NaiveDate, Timelike};
use std::collections::HashSet;

pub const MAX_FORECAST_DAYS: usize = 5;

/// Hour of the representative sample for a day.
pub const MIDDAY_HOUR: u32 = 12;

fn is_midday(sample: &ForecastSample) -> bool {
    sample.at.hour() == MIDDAY_HOUR && sample.at.minute() == 0
}

/// Condense samples into at most `MAX_FORECAST_DAYS` days, ascending by date.
///
/// Temperatures are the representative sample's own max/min; nothing is
/// recomputed across the day.
pub fn reduce(samples: &[ForecastSample], today: NaiveDate) -> Vec<ForecastDay> {
    let mut ordered: Vec<&ForecastSample> = samples
        .iter()
        .filter(|s| s.date() > today)
        .collect();
    ordered.sort_by_key(|s| s.at);

    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let mut picked: Vec<&ForecastSample> = Vec::with_capacity(MAX_FORECAST_DAYS);

    // Midday pass
    for sample in ordered.iter().copied().filter(|s| is_midday(s)) {
        if picked.len() == MAX_FORECAST_DAYS {
            break;
        }
        if seen.insert(sample.date()) {
            picked.push(sample);
        }
    }

    // Dates without a midday sample take their first sample
    for sample in ordered.iter().copied() {
        if picked.len() == MAX_FORECAST_DAYS {
            break;
        }
        if seen.insert(sample.date()) {
            picked.push(sample);
        }
    }

    picked.sort_by_key(|s| s.date());
    picked.into_iter().map(ForecastDay::from_sample).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn sample_at(at: NaiveDateTime) -> ForecastSample {
        ForecastSample {
            at,
            temp_max: at.hour() as f64 + 0.5,
            temp_min: at.hour() as f64 - 0.5,
            icon_code: format!("{:02}d", at.hour()),
            description: "Clouds".into(),
        }
    }

    /// `count` samples every 3 hours starting at `start`.
    fn series(start: NaiveDateTime, count: usize) -> Vec<ForecastSample> {
        (0..count)
            .map(|i| sample_at(start + Duration::hours(3 * i as i64)))
            .collect()
    }

    fn midnight(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(0, 0, 0).unwrap()
    }

    fn assert_strictly_ascending(days: &[ForecastDay]) {
        assert!(days.windows(2).all(|w| w[0].calendar_date < w[1].calendar_date));
    }

    #[test]
    fn test_forty_samples_pick_middays() {
        let start = midnight(today() + Duration::days(1));
        let days = reduce(&series(start, 40), today());

        assert_eq!(days.len(), 5);
        assert_strictly_ascending(&days);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.calendar_date, today() + Duration::days(i as i64 + 1));
            assert_eq!(day.icon_code, "12d");
            assert_eq!(day.temp_max, 12.5);
        }
    }

    #[test]
    fn test_missing_midday_uses_first_sample_of_that_day() {
        let start = midnight(today() + Duration::days(1));
        let gap_day = today() + Duration::days(3);
        let samples: Vec<_> = series(start, 40)
            .into_iter()
            .filter(|s| !(s.date() == gap_day && is_midday(s)))
            .collect();

        let days = reduce(&samples, today());
        assert_eq!(days.len(), 5);
        assert_strictly_ascending(&days);
        let gap = days.iter().find(|d| d.calendar_date == gap_day).unwrap();
        assert_eq!(gap.icon_code, "00d");
    }

    #[test]
    fn test_today_is_discarded() {
        // Starts at 15:00 today, as the provider does mid-afternoon.
        let start = today().and_hms_opt(15, 0, 0).unwrap();
        let days = reduce(&series(start, 40), today());
        assert!(days.iter().all(|d| d.calendar_date != today()));
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].calendar_date, today() + Duration::days(1));
    }

    #[test]
    fn test_samples_before_today_are_discarded() {
        // Local today is a day ahead of the UTC sample dates (e.g. Pacific/Auckland).
        let local_today = today() + Duration::days(1);
        let start = today().and_hms_opt(18, 0, 0).unwrap();
        let days = reduce(&series(start, 40), local_today);

        assert!(days.iter().all(|d| d.calendar_date > local_today));
        assert_strictly_ascending(&days);
        assert!(days.len() <= MAX_FORECAST_DAYS);
        assert_eq!(days[0].calendar_date, local_today + Duration::days(1));
    }

    #[test]
    fn test_empty_input() {
        assert!(reduce(&[], today()).is_empty());
    }

    #[test]
    fn test_only_today() {
        let start = today().and_hms_opt(0, 0, 0).unwrap();
        assert!(reduce(&series(start, 8), today()).is_empty());
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let start = midnight(today() + Duration::days(1));
        let mut samples = series(start, 24);
        samples.reverse();
        let days = reduce(&samples, today());
        assert_eq!(days.len(), 3);
        assert_strictly_ascending(&days);
        assert!(days.iter().all(|d| d.icon_code == "12d"));
    }

    #[test]
    fn test_duplicate_samples_do_not_duplicate_days() {
        let noon = (today() + Duration::days(2)).and_hms_opt(12, 0, 0).unwrap();
        let samples = vec![sample_at(noon), sample_at(noon), sample_at(noon + Duration::hours(3))];
        let days = reduce(&samples, today());
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn test_never_more_than_five() {
        let start = midnight(today() + Duration::days(1));
        let days = reduce(&series(start, 80), today());
        assert_eq!(days.len(), MAX_FORECAST_DAYS);
        assert_strictly_ascending(&days);
    }

    #[test]
    fn test_sparse_days_without_midday() {
        let samples = vec![
            sample_at((today() + Duration::days(1)).and_hms_opt(3, 0, 0).unwrap()),
            sample_at((today() + Duration::days(1)).and_hms_opt(21, 0, 0).unwrap()),
            sample_at((today() + Duration::days(2)).and_hms_opt(12, 0, 0).unwrap()),
        ];
        let days = reduce(&samples, today());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].icon_code, "03d");
        assert_eq!(days[1].icon_code, "12d");
    }
}
