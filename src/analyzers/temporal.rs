use crate::config::TemporalConfig;
use crate::models::NoiseComplaint;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::Serialize;

/// Parse a creation timestamp with the first matching format.
///
/// Falls back to RFC 3339 (`Z` or an offset, keeping the local wall clock)
/// and then to the date-only formats at midnight.
pub fn parse_timestamp(value: &str, config: &TemporalConfig) -> Option<NaiveDateTime> {
    let value = value.trim();
    config
        .timestamp_formats
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|ts| ts.naive_local())
        })
        .or_else(|| {
            config
                .date_formats
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayCount {
    pub weekday: &'static str,
    pub count: usize,
}

/// Complaint counts by hour of day and day of week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalProfile {
    pub parsed: usize,
    /// Rows whose timestamp was missing or unparseable
    pub unparsed: usize,
    /// Always 24 entries, hour 0 first
    pub hourly: Vec<usize>,
    /// Always 7 entries, in the configured weekday order
    pub weekly: Vec<WeekdayCount>,
}

impl TemporalProfile {
    pub fn peak_hour(&self) -> Option<usize> {
        if self.parsed == 0 {
            return None;
        }
        self.hourly
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(hour, _)| hour)
    }

    pub fn peak_weekday(&self) -> Option<&'static str> {
        if self.parsed == 0 {
            return None;
        }
        self.weekly
            .iter()
            .rev()
            .max_by_key(|w| w.count)
            .map(|w| w.weekday)
    }
}

/// Bin parseable timestamps. Rows that fail to parse are only excluded here.
pub fn temporal_profile(records: &[NoiseComplaint], config: &TemporalConfig) -> TemporalProfile {
    let mut hourly = vec![0usize; 24];
    let mut by_day = [0usize; 7];
    let mut parsed = 0;

    for record in records {
        let Some(ts) = record
            .created_date
            .as_deref()
            .and_then(|v| parse_timestamp(v, config))
        else {
            continue;
        };

        parsed += 1;
        hourly[ts.hour() as usize] += 1;
        by_day[ts.weekday().num_days_from_monday() as usize] += 1;
    }

    let weekly = config
        .weekday_order
        .iter()
        .map(|&day| WeekdayCount {
            weekday: weekday_name(day),
            count: by_day[day.num_days_from_monday() as usize],
        })
        .collect();

    TemporalProfile {
        parsed,
        unparsed: records.len() - parsed,
        hourly,
        weekly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn complaint(created: Option<&str>) -> NoiseComplaint {
        NoiseComplaint::new(
            created.map(str::to_string),
            Some("Noise - Residential".to_string()),
            "Loud Music/Party".to_string(),
            "Brooklyn".to_string(),
            40.65,
            -73.95,
        )
    }

    #[test]
    fn test_parse_formats() {
        let config = TemporalConfig::default();

        let ts = parse_timestamp("01/04/2025 11:45:00 PM", &config).unwrap();
        assert_eq!((ts.hour(), ts.minute()), (23, 45));

        let ts = parse_timestamp("01/04/2025 12:05:00 AM", &config).unwrap();
        assert_eq!(ts.hour(), 0);

        let ts = parse_timestamp("2025-01-04T07:30:00.000", &config).unwrap();
        assert_eq!(ts.hour(), 7);

        let ts = parse_timestamp("2025-01-04 07:30:00", &config).unwrap();
        assert_eq!(ts.weekday(), Weekday::Sat);

        assert!(parse_timestamp("yesterday evening", &config).is_none());
    }

    #[test]
    fn test_parse_date_only_and_offsets() {
        let config = TemporalConfig::default();

        let ts = parse_timestamp("01/04/2025", &config).unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.day()), (0, 0, 4));

        let ts = parse_timestamp("2025-01-05", &config).unwrap();
        assert_eq!((ts.hour(), ts.weekday()), (0, Weekday::Sun));

        let ts = parse_timestamp("2025-01-04T07:30:00Z", &config).unwrap();
        assert_eq!((ts.hour(), ts.minute()), (7, 30));

        // Wall clock of the stated offset, not UTC
        let ts = parse_timestamp("2025-01-04T23:15:00-05:00", &config).unwrap();
        assert_eq!((ts.hour(), ts.day()), (23, 4));

        assert!(parse_timestamp("2025-13-40", &config).is_none());
    }

    #[test]
    fn test_bins_always_complete() {
        let config = TemporalConfig::default();

        let empty = temporal_profile(&[], &config);
        assert_eq!(empty.hourly.len(), 24);
        assert_eq!(empty.weekly.len(), 7);
        assert!(empty.hourly.iter().all(|&c| c == 0));
        assert_eq!(empty.peak_hour(), None);

        let sparse = temporal_profile(&[complaint(Some("01/06/2025 10:00:00 PM"))], &config);
        assert_eq!(sparse.hourly.len(), 24);
        assert_eq!(sparse.hourly[22], 1);
        assert_eq!(sparse.weekly.len(), 7);
        assert_eq!(sparse.weekly[0], WeekdayCount { weekday: "Monday", count: 1 });
        assert_eq!(sparse.weekly.iter().map(|w| w.count).sum::<usize>(), 1);
    }

    #[test]
    fn test_unparseable_rows_excluded_locally() {
        let records = vec![
            complaint(Some("01/03/2025 01:00:00 AM")),
            complaint(Some("not a date")),
            complaint(None),
            complaint(Some("01/04/2025 01:30:00 AM")),
        ];
        let profile = temporal_profile(&records, &TemporalConfig::default());

        assert_eq!(profile.parsed, 2);
        assert_eq!(profile.unparsed, 2);
        assert_eq!(profile.hourly[1], 2);
        assert_eq!(profile.peak_hour(), Some(1));
    }

    #[test]
    fn test_custom_weekday_order() {
        let mut config = TemporalConfig::default();
        config.weekday_order.rotate_right(1); // Sunday first

        let profile = temporal_profile(&[complaint(Some("01/05/2025 03:00:00 PM"))], &config);
        let names: Vec<&str> = profile.weekly.iter().map(|w| w.weekday).collect();
        assert_eq!(names[0], "Sunday");
        assert_eq!(profile.weekly[0].count, 1);
        assert_eq!(profile.peak_weekday(), Some("Sunday"));
    }
}
