//! Date parsing and inclusive date ranges used by the date-range filter

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Parse a backend date or timestamp.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// and RFC 3339 timestamps (normalised to UTC).
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    None
}

/// Calendar date of a backend date or timestamp (time of day dropped)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_datetime(value).map(|dt| dt.date())
}

/// Inclusive calendar-date range; a missing bound is unbounded on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Build a range from `YYYY-MM-DD` strings. Empty or malformed bounds are unbounded.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Self {
        let bound = |s: Option<&str>| {
            let s = s?.trim();
            if s.is_empty() {
                return None;
            }
            let parsed = parse_date(s);
            if parsed.is_none() {
                log::warn!(target: "ftms::query", "Ignoring malformed date bound: {}", s);
            }
            parsed
        };
        Self {
            from: bound(from),
            to: bound(to),
        }
    }

    /// A range with no bounds imposes no constraint
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Check if a date is within the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.from, self.to) {
            (None, None) => true,
            (Some(s), None) => date >= s,
            (None, Some(e)) => date <= e,
            (Some(s), Some(e)) => date >= s && date <= e,
        }
    }

    /// Get a human-readable description of the range
    pub fn description(&self) -> String {
        match (self.from, self.to) {
            (None, None) => "All Time".to_string(),
            (Some(s), None) => format!("From {}", s),
            (None, Some(e)) => format!("Until {}", e),
            (Some(s), Some(e)) => format!("{} to {}", s, e),
        }
    }
}

/// Quick date filters offered next to the custom range picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePreset {
    /// Current month
    Month,
    /// Current calendar quarter
    Quarter,
    /// Current year
    Year,
    /// All time
    All,
}

impl DatePreset {
    /// Resolve the preset against `today`
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        match self {
            DatePreset::Month => {
                let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
                DateRange::new(start, start.and_then(last_day_of_month))
            }
            DatePreset::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                let start = NaiveDate::from_ymd_opt(today.year(), first_month, 1);
                let end = NaiveDate::from_ymd_opt(today.year(), first_month + 2, 1)
                    .and_then(last_day_of_month);
                DateRange::new(start, end)
            }
            DatePreset::Year => DateRange::new(
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year(), 12, 31),
            ),
            DatePreset::All => DateRange::default(),
        }
    }
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.pred_opt())
}

impl std::str::FromStr for DatePreset {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(DatePreset::Month),
            "quarter" => Ok(DatePreset::Quarter),
            "year" => Ok(DatePreset::Year),
            "all" => Ok(DatePreset::All),
            _ => Err(format!("Invalid date preset: {}", s)),
        }
    }
}

impl std::fmt::Display for DatePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatePreset::Month => write!(f, "month"),
            DatePreset::Quarter => write!(f, "quarter"),
            DatePreset::Year => write!(f, "year"),
            DatePreset::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert_eq!(parse_date("2024-06-15"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024-06-15T23:59:59"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024-06-15 08:30:00"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024-06-15T08:30:00.123Z"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024-06-15T01:00:00+08:00"), Some(ymd(2024, 6, 14)));
        assert_eq!(parse_date("15/06/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::new(Some(ymd(2024, 1, 1)), Some(ymd(2024, 1, 31)));
        assert!(range.contains(ymd(2024, 1, 1)));
        assert!(range.contains(ymd(2024, 1, 31)));
        assert!(!range.contains(ymd(2023, 12, 31)));
        assert!(!range.contains(ymd(2024, 2, 1)));
    }

    #[test]
    fn test_date_range_open_ends() {
        let from_only = DateRange::new(Some(ymd(2024, 1, 1)), None);
        assert!(from_only.contains(ymd(2030, 1, 1)));
        assert!(!from_only.contains(ymd(2023, 1, 1)));
        assert!(!DateRange::default().is_active());
        assert!(DateRange::default().contains(ymd(1999, 1, 1)));
    }

    #[test]
    fn test_date_range_parse_ignores_malformed() {
        let range = DateRange::parse(Some("2024-13-45"), Some("2024-03-01"));
        assert_eq!(range.from, None);
        assert_eq!(range.to, Some(ymd(2024, 3, 1)));
        assert!(!DateRange::parse(Some(""), None).is_active());
    }

    #[test]
    fn test_preset_month_december() {
        let range = DatePreset::Month.resolve(ymd(2024, 12, 10));
        assert_eq!(range.from, Some(ymd(2024, 12, 1)));
        assert_eq!(range.to, Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_preset_quarter() {
        let range = DatePreset::Quarter.resolve(ymd(2024, 5, 20));
        assert_eq!(range.from, Some(ymd(2024, 4, 1)));
        assert_eq!(range.to, Some(ymd(2024, 6, 30)));
        let q4 = DatePreset::Quarter.resolve(ymd(2024, 11, 2));
        assert_eq!(q4.to, Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_preset_year_and_all() {
        let range = DatePreset::Year.resolve(ymd(2024, 5, 20));
        assert_eq!(range.description(), "2024-01-01 to 2024-12-31");
        assert!(!DatePreset::All.resolve(ymd(2024, 5, 20)).is_active());
        assert_eq!("QUARTER".parse::<DatePreset>().unwrap(), DatePreset::Quarter);
    }
}
