//! Typed structured filters

use serde::Serialize;
use std::collections::BTreeSet;

use super::{FieldValue, Record};
use crate::time::DateRange;

/// Shape of a declared filter and the column it reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind<F> {
    /// Value must be one of the selected options
    MultiSelect(F),
    /// Calendar date must fall in an inclusive range
    DateRange(F),
    /// Magnitude must fall in an inclusive range
    AmountRange(F),
}

impl<F: Copy> FilterKind<F> {
    pub fn field(&self) -> F {
        match self {
            FilterKind::MultiSelect(f) | FilterKind::DateRange(f) | FilterKind::AmountRange(f) => *f,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::MultiSelect(_) => "multi-select",
            FilterKind::DateRange(_) => "date range",
            FilterKind::AmountRange(_) => "amount range",
        }
    }
}

/// A named filter dimension of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec<F> {
    pub key: &'static str,
    pub kind: FilterKind<F>,
}

/// Inclusive numeric range; `None` bounds are unbounded
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AmountRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AmountRange {
    /// Non-finite bounds (e.g. a NaN from a half-typed input) become unbounded
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        let finite = |v: Option<f64>| v.filter(|n| n.is_finite());
        Self {
            min: finite(min),
            max: finite(max),
        }
    }

    /// Parse bounds from raw input; unparseable text is unbounded
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Self {
        let bound = |s: Option<&str>| s.and_then(|s| s.trim().parse::<f64>().ok());
        Self::new(bound(min), bound(max))
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Current value of a structured filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterValue {
    MultiSelect { values: BTreeSet<String> },
    DateRange { range: DateRange },
    AmountRange { range: AmountRange },
}

impl FilterValue {
    pub fn multi_select<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::MultiSelect {
            values: values
                .into_iter()
                .map(Into::<String>::into)
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    pub fn date_range(range: DateRange) -> Self {
        FilterValue::DateRange { range }
    }

    pub fn amount_range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::AmountRange {
            range: AmountRange::new(min, max),
        }
    }

    /// An empty selection or an unbounded range imposes no constraint
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::MultiSelect { values } => !values.is_empty(),
            FilterValue::DateRange { range } => range.is_active(),
            FilterValue::AmountRange { range } => range.is_active(),
        }
    }

    /// Whether this value has the shape the filter kind expects
    pub fn fits<F>(&self, kind: &FilterKind<F>) -> bool {
        matches!(
            (self, kind),
            (FilterValue::MultiSelect { .. }, FilterKind::MultiSelect(_))
                | (FilterValue::DateRange { .. }, FilterKind::DateRange(_))
                | (FilterValue::AmountRange { .. }, FilterKind::AmountRange(_))
        )
    }

    /// Check a single record against this filter
    pub fn matches<R: Record>(&self, record: &R, field: R::Field) -> bool {
        let value = record.value(field);
        match self {
            FilterValue::MultiSelect { values } => {
                values.is_empty() || values.contains(&*value.as_text())
            }
            FilterValue::DateRange { range } => {
                if !range.is_active() {
                    return true;
                }
                value.date().map_or(false, |d| range.contains(d))
            }
            FilterValue::AmountRange { range } => {
                if !range.is_active() {
                    return true;
                }
                value.magnitude().map_or(false, |n| range.contains(n))
            }
        }
    }
}

/// Case-insensitive substring match over the given fields.
///
/// `term_lower` must already be lower-cased; an empty term matches everything.
pub fn matches_search<R: Record>(record: &R, fields: &[R::Field], term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return true;
    }
    fields.iter().any(|field| {
        let value: FieldValue<'_> = record.value(*field);
        value.as_text().to_lowercase().contains(term_lower)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixtures::{row, RowField};
    use chrono::NaiveDate;

    #[test]
    fn test_amount_range_nan_is_unbounded() {
        let range = AmountRange::new(Some(f64::NAN), Some(100.0));
        assert_eq!(range.min, None);
        assert!(range.contains(-1e9));
        assert!(!range.contains(100.5));

        let parsed = AmountRange::parse(Some("abc"), Some(""));
        assert!(!parsed.is_active());
    }

    #[test]
    fn test_amount_filter_uses_magnitude() {
        let filter = FilterValue::amount_range(Some(60.0), None);
        assert!(filter.matches(&row("a", "A", "open", "2024-01-01", 100.0), RowField::Amount));
        assert!(!filter.matches(&row("b", "B", "open", "2024-01-01", -50.0), RowField::Amount));
        assert!(filter.matches(&row("c", "C", "open", "2024-01-01", -75.0), RowField::Amount));
    }

    #[test]
    fn test_multi_select_or_within_key() {
        let filter = FilterValue::multi_select(["open", "closed"]);
        assert!(filter.matches(&row("a", "A", "open", "2024-01-01", 1.0), RowField::Status));
        assert!(filter.matches(&row("b", "B", "closed", "2024-01-01", 1.0), RowField::Status));
        assert!(!filter.matches(&row("c", "C", "void", "2024-01-01", 1.0), RowField::Status));
        assert!(!FilterValue::multi_select(Vec::<String>::new()).is_active());
    }

    #[test]
    fn test_date_range_ignores_time_of_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let filter = FilterValue::date_range(DateRange::new(None, Some(day)));
        assert!(filter.matches(&row("a", "A", "open", "2024-03-31T23:59:59", 1.0), RowField::Date));
        assert!(!filter.matches(&row("b", "B", "open", "2024-04-01T00:00:00", 1.0), RowField::Date));
        assert!(!filter.matches(&row("c", "C", "open", "not a date", 1.0), RowField::Date));
    }

    #[test]
    fn test_search_case_insensitive_and_numeric() {
        let mut r = row("a", "Fuel", "open", "2024-01-01", 1250.0);
        r.remarks = "Paid by Driver".to_string();
        let fields = [RowField::Name, RowField::Remarks, RowField::Amount];
        assert!(matches_search(&r, &fields, "driver"));
        assert!(matches_search(&r, &fields, "125"));
        assert!(matches_search(&r, &fields, ""));
        assert!(!matches_search(&r, &fields, "conductor"));
    }

    #[test]
    fn test_value_fits_kind() {
        let kind = FilterKind::AmountRange(RowField::Amount);
        assert!(FilterValue::amount_range(None, Some(1.0)).fits(&kind));
        assert!(!FilterValue::multi_select(["x"]).fits(&kind));
        assert_eq!(kind.field(), RowField::Amount);
    }
}
