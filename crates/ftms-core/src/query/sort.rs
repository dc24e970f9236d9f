//! Single-field stable sorting

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{FieldValue, Record};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

impl SortDirection {
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Arrow shown next to the active column header
    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: Copy + PartialEq> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Header click: the same column flips direction, another column starts ascending
    pub fn toggle(current: Option<Sort<F>>, field: F) -> Sort<F> {
        match current {
            Some(sort) if sort.field == field => Sort {
                field,
                direction: sort.direction.reversed(),
            },
            _ => Sort::asc(field),
        }
    }
}

/// Precomputed comparison key for one record
#[derive(Debug)]
enum SortKey {
    Text { folded: String, raw: String },
    Date(Option<NaiveDateTime>),
    Number(f64),
}

impl SortKey {
    fn of(value: FieldValue<'_>) -> Self {
        match value {
            FieldValue::Text(s) => SortKey::Text {
                folded: s.to_lowercase(),
                raw: s.to_string(),
            },
            FieldValue::Date(dt) => SortKey::Date(dt),
            FieldValue::Number(_) | FieldValue::Amount(_) => {
                SortKey::Number(value.magnitude().unwrap_or_default())
            }
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text { folded: a, raw: ra }, SortKey::Text { folded: b, raw: rb }) => {
                a.cmp(b).then_with(|| ra.cmp(rb))
            }
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            // A field always yields the same variant
            _ => Ordering::Equal,
        }
    }
}

/// Stable sort of record references.
///
/// `None` returns the input order unchanged. Records with equal keys keep
/// their relative order in both directions.
pub fn sort_records<'a, R: Record>(items: Vec<&'a R>, sort: Option<Sort<R::Field>>) -> Vec<&'a R> {
    let Some(sort) = sort else {
        return items;
    };

    let mut keyed: Vec<(SortKey, &'a R)> = items
        .into_iter()
        .map(|record| (SortKey::of(record.value(sort.field)), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match sort.direction {
        SortDirection::Asc => a.compare(b),
        SortDirection::Desc => b.compare(a),
    });

    keyed.into_iter().map(|(_, record)| record).collect()
}
