//! Client-side list processing shared by every list view
//!
//! A view declares a [`ListSpec`] once (searchable fields, typed filters,
//! sortable fields, default page size). Each request or user interaction
//! produces a [`ListQuery`], and [`ListSpec::run`] recomputes the derived
//! sequences from the raw items:
//!
//! 1. filter: free-text search OR'd across the searchable fields, AND'd with
//!    every active structured filter
//! 2. sort: stable, by one field and direction
//! 3. paginate: clamp the page index, then slice
//!
//! Charts and exports read [`ListOutcome::all`]; tables read [`ListOutcome::items`].

pub mod filter;
pub mod list;
pub mod page;
pub mod sort;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

pub use filter::{AmountRange, FilterKind, FilterSpec, FilterValue};
pub use list::{ListOutcome, ListQuery, ListSpec};
pub use page::{paginate, total_pages, PageInfo, PageRequest};
pub use sort::{sort_records, Sort, SortDirection};

/// A row of domain data flowing through the list pipeline
pub trait Record {
    /// Columns of the record, named by their wire key
    type Field: Copy + Eq + Hash + Debug + Display + FromStr + Serialize + Send + Sync + 'static;

    /// Stable identifier of the record
    fn id(&self) -> &str;

    /// Typed value of a column
    fn value(&self, field: Self::Field) -> FieldValue<'_>;

    /// Columns in table/export order
    fn columns() -> &'static [Self::Field];
}

/// Typed column value as seen by search, filters and sorting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    /// Parsed date or timestamp; `None` when the source value is malformed
    Date(Option<NaiveDateTime>),
    /// Plain numeric value compared as-is
    Number(f64),
    /// Signed money value compared by magnitude
    Amount(f64),
}

impl<'a> FieldValue<'a> {
    /// String form used by free-text search and multi-select membership
    pub fn as_text(&self) -> Cow<'a, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(*s),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Calendar date of a date value
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(dt) => dt.map(|d| d.date()),
            _ => None,
        }
    }

    /// Value used by amount ranges and numeric sorting.
    ///
    /// Signed amounts compare by absolute value so debits, credits and
    /// deductions line up.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Amount(n) => Some(n.abs()),
            _ => None,
        }
    }
}

impl Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(Some(dt)) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            FieldValue::Date(None) => Ok(()),
            FieldValue::Number(n) | FieldValue::Amount(n) => write!(f, "{}", n),
        }
    }
}

/// Parse a field name, reporting unknown names as a sort error
pub fn parse_field<F: FromStr>(name: &str) -> crate::CoreResult<F> {
    name.parse::<F>().map_err(|_| crate::CoreError::UnknownSortField {
        field: name.to_string(),
    })
}
