//! List view routes - shared by revenues, loan requests, journal entries and report lines
//!
//! Features:
//! - Search, structured filters, stable sort and pagination from URL parameters
//! - HTMX partial table updates with sort indicators
//! - CSV export and chart data over the filtered set
//!
//! Structure:
//! - params.rs: URL parameters <-> ListQuery
//! - api.rs: JSON and CSV endpoints
//! - page.rs: Full page and HTMX table rendering

pub mod api;
pub mod page;
pub mod params;

use chrono::NaiveDate;

use ftms_core::{CoreResult, ListQuery, ListSpec, Record};

use crate::AppState;

pub use api::{api_balance, api_chart, api_export, api_list};
pub use page::{htmx_list, page_list};

/// Local calendar date used to resolve date presets
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse request parameters against a view spec and the configured page limits
pub(crate) fn parse_params<R: Record>(
    spec: &ListSpec<R>,
    pairs: &[(String, String)],
    extra_keys: &[&str],
    state: &AppState,
) -> CoreResult<ListQuery<R::Field>> {
    params::parse_list_query(spec, pairs, extra_keys, &state.config.pagination, today())
}
