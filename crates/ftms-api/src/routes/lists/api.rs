//! List API endpoints - JSON, CSV and chart data
//!
//! Endpoints:
//! - api_list: One page of a view with page info, sort and load status (JSON)
//! - api_export: Every filtered row as CSV
//! - api_chart: Grouped or monthly totals over the filtered rows (JSON)
//! - api_balance: Debit/credit check over the filtered journal entries (JSON)

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use ftms_core::query::parse_field;
use ftms_core::reports::{self, BalanceCheck, ChartData};
use ftms_core::view::ServerPage;
use ftms_core::{JournalEntry, ListQuery, PageInfo, Sort, ViewRecord, ViewStatus};

use super::{parse_params, today};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Response body of `GET /api/{view}`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<'a, R: ViewRecord> {
    resource: &'static str,
    items: Vec<&'a R>,
    page: PageInfo,
    sort: Option<Sort<R::Field>>,
    query: &'a ListQuery<R::Field>,
    status: &'a ViewStatus,
    loaded_at: Option<DateTime<Utc>>,
    server_pagination: Option<ServerPage>,
}

/// Get one page of a view (JSON API)
pub async fn api_list<R: ViewRecord>(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Value>> {
    let view = R::view(&state.dashboard).read().await;
    let query = parse_params(view.spec(), &params, &[], &state)?;
    let outcome = view.run(&query);

    let body = serde_json::to_value(ListResponse::<R> {
        resource: R::RESOURCE.path(),
        items: outcome.items,
        page: outcome.page,
        sort: outcome.sort,
        query: &query,
        status: view.status(),
        loaded_at: view.loaded_at(),
        server_pagination: view.server_page(),
    })?;
    Ok(Json(body))
}

/// Export every filtered row in sorted order (CSV)
pub async fn api_export<R: ViewRecord>(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<impl IntoResponse> {
    let view = R::view(&state.dashboard).read().await;
    let query = parse_params(view.spec(), &params, &[], &state)?;
    let outcome = view.run(&query);
    let csv = reports::to_csv(&outcome.all);

    log::info!(target: "ftms::api", "Exported {} {} rows", outcome.all.len(), R::RESOURCE);

    let file_name = format!("{}-{}.csv", R::RESOURCE.path().replace('/', "-"), today().format("%Y%m%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        csv,
    ))
}

/// Chart data over the filtered rows.
///
/// `group=month` sums the amount column per month of the view's date column;
/// any other value names the text column to group by.
pub async fn api_chart<R: ViewRecord>(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<ChartData>> {
    let group = params
        .iter()
        .rev()
        .find(|(k, v)| k == "group" && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .ok_or_else(|| ApiError::bad_request("Missing 'group' parameter"))?;

    let view = R::view(&state.dashboard).read().await;
    let query = parse_params(view.spec(), &params, &["group"], &state)?;
    let outcome = view.run(&query);

    let chart = if group == "month" {
        let date = R::DATE_FIELD
            .ok_or_else(|| ApiError::bad_request(format!("{} has no date column", R::RESOURCE.title())))?;
        reports::monthly_totals(&outcome.all, date, R::AMOUNT_FIELD)
    } else {
        let field = parse_field::<R::Field>(&group)
            .map_err(|_| ApiError::bad_request(format!("Unknown column: {}", group)))?;
        reports::grouped_totals(&outcome.all, field, R::AMOUNT_FIELD)
    };
    Ok(Json(chart))
}

/// Debit/credit totals of the filtered journal entries
pub async fn api_balance(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<BalanceCheck>> {
    let view = JournalEntry::view(&state.dashboard).read().await;
    let query = parse_params(view.spec(), &params, &[], &state)?;
    let outcome = view.run(&query);
    Ok(Json(BalanceCheck::of(&outcome.all)))
}
