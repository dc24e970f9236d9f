//! Record mutation endpoints
//!
//! Endpoints:
//! - api_create: Validate a draft and create the record (201)
//! - api_update: Validate a draft and update the record
//! - api_delete: Delete the record (204)
//! - api_loan_status: Move a loan request through its lifecycle

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use ftms_core::{EditableRecord, LoanRequest, LoanStatus, Record};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Create a record from a draft (JSON API)
pub async fn api_create<R: EditableRecord>(
    State(state): State<AppState>,
    Json(draft): Json<R::Draft>,
) -> ApiResult<(StatusCode, Json<R>)> {
    let created = state.dashboard.create::<R>(&draft).await?;
    log::info!(target: "ftms::api", "Created {} {}", R::RESOURCE, created.id());
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a record from a draft (JSON API)
pub async fn api_update<R: EditableRecord>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<R::Draft>,
) -> ApiResult<Json<R>> {
    let updated = state.dashboard.update::<R>(&id, &draft).await?;
    log::info!(target: "ftms::api", "Updated {} {}", R::RESOURCE, id);
    Ok(Json(updated))
}

/// Delete a record (JSON API)
pub async fn api_delete<R: EditableRecord>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.dashboard.delete::<R>(&id).await?;
    log::info!(target: "ftms::api", "Deleted {} {}", R::RESOURCE, id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// Approve, reject, disburse or close a loan request
pub async fn api_loan_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<LoanRequest>> {
    let status: LoanStatus = change.status.parse().map_err(ApiError::bad_request)?;
    let updated = state.dashboard.set_loan_status(&id, status).await?;
    Ok(Json(updated))
}
