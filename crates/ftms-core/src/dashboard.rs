//! Dashboard service: one list view per resource plus backend mutations

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use ftms_config::PaginationConfig;

use crate::backend::{BackendRef, FetchParams, FetchPayload, Resource};
use crate::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use crate::models::{
    JournalEntry, JournalEntryDraft, JournalEntryField, LoanRequest, LoanRequestDraft, LoanRequestField, ReportLine,
    ReportLineField, Revenue, RevenueDraft, RevenueField,
};
use crate::query::{ListSpec, Record};
use crate::reports::BalanceCheck;
use crate::types::LoanStatus;
use crate::validation::Validate;
use crate::view::{ListView, ServerPage, ViewStatus};
use crate::{CoreError, CoreResult};

/// Upper bound on pages pulled from a server-paginated resource in one refresh
const MAX_SERVER_PAGES: usize = 1000;

/// A record type with its own list view on the dashboard
pub trait ViewRecord: Record + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    /// Column summed by charts
    const AMOUNT_FIELD: Self::Field;

    /// Column used for monthly charts, if the record is dated
    const DATE_FIELD: Option<Self::Field>;

    /// Canonical list configuration of the view
    fn spec() -> ListSpec<Self>;

    /// The dashboard's view for this record type
    fn view(dashboard: &Dashboard) -> &RwLock<ListView<Self>>;

    /// Column heading
    fn column_label(field: Self::Field) -> &'static str;

    /// Debit/credit cross-check for views that carry one
    fn balance(_items: &[&Self]) -> Option<BalanceCheck> {
        None
    }
}

/// A record type the dashboard can create, edit and delete
pub trait EditableRecord: ViewRecord {
    type Draft: Validate + Serialize + DeserializeOwned + Send + Sync;

    /// JSON body sent when creating a record from a draft
    fn create_body(draft: &Self::Draft) -> CoreResult<Value> {
        draft_body(draft)
    }

    /// JSON body sent when updating a record; unset fields keep their stored value
    fn update_body(draft: &Self::Draft) -> CoreResult<Value> {
        draft_body(draft)
    }
}

/// Serialize a draft, leaving unset fields out
pub fn draft_body<D: Serialize>(draft: &D) -> CoreResult<Value> {
    let mut value = serde_json::to_value(draft)?;
    if let Value::Object(fields) = &mut value {
        fields.retain(|_, v| !v.is_null());
    }
    Ok(value)
}

impl ViewRecord for Revenue {
    const RESOURCE: Resource = Resource::Revenues;
    const AMOUNT_FIELD: Self::Field = RevenueField::Amount;
    const DATE_FIELD: Option<Self::Field> = Some(RevenueField::Date);

    fn spec() -> ListSpec<Self> {
        Revenue::list_spec()
    }

    fn view(dashboard: &Dashboard) -> &RwLock<ListView<Self>> {
        &dashboard.revenues
    }

    fn column_label(field: Self::Field) -> &'static str {
        field.label()
    }
}

impl EditableRecord for Revenue {
    type Draft = RevenueDraft;
}

impl ViewRecord for LoanRequest {
    const RESOURCE: Resource = Resource::LoanRequests;
    const AMOUNT_FIELD: Self::Field = LoanRequestField::Amount;
    const DATE_FIELD: Option<Self::Field> = Some(LoanRequestField::RequestDate);

    fn spec() -> ListSpec<Self> {
        LoanRequest::list_spec()
    }

    fn view(dashboard: &Dashboard) -> &RwLock<ListView<Self>> {
        &dashboard.loan_requests
    }

    fn column_label(field: Self::Field) -> &'static str {
        field.label()
    }
}

impl EditableRecord for LoanRequest {
    type Draft = LoanRequestDraft;

    /// New requests always start out pending
    fn create_body(draft: &Self::Draft) -> CoreResult<Value> {
        let mut body = draft_body(draft)?;
        body["status"] = Value::String(LoanStatus::Pending.to_string());
        Ok(body)
    }
}

impl ViewRecord for JournalEntry {
    const RESOURCE: Resource = Resource::JournalEntries;
    const AMOUNT_FIELD: Self::Field = JournalEntryField::Amount;
    const DATE_FIELD: Option<Self::Field> = Some(JournalEntryField::Date);

    fn spec() -> ListSpec<Self> {
        JournalEntry::list_spec()
    }

    fn view(dashboard: &Dashboard) -> &RwLock<ListView<Self>> {
        &dashboard.journal_entries
    }

    fn column_label(field: Self::Field) -> &'static str {
        field.label()
    }

    fn balance(items: &[&Self]) -> Option<BalanceCheck> {
        Some(BalanceCheck::of(items))
    }
}

impl EditableRecord for JournalEntry {
    type Draft = JournalEntryDraft;

    /// Both sides are always sent so the side not in use is zeroed
    fn update_body(draft: &Self::Draft) -> CoreResult<Value> {
        let mut body = draft_body(draft)?;
        body["debit"] = serde_json::json!(draft.debit.unwrap_or(0.0));
        body["credit"] = serde_json::json!(draft.credit.unwrap_or(0.0));
        Ok(body)
    }
}

impl ViewRecord for ReportLine {
    const RESOURCE: Resource = Resource::ReportLines;
    const AMOUNT_FIELD: Self::Field = ReportLineField::Amount;
    const DATE_FIELD: Option<Self::Field> = None;

    fn spec() -> ListSpec<Self> {
        ReportLine::list_spec()
    }

    fn view(dashboard: &Dashboard) -> &RwLock<ListView<Self>> {
        &dashboard.report_lines
    }

    fn column_label(field: Self::Field) -> &'static str {
        field.label()
    }
}

/// Load state of one view, for health and status displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub resource: String,
    pub status: ViewStatus,
    pub items: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Outcome of refreshing every view
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub loaded: Vec<(Resource, usize)>,
    pub failed: Vec<(Resource, CoreError)>,
}

impl RefreshReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the backend and the four list views
pub struct Dashboard {
    backend: BackendRef,
    revenues: RwLock<ListView<Revenue>>,
    loan_requests: RwLock<ListView<LoanRequest>>,
    journal_entries: RwLock<ListView<JournalEntry>>,
    report_lines: RwLock<ListView<ReportLine>>,
    /// Page size requested from server-paginated resources
    server_limit: usize,
    error_logger: DefaultErrorLogger,
}

impl Dashboard {
    pub fn new(backend: BackendRef, pagination: &PaginationConfig) -> Self {
        let size = pagination.records_per_page;
        Self {
            backend,
            revenues: RwLock::new(ListView::new(Revenue::spec().page_size(size))),
            loan_requests: RwLock::new(ListView::new(LoanRequest::spec().page_size(size))),
            journal_entries: RwLock::new(ListView::new(JournalEntry::spec().page_size(size))),
            report_lines: RwLock::new(ListView::new(ReportLine::spec().page_size(size))),
            server_limit: pagination.max_page_size.max(1),
            error_logger: DefaultErrorLogger,
        }
    }

    pub fn backend(&self) -> &BackendRef {
        &self.backend
    }

    pub fn view<R: ViewRecord>(&self) -> &RwLock<ListView<R>> {
        R::view(self)
    }

    /// Refetch one view, sending the view's standing query as fetch parameters.
    ///
    /// The view lock is only held to issue the ticket and to apply the
    /// result, never across the backend call. A response that arrives after
    /// a newer refresh was issued is discarded.
    pub async fn refresh<R: ViewRecord>(&self) -> CoreResult<usize> {
        let (ticket, params) = {
            let mut view = R::view(self).write().await;
            let params = FetchParams::from_query(view.spec(), view.query());
            (view.begin_fetch(), params)
        };
        let result = self.load::<R>(params).await;

        let mut view = R::view(self).write().await;
        match result {
            Ok((items, server_page)) => {
                let count = items.len();
                if view.complete_fetch(ticket, items, server_page) {
                    log::info!(target: "ftms::view", "Loaded {} {}", count, R::RESOURCE);
                }
                Ok(count)
            }
            Err(e) => {
                self.error_logger
                    .log_error(&e, &ErrorContext::new(format!("refresh {}", R::RESOURCE)));
                view.fail_fetch(ticket, &e);
                Err(e)
            }
        }
    }

    async fn load<R: ViewRecord>(&self, base: FetchParams) -> CoreResult<(Vec<R>, Option<ServerPage>)> {
        if !R::RESOURCE.is_server_paginated() {
            let value = self.backend.fetch(R::RESOURCE, &base).await?;
            return Ok(FetchPayload::<R>::decode(value)?.into_parts());
        }

        // Pull every server page so the client pipeline works on the full set
        let mut items = Vec::new();
        let mut last = None;
        for page in 1..=MAX_SERVER_PAGES {
            let params = base.clone().with_page(page, self.server_limit);
            let value = self.backend.fetch(R::RESOURCE, &params).await?;
            let (mut batch, info) = FetchPayload::<R>::decode(value)?.into_parts();
            let received = batch.len();
            items.append(&mut batch);
            last = info;
            match info {
                Some(info) if received > 0 && items.len() < info.total => continue,
                _ => break,
            }
        }
        Ok((items, last))
    }

    /// Refresh the view backed by `resource`
    pub async fn refresh_resource(&self, resource: Resource) -> CoreResult<usize> {
        match resource {
            Resource::Revenues => self.refresh::<Revenue>().await,
            Resource::LoanRequests => self.refresh::<LoanRequest>().await,
            Resource::JournalEntries => self.refresh::<JournalEntry>().await,
            Resource::ReportLines => self.refresh::<ReportLine>().await,
        }
    }

    /// Refresh every view; failures are collected per view
    pub async fn refresh_all(&self) -> RefreshReport {
        let (revenues, loans, journal, reports) = tokio::join!(
            self.refresh::<Revenue>(),
            self.refresh::<LoanRequest>(),
            self.refresh::<JournalEntry>(),
            self.refresh::<ReportLine>(),
        );

        let mut report = RefreshReport::default();
        for (resource, result) in [
            (Resource::Revenues, revenues),
            (Resource::LoanRequests, loans),
            (Resource::JournalEntries, journal),
            (Resource::ReportLines, reports),
        ] {
            match result {
                Ok(count) => report.loaded.push((resource, count)),
                Err(e) => report.failed.push((resource, e)),
            }
        }
        report
    }

    /// Validate locally, create on the backend, then refetch the view
    pub async fn create<R: EditableRecord>(&self, draft: &R::Draft) -> CoreResult<R> {
        draft.validate()?;
        let body = R::create_body(draft)?;
        let value = self.backend.create(R::RESOURCE, body).await?;
        let created: R = serde_json::from_value(value)?;
        self.refetch_after_change::<R>().await;
        Ok(created)
    }

    /// Validate locally, update on the backend, then refetch the view
    pub async fn update<R: EditableRecord>(&self, id: &str, draft: &R::Draft) -> CoreResult<R> {
        draft.validate()?;
        let body = R::update_body(draft)?;
        let value = self.backend.update(R::RESOURCE, id, body).await?;
        let updated: R = serde_json::from_value(value)?;
        self.refetch_after_change::<R>().await;
        Ok(updated)
    }

    pub async fn delete<R: EditableRecord>(&self, id: &str) -> CoreResult<()> {
        self.backend.delete(R::RESOURCE, id).await?;
        self.refetch_after_change::<R>().await;
        Ok(())
    }

    /// Move a loan request to `status` if the transition is allowed
    pub async fn set_loan_status(&self, id: &str, status: LoanStatus) -> CoreResult<LoanRequest> {
        {
            let view = self.loan_requests.read().await;
            let loan = view.find(id).ok_or_else(|| CoreError::NotFound {
                resource: Resource::LoanRequests.title().to_string(),
                id: id.to_string(),
            })?;
            loan.check_transition(status)?;
        }

        let body = serde_json::json!({ "status": status });
        let value = self.backend.update(Resource::LoanRequests, id, body).await?;
        let updated: LoanRequest = serde_json::from_value(value)?;
        log::info!(target: "ftms::view", "Loan request {} is now {}", id, status);
        self.refetch_after_change::<LoanRequest>().await;
        Ok(updated)
    }

    /// The mutation already succeeded; a failed refetch only leaves the view stale
    async fn refetch_after_change<R: ViewRecord>(&self) {
        if let Err(e) = self.refresh::<R>().await {
            log::warn!(target: "ftms::view", "Refetch of {} after change failed: {}", R::RESOURCE, e);
        }
    }

    async fn summary<R: ViewRecord>(&self) -> ViewSummary {
        let view = R::view(self).read().await;
        ViewSummary {
            resource: R::RESOURCE.path().to_string(),
            status: view.status().clone(),
            items: view.items().len(),
            loaded_at: view.loaded_at(),
        }
    }

    pub async fn summaries(&self) -> Vec<ViewSummary> {
        vec![
            self.summary::<Revenue>().await,
            self.summary::<LoanRequest>().await,
            self.summary::<JournalEntry>().await,
            self.summary::<ReportLine>().await,
        ]
    }
}
