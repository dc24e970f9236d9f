//! Backend collaborator: REST resources, fetch parameters and transports

pub mod file;
pub mod http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ftms_config::{BackendConfig, BackendKind};

use crate::query::{FilterValue, ListQuery, ListSpec, Record};
use crate::view::ServerPage;
use crate::{CoreError, CoreResult};

pub use file::FileBackend;
pub use http::HttpBackend;

/// Shared backend handle
pub type BackendRef = Arc<dyn Backend>;

/// REST resources behind the list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Revenues,
    LoanRequests,
    JournalEntries,
    ReportLines,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Revenues,
        Resource::LoanRequests,
        Resource::JournalEntries,
        Resource::ReportLines,
    ];

    /// Path below `/api/`
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Revenues => "revenues",
            Resource::LoanRequests => "loan-requests",
            Resource::JournalEntries => "journal-entries",
            Resource::ReportLines => "reports/lines",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Resource::Revenues => "Revenue",
            Resource::LoanRequests => "Loan Requests",
            Resource::JournalEntries => "Journal Entries",
            Resource::ReportLines => "Financial Reports",
        }
    }

    /// Fixture file used by the file backend
    pub fn file_name(&self) -> &'static str {
        match self {
            Resource::Revenues => "revenues.json",
            Resource::LoanRequests => "loan-requests.json",
            Resource::JournalEntries => "journal-entries.json",
            Resource::ReportLines => "report-lines.json",
        }
    }

    /// Prefix for ids generated by the file backend
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Resource::Revenues => "REV",
            Resource::LoanRequests => "LN",
            Resource::JournalEntries => "JE",
            Resource::ReportLines => "RPT",
        }
    }

    /// Whether the server returns `{ data, pagination }` pages
    pub fn is_server_paginated(&self) -> bool {
        matches!(self, Resource::JournalEntries)
    }

    /// Whether the resource accepts create/update/delete
    pub fn is_editable(&self) -> bool {
        !matches!(self, Resource::ReportLines)
    }
}

impl std::str::FromStr for Resource {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.path() == s)
            .ok_or_else(|| format!("Unknown resource: {}", s))
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Query-string parameters sent with a fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pairs: Vec<(String, String)>,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Request one server page
    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.pairs.retain(|(k, _)| k != "page" && k != "limit");
        self.push("page", page);
        self.push("limit", limit);
        self
    }

    /// Mirror a client query so hybrid client/server filtering agrees.
    ///
    /// Date ranges become `dateFrom`/`dateTo`, amount ranges `amountMin`/`amountMax`,
    /// multi-selects repeat their key once per selected value. Paging is left to
    /// [`FetchParams::with_page`].
    pub fn from_query<R: Record>(spec: &ListSpec<R>, query: &ListQuery<R::Field>) -> Self {
        let mut params = Self::new();
        if !query.search().is_empty() {
            params.push("search", query.search());
        }
        for (key, value) in query.filters() {
            if spec.filter_spec(key).is_none() {
                continue;
            }
            match value {
                FilterValue::MultiSelect { values } => {
                    for v in values {
                        params.push(key.as_str(), v);
                    }
                }
                FilterValue::DateRange { range } => {
                    if let Some(from) = range.from {
                        params.push("dateFrom", from.format("%Y-%m-%d"));
                    }
                    if let Some(to) = range.to {
                        params.push("dateTo", to.format("%Y-%m-%d"));
                    }
                }
                FilterValue::AmountRange { range } => {
                    if let Some(min) = range.min {
                        params.push("amountMin", min);
                    }
                    if let Some(max) = range.max {
                        params.push("amountMax", max);
                    }
                }
            }
        }
        params
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `page` and `limit` when both are present and valid
    pub fn page(&self) -> Option<(usize, usize)> {
        let page = self.get("page")?.parse::<usize>().ok()?;
        let limit = self.get("limit")?.parse::<usize>().ok()?;
        (page > 0 && limit > 0).then_some((page, limit))
    }
}

/// Body of a list response: a flat array or one server page
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FetchPayload<T> {
    Flat(Vec<T>),
    Paged {
        data: Vec<T>,
        #[serde(default)]
        pagination: Option<ServerPage>,
    },
}

impl<T: DeserializeOwned> FetchPayload<T> {
    pub fn decode(value: serde_json::Value) -> CoreResult<Self> {
        serde_json::from_value(value).map_err(|e| CoreError::Decode {
            message: e.to_string(),
        })
    }

    pub fn into_parts(self) -> (Vec<T>, Option<ServerPage>) {
        match self {
            FetchPayload::Paged { data, pagination } => (data, pagination),
            FetchPayload::Flat(data) => (data, None),
        }
    }
}

/// Transport to the backend REST API
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `GET /api/{resource}?{params}`
    async fn fetch(&self, resource: Resource, params: &FetchParams) -> CoreResult<serde_json::Value>;

    /// `POST /api/{resource}`, returning the created record
    async fn create(&self, resource: Resource, body: serde_json::Value) -> CoreResult<serde_json::Value>;

    /// `PUT /api/{resource}/{id}`, returning the updated record
    async fn update(&self, resource: Resource, id: &str, body: serde_json::Value) -> CoreResult<serde_json::Value>;

    /// `DELETE /api/{resource}/{id}`
    async fn delete(&self, resource: Resource, id: &str) -> CoreResult<()>;
}

/// Build the backend selected in the configuration
pub fn from_config(config: &BackendConfig) -> CoreResult<BackendRef> {
    match config.kind {
        BackendKind::File => {
            log::info!(target: "ftms::backend", "Using file backend at {}", config.data_path.display());
            Ok(Arc::new(FileBackend::new(config.data_path.clone())))
        }
        BackendKind::Http => {
            let backend = HttpBackend::from_config(config)?;
            log::info!(target: "ftms::backend", "Using HTTP backend at {}", backend.base_url());
            Ok(Arc::new(backend))
        }
    }
}
