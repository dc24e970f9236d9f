//! Core list processing and business logic for the ftms dashboard
//!
//! - [`query`]: the generic search/filter/sort/paginate pipeline
//! - [`models`]: revenue, loan request, journal entry and report line records
//! - [`view`] and [`dashboard`]: per-view state, fetch generations, mutations
//! - [`backend`]: the REST collaborator (HTTP or JSON fixtures)
//! - [`reports`]: chart, balance and CSV sinks

pub mod backend;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod query;
pub mod reports;
pub mod time;
pub mod types;
pub mod validation;
pub mod view;

pub use backend::{Backend, BackendRef, FetchParams, FetchPayload, FileBackend, HttpBackend, Resource};
pub use dashboard::{Dashboard, EditableRecord, RefreshReport, ViewRecord, ViewSummary};
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use models::{
    JournalEntry, JournalEntryDraft, JournalEntryField, LoanRequest, LoanRequestDraft, LoanRequestField, ReportLine,
    ReportLineField, Revenue, RevenueDraft, RevenueField,
};
pub use query::{
    FieldValue, FilterKind, FilterSpec, FilterValue, ListOutcome, ListQuery, ListSpec, PageInfo, PageRequest, Record,
    Sort, SortDirection,
};
pub use time::{DatePreset, DateRange};
pub use types::{EntryStatus, LoanStatus};
pub use validation::{FieldError, Validate, ValidationErrors};
pub use view::{FetchTicket, ListView, ViewStatus};
