//! Record routes - create, update and delete for the editable views
//!
//! Drafts are validated before anything reaches the backend; field errors
//! come back as 422 with one entry per field.

pub mod api;

pub use api::{api_create, api_delete, api_loan_status, api_update};
