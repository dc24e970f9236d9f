//! Route modules for the API server
//!
//! - lists: per-view list, export, chart and page routes
//! - records: create, update, delete and loan status changes
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints
//! - page.rs: HTMX page rendering

pub mod lists;
pub mod records;
