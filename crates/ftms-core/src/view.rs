//! Per-view state: raw items, query, load status and fetch generations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{ListOutcome, ListQuery, ListSpec, Record};
use crate::CoreError;

/// Load state of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum ViewStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl ViewStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewStatus::Loading)
    }
}

/// Pagination metadata reported by a server-paginated resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPage {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Handle for one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One list view instance.
///
/// The stored query is the view's standing scope: refreshes send it to the
/// backend as fetch parameters and [`ListView::snapshot`] runs it. Request
/// handlers leave it alone and pass their own query to [`ListView::run`].
#[derive(Debug)]
pub struct ListView<R: Record> {
    spec: ListSpec<R>,
    items: Vec<R>,
    query: ListQuery<R::Field>,
    status: ViewStatus,
    server_page: Option<ServerPage>,
    loaded_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl<R: Record> ListView<R> {
    pub fn new(spec: ListSpec<R>) -> Self {
        let query = spec.new_query();
        Self {
            spec,
            items: Vec::new(),
            query,
            status: ViewStatus::Idle,
            server_page: None,
            loaded_at: None,
            generation: 0,
        }
    }

    pub fn spec(&self) -> &ListSpec<R> {
        &self.spec
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn query(&self) -> &ListQuery<R::Field> {
        &self.query
    }

    /// Mutable standing query; the next refresh sends its filters to the backend
    pub fn query_mut(&mut self) -> &mut ListQuery<R::Field> {
        &mut self.query
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn server_page(&self) -> Option<ServerPage> {
        self.server_page
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// Issue a new fetch; any earlier ticket becomes stale
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = ViewStatus::Loading;
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Replace the raw items if `ticket` is the latest fetch.
    ///
    /// Returns false when the response was stale and discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, items: Vec<R>, server_page: Option<ServerPage>) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                target: "ftms::view",
                "{}: discarding stale response (generation {} < {})",
                self.spec.name(),
                ticket.generation,
                self.generation
            );
            return false;
        }
        log::debug!(target: "ftms::view", "{}: loaded {} items", self.spec.name(), items.len());
        self.items = items;
        self.server_page = server_page;
        self.status = ViewStatus::Ready;
        self.loaded_at = Some(Utc::now());
        let count = self.spec.filter(&self.items, &self.query).len();
        self.query.clamp_page(count);
        true
    }

    /// Record a failed fetch if `ticket` is the latest; previous items stay displayed
    pub fn fail_fetch(&mut self, ticket: FetchTicket, error: &CoreError) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                target: "ftms::view",
                "{}: discarding stale failure: {}",
                self.spec.name(),
                error
            );
            return false;
        }
        self.status = ViewStatus::Failed(error.to_string());
        true
    }

    /// Run the pipeline with the view's own query
    pub fn snapshot(&self) -> ListOutcome<'_, R> {
        self.spec.run(&self.items, &self.query)
    }

    /// Run the pipeline with a caller-supplied query
    pub fn run(&self, query: &ListQuery<R::Field>) -> ListOutcome<'_, R> {
        self.spec.run(&self.items, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixtures::{ids, row, spec, Row};

    fn rows(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| row(&format!("r{}", i), "name", "open", "2024-01-01", i as f64))
            .collect()
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut view = ListView::new(spec());
        let first = view.begin_fetch();
        let second = view.begin_fetch();
        assert!(view.complete_fetch(second, rows(2), None));
        assert!(!view.complete_fetch(first, rows(5), None));
        assert_eq!(view.items().len(), 2);
        assert_eq!(view.status(), &ViewStatus::Ready);
    }

    #[test]
    fn test_stale_failure_ignored() {
        let mut view = ListView::new(spec());
        let first = view.begin_fetch();
        let second = view.begin_fetch();
        assert!(view.complete_fetch(second, rows(1), None));
        let err = CoreError::Network { message: "timeout".to_string() };
        assert!(!view.fail_fetch(first, &err));
        assert_eq!(view.status(), &ViewStatus::Ready);
    }

    #[test]
    fn test_failure_keeps_items() {
        let mut view = ListView::new(spec());
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, rows(3), None);
        let ticket = view.begin_fetch();
        assert!(view.status().is_loading());
        view.fail_fetch(ticket, &CoreError::Network { message: "down".to_string() });
        assert!(matches!(view.status(), ViewStatus::Failed(m) if m.contains("down")));
        assert_eq!(view.items().len(), 3);
    }

    #[test]
    fn test_refetch_clamps_page() {
        let mut view = ListView::new(spec());
        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, rows(25), None);
        view.query_mut().set_page(3);
        assert_eq!(view.snapshot().page.index, 3);

        let ticket = view.begin_fetch();
        view.complete_fetch(ticket, rows(4), None);
        assert_eq!(view.query().page().index, 1);
        assert_eq!(ids(&view.snapshot().items), vec!["r1", "r2", "r3", "r4"]);
    }
}
