//! View configuration, query state and the composed pipeline

use serde::Serialize;
use std::collections::BTreeMap;

use super::filter::{matches_search, FilterKind, FilterSpec, FilterValue};
use super::page::{paginate, PageInfo, PageRequest};
use super::sort::{sort_records, Sort, SortDirection};
use super::Record;
use crate::{CoreError, CoreResult};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Per-view configuration of the list pipeline
#[derive(Debug, Clone)]
pub struct ListSpec<R: Record> {
    name: &'static str,
    searchable: Vec<R::Field>,
    filters: Vec<FilterSpec<R::Field>>,
    sortable: Vec<R::Field>,
    default_sort: Option<Sort<R::Field>>,
    page_size: usize,
}

impl<R: Record> ListSpec<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            searchable: vec![],
            filters: vec![],
            sortable: vec![],
            default_sort: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Fields matched by the free-text search
    pub fn searchable(mut self, fields: &[R::Field]) -> Self {
        self.searchable = fields.to_vec();
        self
    }

    pub fn multi_select(self, key: &'static str, field: R::Field) -> Self {
        self.with_filter(key, FilterKind::MultiSelect(field))
    }

    pub fn date_range(self, key: &'static str, field: R::Field) -> Self {
        self.with_filter(key, FilterKind::DateRange(field))
    }

    pub fn amount_range(self, key: &'static str, field: R::Field) -> Self {
        self.with_filter(key, FilterKind::AmountRange(field))
    }

    fn with_filter(mut self, key: &'static str, kind: FilterKind<R::Field>) -> Self {
        self.filters.retain(|f| f.key != key);
        self.filters.push(FilterSpec { key, kind });
        self
    }

    pub fn sortable(mut self, fields: &[R::Field]) -> Self {
        self.sortable = fields.to_vec();
        self
    }

    pub fn default_sort(mut self, field: R::Field, direction: SortDirection) -> Self {
        self.default_sort = Some(Sort { field, direction });
        self
    }

    /// Default page size; zero is ignored
    pub fn page_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.page_size = size;
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn searchable_fields(&self) -> &[R::Field] {
        &self.searchable
    }

    pub fn filters(&self) -> &[FilterSpec<R::Field>] {
        &self.filters
    }

    pub fn filter_spec(&self, key: &str) -> Option<&FilterSpec<R::Field>> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn sortable_fields(&self) -> &[R::Field] {
        &self.sortable
    }

    pub fn is_sortable(&self, field: R::Field) -> bool {
        self.sortable.contains(&field)
    }

    pub fn default_page_size(&self) -> usize {
        self.page_size
    }

    /// Fresh query: no search, no filters, default sort, first page
    pub fn new_query(&self) -> ListQuery<R::Field> {
        ListQuery {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: self.default_sort,
            page: PageRequest {
                index: 1,
                size: self.page_size,
            },
        }
    }

    /// Case-insensitive substring match of the query's search term over the searchable fields
    pub fn matches_search(&self, record: &R, query: &ListQuery<R::Field>) -> bool {
        matches_search(record, &self.searchable, &query.search.to_lowercase())
    }

    /// Check a record against every active filter of the query
    pub fn matches_filters(&self, record: &R, query: &ListQuery<R::Field>) -> bool {
        query.filters.iter().all(|(key, value)| match self.filter_spec(key) {
            Some(spec) => value.matches(record, spec.kind.field()),
            None => true,
        })
    }

    /// Filter stage: search AND structured filters, input order preserved
    pub fn filter<'a>(&self, items: &'a [R], query: &ListQuery<R::Field>) -> Vec<&'a R> {
        let term = query.search.to_lowercase();
        items
            .iter()
            .filter(|record| matches_search(*record, &self.searchable, &term))
            .filter(|record| self.matches_filters(record, query))
            .collect()
    }

    /// Run filter, sort and paginate over `items`
    pub fn run<'a>(&self, items: &'a [R], query: &ListQuery<R::Field>) -> ListOutcome<'a, R> {
        let filtered = self.filter(items, query);
        let all = sort_records(filtered, query.sort);
        let (page_items, page) = paginate(&all, query.page);

        log::debug!(
            target: "ftms::query",
            "{}: {} raw, {} matched, page {}/{}",
            self.name,
            items.len(),
            all.len(),
            page.index,
            page.total_pages
        );

        ListOutcome {
            items: page_items.to_vec(),
            all,
            page,
            sort: query.sort,
        }
    }
}

/// Search, filter, sort and page state of one list view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery<F> {
    search: String,
    filters: BTreeMap<String, FilterValue>,
    sort: Option<Sort<F>>,
    page: PageRequest,
}

impl<F: Copy + PartialEq + std::fmt::Display> ListQuery<F> {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter_value(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    pub fn sort(&self) -> Option<Sort<F>> {
        self.sort
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    fn reset_page(&mut self) {
        self.page.index = 1;
    }

    /// Change the search term; goes back to page 1
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.reset_page();
    }

    /// Set a declared filter. Unknown keys and mismatched value shapes are rejected;
    /// an inactive value removes the filter. Goes back to page 1.
    pub fn set_filter<R>(&mut self, spec: &ListSpec<R>, key: &str, value: FilterValue) -> CoreResult<()>
    where
        R: Record<Field = F>,
    {
        let filter = spec.filter_spec(key).ok_or_else(|| CoreError::UnknownFilter {
            key: key.to_string(),
        })?;
        if !value.fits(&filter.kind) {
            return Err(CoreError::InvalidFilter {
                key: key.to_string(),
                message: format!("expected a {} value", filter.kind.name()),
            });
        }
        match &value {
            FilterValue::DateRange { range } => {
                if let (Some(from), Some(to)) = (range.from, range.to) {
                    if from > to {
                        return Err(CoreError::InvalidFilter {
                            key: key.to_string(),
                            message: format!("start date {} is after end date {}", from, to),
                        });
                    }
                }
            }
            FilterValue::AmountRange { range } => {
                if let (Some(min), Some(max)) = (range.min, range.max) {
                    if min > max {
                        return Err(CoreError::InvalidFilter {
                            key: key.to_string(),
                            message: format!("minimum {} is above maximum {}", min, max),
                        });
                    }
                }
            }
            FilterValue::MultiSelect { .. } => {}
        }

        if value.is_active() {
            self.filters.insert(key.to_string(), value);
        } else {
            self.filters.remove(key);
        }
        self.reset_page();
        Ok(())
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.remove(key);
        self.reset_page();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.reset_page();
    }

    /// Set or clear the sort; the field must be sortable in `spec`
    pub fn set_sort<R>(&mut self, spec: &ListSpec<R>, sort: Option<Sort<F>>) -> CoreResult<()>
    where
        R: Record<Field = F>,
    {
        if let Some(sort) = sort {
            if !spec.is_sortable(sort.field) {
                return Err(CoreError::UnknownSortField {
                    field: sort.field.to_string(),
                });
            }
        }
        self.sort = sort;
        self.reset_page();
        Ok(())
    }

    /// Header click on `field`
    pub fn toggle_sort<R>(&mut self, spec: &ListSpec<R>, field: F) -> CoreResult<()>
    where
        R: Record<Field = F>,
    {
        let next = Sort::toggle(self.sort, field);
        self.set_sort(spec, Some(next))
    }

    /// Select a page; the index is clamped when the pipeline runs
    pub fn set_page(&mut self, index: usize) {
        self.page.index = index.max(1);
    }

    /// Change the page size; goes back to page 1
    pub fn set_page_size(&mut self, size: usize) -> CoreResult<()> {
        self.page = PageRequest::first(size)?;
        Ok(())
    }

    /// Clamp the stored page index against a result count
    pub fn clamp_page(&mut self, count: usize) {
        self.page = self.page.clamp(count);
    }
}

/// Derived sequences for one run of the pipeline
#[derive(Debug, Clone)]
pub struct ListOutcome<'a, R: Record> {
    /// Current page, for the table
    pub items: Vec<&'a R>,
    /// Every filtered item in sorted order, for charts and exports
    pub all: Vec<&'a R>,
    pub page: PageInfo,
    pub sort: Option<Sort<R::Field>>,
}

impl<'a, R: Record> ListOutcome<'a, R> {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
