//! URL query parameters <-> ListQuery
//!
//! Parameter layout per view:
//! - `q`: free-text search
//! - `sort`, `dir`: sort column and direction (`sort=none` clears the sort)
//! - `page`, `size`: 1-based page index and page size
//! - `{key}`: multi-select filter, comma-separated or repeated; once a key repeats
//!   each occurrence is one literal value (an empty repeat keeps commas intact)
//! - `{key}From`, `{key}To`, `{key}Preset`: date-range filter
//! - `{key}Min`, `{key}Max`: amount-range filter

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use ftms_config::PaginationConfig;
use ftms_core::query::{parse_field, AmountRange};
use ftms_core::{
    CoreError, CoreResult, DatePreset, DateRange, FilterKind, FilterValue, ListQuery, ListSpec, Record, Sort,
    SortDirection,
};

const BASE_KEYS: [&str; 5] = ["q", "sort", "dir", "page", "size"];

/// Collect raw pairs by key; later values of single-valued keys win
struct Params<'a> {
    values: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> Params<'a> {
    fn new(pairs: &'a [(String, String)]) -> Self {
        let mut values: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (key, value) in pairs {
            values.entry(key.as_str()).or_default().push(value.trim());
        }
        Self { values }
    }

    /// Last non-empty value of `key`
    fn last(&self, key: &str) -> Option<&'a str> {
        self.values
            .get(key)
            .and_then(|vs| vs.iter().rev().find(|v| !v.is_empty()).copied())
    }

    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Every value of `key`: a lone value is split on commas, repeated values are literal
    fn all(&self, key: &str) -> Vec<&'a str> {
        match self.values.get(key).map(Vec::as_slice) {
            Some([single]) => single.split(',').map(str::trim).filter(|v| !v.is_empty()).collect(),
            Some(vs) => vs.iter().copied().filter(|v| !v.is_empty()).collect(),
            None => Vec::new(),
        }
    }
}

/// Query keys a filter of the given kind reads
fn filter_keys<F>(key: &str, kind: &FilterKind<F>) -> Vec<String> {
    match kind {
        FilterKind::MultiSelect(_) => vec![key.to_string()],
        FilterKind::DateRange(_) => vec![format!("{}From", key), format!("{}To", key), format!("{}Preset", key)],
        FilterKind::AmountRange(_) => vec![format!("{}Min", key), format!("{}Max", key)],
    }
}

/// Build a list query from URL pairs.
///
/// Keys not declared by the view (and not in `extra_keys`) are rejected.
/// Malformed dates and numbers leave their bound open; a malformed page
/// index means the first page.
pub fn parse_list_query<R: Record>(
    spec: &ListSpec<R>,
    pairs: &[(String, String)],
    extra_keys: &[&str],
    pagination: &PaginationConfig,
    today: NaiveDate,
) -> CoreResult<ListQuery<R::Field>> {
    let params = Params::new(pairs);

    let mut known: BTreeSet<String> = BASE_KEYS.iter().chain(extra_keys).map(|k| k.to_string()).collect();
    for filter in spec.filters() {
        known.extend(filter_keys(filter.key, &filter.kind));
    }
    if let Some(unknown) = params.values.keys().find(|k| !known.contains(**k)) {
        return Err(CoreError::UnknownFilter {
            key: unknown.to_string(),
        });
    }

    let mut query = spec.new_query();

    if let Some(size) = params.last("size") {
        match size.parse::<usize>() {
            Ok(size) if size == 0 || size > pagination.max_page_size => {
                return Err(CoreError::InvalidPageSize { size });
            }
            Ok(size) => query.set_page_size(size)?,
            Err(_) => log::warn!(target: "ftms::api", "Ignoring malformed page size: {}", size),
        }
    }

    if let Some(term) = params.last("q") {
        query.set_search(term);
    }

    for filter in spec.filters() {
        let value = match filter.kind {
            FilterKind::MultiSelect(_) => {
                if !params.has(filter.key) {
                    continue;
                }
                FilterValue::multi_select(params.all(filter.key))
            }
            FilterKind::DateRange(_) => {
                let from_key = format!("{}From", filter.key);
                let to_key = format!("{}To", filter.key);
                let preset_key = format!("{}Preset", filter.key);
                if !(params.has(&from_key) || params.has(&to_key) || params.has(&preset_key)) {
                    continue;
                }
                let mut range = match params.last(&preset_key) {
                    Some(preset) => preset
                        .parse::<DatePreset>()
                        .map_err(|message| CoreError::InvalidFilter {
                            key: filter.key.to_string(),
                            message,
                        })?
                        .resolve(today),
                    None => DateRange::default(),
                };
                let explicit = DateRange::parse(params.last(&from_key), params.last(&to_key));
                range.from = explicit.from.or(range.from);
                range.to = explicit.to.or(range.to);
                FilterValue::date_range(range)
            }
            FilterKind::AmountRange(_) => {
                let min_key = format!("{}Min", filter.key);
                let max_key = format!("{}Max", filter.key);
                if !(params.has(&min_key) || params.has(&max_key)) {
                    continue;
                }
                let range = AmountRange::parse(params.last(&min_key), params.last(&max_key));
                FilterValue::amount_range(range.min, range.max)
            }
        };
        query.set_filter(spec, filter.key, value)?;
    }

    let direction = match params.last("dir") {
        Some(dir) => Some(dir.parse::<SortDirection>().map_err(|message| CoreError::InvalidFilter {
            key: "dir".to_string(),
            message,
        })?),
        None => None,
    };
    match params.last("sort") {
        Some("none") => query.set_sort(spec, None)?,
        Some(field) => {
            let field = parse_field::<R::Field>(field)?;
            let direction = direction.unwrap_or_default();
            query.set_sort(spec, Some(Sort { field, direction }))?;
        }
        None => {
            // `dir` alone re-orders the default sort column
            if let (Some(direction), Some(current)) = (direction, query.sort()) {
                query.set_sort(spec, Some(Sort { field: current.field, direction }))?;
            }
        }
    }

    if let Some(page) = params.last("page") {
        query.set_page(page.parse::<usize>().unwrap_or(1));
    }

    Ok(query)
}

/// Encode a query back into URL pairs, page last.
///
/// Parsing the result with [`parse_list_query`] yields the same query.
pub fn query_pairs<R: Record>(spec: &ListSpec<R>, query: &ListQuery<R::Field>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if !query.search().is_empty() {
        pairs.push(("q".to_string(), query.search().to_string()));
    }
    for (key, value) in query.filters() {
        match value {
            FilterValue::MultiSelect { values } => {
                for v in values {
                    pairs.push((key.clone(), v.clone()));
                }
                // a second, empty occurrence stops a lone value from being comma-split
                if values.len() == 1 && values.iter().any(|v| v.contains(',')) {
                    pairs.push((key.clone(), String::new()));
                }
            }
            FilterValue::DateRange { range } => {
                if let Some(from) = range.from {
                    pairs.push((format!("{}From", key), from.format("%Y-%m-%d").to_string()));
                }
                if let Some(to) = range.to {
                    pairs.push((format!("{}To", key), to.format("%Y-%m-%d").to_string()));
                }
            }
            FilterValue::AmountRange { range } => {
                if let Some(min) = range.min {
                    pairs.push((format!("{}Min", key), min.to_string()));
                }
                if let Some(max) = range.max {
                    pairs.push((format!("{}Max", key), max.to_string()));
                }
            }
        }
    }
    match query.sort() {
        Some(sort) => {
            pairs.push(("sort".to_string(), sort.field.to_string()));
            pairs.push(("dir".to_string(), sort.direction.to_string()));
        }
        None => pairs.push(("sort".to_string(), "none".to_string())),
    }
    if query.page().size != spec.default_page_size() {
        pairs.push(("size".to_string(), query.page().size.to_string()));
    }
    if query.page().index > 1 {
        pairs.push(("page".to_string(), query.page().index.to_string()));
    }
    pairs
}

/// `k=v&k2=v2`, percent-encoded
pub fn query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
