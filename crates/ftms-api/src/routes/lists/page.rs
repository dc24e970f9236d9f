//! List page rendering - Full page and HTMX table partial
//!
//! Endpoints:
//! - page_list: Search box, filter controls and an empty table container
//! - htmx_list: Table rows, sort headers, pagination and load status

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use std::collections::BTreeSet;

use ftms_config::CurrencyConfig;
use ftms_core::{
    DatePreset, FieldValue, FilterKind, FilterSpec, FilterValue, ListQuery, ListSpec, PageInfo, Record, ViewRecord,
    ViewStatus,
};
use ftms_utils::{escape_html, format_amount, format_number};

use super::params::{query_pairs, query_string};
use super::parse_params;
use crate::AppState;

const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Escaped `k=v&...` for embedding in an attribute
fn link_query<R: Record>(spec: &ListSpec<R>, query: &ListQuery<R::Field>) -> String {
    escape_html(&query_string(&query_pairs(spec, query)))
}

fn list_link<R: ViewRecord>(spec: &ListSpec<R>, query: &ListQuery<R::Field>, label: &str, class: &str) -> String {
    format!(
        "<a href='#' hx-get='/{}/list?{}' hx-target='#list-content' class='{}'>{}</a>",
        R::RESOURCE.path(),
        link_query(spec, query),
        class,
        label
    )
}

/// List page - Main page with search, filters and the table container
pub async fn page_list<R: ViewRecord>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Html<String> {
    let view = R::view(&state.dashboard).read().await;
    let spec = view.spec();
    let path = R::RESOURCE.path();
    let title = R::RESOURCE.title();

    let (query, notice) = match parse_params(spec, &params, &[], &state) {
        Ok(query) => (query, String::new()),
        Err(e) => (
            spec.new_query(),
            format!(
                "<div class='mb-4 p-3 rounded-lg bg-yellow-50 border border-yellow-200 text-yellow-800 text-sm'>Ignoring link parameters: {}</div>",
                escape_html(&e.to_string())
            ),
        ),
    };

    let filters: String = spec
        .filters()
        .iter()
        .map(|filter| render_filter_control(filter, view.items(), &query))
        .collect();

    let (sort_value, dir_value) = match query.sort() {
        Some(sort) => (sort.field.to_string(), sort.direction.to_string()),
        None => ("none".to_string(), String::new()),
    };

    let inner_content = format!(
        r#"{}
        <div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>{}</h2>
            <div class='flex gap-2'>
                <button onclick='reloadView("{}")' class='px-4 py-2 bg-gray-100 text-gray-700 rounded-lg hover:bg-gray-200' title='Fetch the latest records'>Reload</button>
            </div>
        </div>
        <form id='list-filters' hx-get='/{}/list' hx-target='#list-content'
            hx-trigger='change, keyup changed delay:400ms from:#list-search, submit'
            class='bg-white rounded-xl shadow-sm p-4 mb-4 space-y-3' onsubmit='return false'>
            <div class='flex flex-wrap items-center gap-3'>
                <input id='list-search' type='text' name='q' value='{}' placeholder='Search...' class='px-4 py-2 border rounded-lg w-64'>
                <label class='text-sm text-gray-600'>Rows
                    <select name='size' class='ml-1 px-2 py-2 border rounded-lg'>{}</select>
                </label>
                <button type='button' onclick='clearFilters(this.form)' class='px-3 py-2 text-sm text-gray-600 hover:text-indigo-600'>Clear filters</button>
            </div>
            <div class='flex flex-wrap gap-4'>{}</div>
            <input type='hidden' id='list-sort' name='sort' value='{}'>
            <input type='hidden' id='list-dir' name='dir' value='{}'>
        </form>
        <div id='list-content' hx-get='/{}/list?{}' hx-trigger='load' class='bg-white rounded-xl shadow-sm p-6'>
            <p class='text-gray-500 text-center'>Loading...</p>
        </div>
        <script>
        function reloadView(resource) {{
            fetch('/api/reload?resource=' + encodeURIComponent(resource), {{method: 'POST'}})
                .then(r => r.json())
                .then(data => {{
                    if (data.success) {{
                        htmx.trigger('#list-filters', 'submit');
                    }} else {{
                        alert('Reload failed: ' + data.message);
                    }}
                }})
                .catch(e => alert('Reload failed: ' + e));
        }}
        function clearFilters(form) {{
            form.querySelectorAll('input[type=checkbox]').forEach(i => i.checked = false);
            form.querySelectorAll('input[type=date], input[type=number], input[type=text]').forEach(i => i.value = '');
            form.querySelectorAll('select[data-preset]').forEach(s => s.value = '');
            htmx.trigger(form, 'submit');
        }}
        </script>"#,
        notice,
        title,
        path,
        path,
        escape_html(query.search()),
        page_size_options(spec.default_page_size(), query.page().size, state.config.pagination.max_page_size),
        filters,
        escape_html(&sort_value),
        escape_html(&dir_value),
        path,
        link_query(spec, &query),
    );

    Html(crate::page_response(&headers, title, &format!("/{}", path), &inner_content))
}

fn page_size_options(default: usize, current: usize, max: usize) -> String {
    let sizes: BTreeSet<usize> = PAGE_SIZE_OPTIONS
        .iter()
        .copied()
        .chain([default, current])
        .filter(|s| *s > 0 && *s <= max)
        .collect();
    sizes
        .into_iter()
        .map(|s| {
            format!(
                "<option value='{}'{}>{}</option>",
                s,
                if s == current { " selected" } else { "" },
                s
            )
        })
        .collect()
}

/// One filter control, prefilled from the query
fn render_filter_control<R: ViewRecord>(
    filter: &FilterSpec<R::Field>,
    items: &[R],
    query: &ListQuery<R::Field>,
) -> String {
    let key = filter.key;
    let current = query.filter_value(key);
    match filter.kind {
        FilterKind::MultiSelect(field) => {
            let selected: BTreeSet<String> = match current {
                Some(FilterValue::MultiSelect { values }) => values.clone(),
                _ => BTreeSet::new(),
            };
            let mut options: BTreeSet<String> = items
                .iter()
                .map(|item| item.value(field).as_text().into_owned())
                .filter(|v| !v.is_empty())
                .collect();
            options.extend(selected.iter().cloned());

            let boxes: String = options
                .iter()
                .map(|option| {
                    format!(
                        "<label class='flex items-center gap-1 text-sm'><input type='checkbox' name='{}' value='{}'{}> {}</label>",
                        key,
                        escape_html(option),
                        if selected.contains(option) { " checked" } else { "" },
                        escape_html(option)
                    )
                })
                .collect();
            format!(
                "<fieldset class='border rounded-lg px-3 py-2'><legend class='text-xs text-gray-500 px-1'>{}</legend><input type='hidden' name='{}' value=''><div class='flex flex-wrap gap-3 max-w-md'>{}</div></fieldset>",
                R::column_label(field),
                key,
                boxes
            )
        }
        FilterKind::DateRange(field) => {
            let (from, to) = match current {
                Some(FilterValue::DateRange { range }) => (
                    range.from.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                    range.to.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                ),
                _ => (String::new(), String::new()),
            };
            let presets: String = [DatePreset::Month, DatePreset::Quarter, DatePreset::Year, DatePreset::All]
                .iter()
                .map(|p| format!("<option value='{}'>{}</option>", p, preset_label(*p)))
                .collect();
            format!(
                r#"<fieldset class='border rounded-lg px-3 py-2'><legend class='text-xs text-gray-500 px-1'>{}</legend>
                <div class='flex items-center gap-2 text-sm'>
                    <select name='{}Preset' data-preset='{}' class='px-2 py-1 border rounded'
                        onchange="this.form.querySelectorAll('input[data-range={}]').forEach(i => i.value = '')">
                        <option value=''>Custom</option>{}
                    </select>
                    <input type='date' name='{}From' data-range='{}' value='{}' class='px-2 py-1 border rounded'>
                    <span>to</span>
                    <input type='date' name='{}To' data-range='{}' value='{}' class='px-2 py-1 border rounded'>
                </div></fieldset>"#,
                R::column_label(field),
                key,
                key,
                key,
                presets,
                key,
                key,
                from,
                key,
                key,
                to
            )
        }
        FilterKind::AmountRange(field) => {
            let (min, max) = match current {
                Some(FilterValue::AmountRange { range }) => (
                    range.min.map(|n| n.to_string()).unwrap_or_default(),
                    range.max.map(|n| n.to_string()).unwrap_or_default(),
                ),
                _ => (String::new(), String::new()),
            };
            format!(
                r#"<fieldset class='border rounded-lg px-3 py-2'><legend class='text-xs text-gray-500 px-1'>{}</legend>
                <div class='flex items-center gap-2 text-sm'>
                    <input type='number' step='any' name='{}Min' value='{}' placeholder='Min' class='w-28 px-2 py-1 border rounded'>
                    <span>to</span>
                    <input type='number' step='any' name='{}Max' value='{}' placeholder='Max' class='w-28 px-2 py-1 border rounded'>
                </div></fieldset>"#,
                R::column_label(field),
                key,
                min,
                key,
                max
            )
        }
    }
}

fn preset_label(preset: DatePreset) -> &'static str {
    match preset {
        DatePreset::Month => "This month",
        DatePreset::Quarter => "This quarter",
        DatePreset::Year => "This year",
        DatePreset::All => "All time",
    }
}

/// HTMX: table partial for the current parameters
pub async fn htmx_list<R: ViewRecord>(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Html<String> {
    let view = R::view(&state.dashboard).read().await;
    let spec = view.spec();
    let path = R::RESOURCE.path();

    let query = match parse_params(spec, &params, &[], &state) {
        Ok(query) => query,
        Err(e) => {
            log::warn!(target: "ftms::api", "{}: rejected list parameters: {}", path, e);
            return Html(format!(
                "<div class='p-4 rounded-lg bg-red-50 border border-red-200 text-red-700'>{}</div>",
                escape_html(&e.to_string())
            ));
        }
    };

    let mut html = status_banner::<R>(view.status(), view.loaded_at().is_some(), &link_query(spec, &query));
    if view.loaded_at().is_none() {
        return Html(html);
    }

    let outcome = view.run(&query);

    if let Some(check) = R::balance(&outcome.all) {
        let currency = &state.config.currency;
        let (class, label) = if check.balanced {
            ("bg-green-50 border-green-200 text-green-700", "Balanced".to_string())
        } else {
            (
                "bg-red-50 border-red-200 text-red-700",
                format!("Out of balance by {}", money(check.difference, currency)),
            )
        };
        html.push_str(&format!(
            "<div id='balance-indicator' class='mb-4 p-3 rounded-lg border {} flex justify-between text-sm'><span class='font-medium'>{}</span><span>Debit {} / Credit {}</span></div>",
            class,
            label,
            money(check.total_debit, currency),
            money(check.total_credit, currency)
        ));
    }

    // Header
    html.push_str("<div class='overflow-x-auto'><table class='min-w-full text-sm'><thead><tr class='border-b text-left text-gray-600'>");
    for field in R::columns() {
        html.push_str(&sort_header::<R>(spec, &query, *field, outcome.items.first().copied()));
    }
    if R::RESOURCE.is_editable() {
        html.push_str("<th class='px-3 py-2'></th>");
    }
    html.push_str("</tr></thead><tbody>");

    // Rows
    if outcome.items.is_empty() {
        let colspan = R::columns().len() + usize::from(R::RESOURCE.is_editable());
        html.push_str(&format!(
            "<tr><td colspan='{}' class='text-center py-12 text-gray-500'>No records match the current search and filters</td></tr>",
            colspan
        ));
    }
    for item in &outcome.items {
        html.push_str("<tr class='border-b hover:bg-gray-50'>");
        for field in R::columns() {
            html.push_str(&render_cell(item.value(*field), &state.config.currency));
        }
        if R::RESOURCE.is_editable() {
            html.push_str(&format!(
                "<td class='px-3 py-2 text-right'><button hx-delete='/api/{}/{}' hx-confirm='Delete this record?' hx-swap='none' \
                 hx-on::after-request=\"htmx.trigger('#list-filters', 'submit')\" class='text-red-500 hover:text-red-700 text-xs'>Delete</button></td>",
                path,
                escape_html(&urlencoding::encode(item.id())),
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");

    html.push_str(&pagination_controls::<R>(spec, &query, &outcome.page));

    // Keep the form's sort inputs in step with header clicks
    let (sort_value, dir_value) = match query.sort() {
        Some(sort) => (sort.field.to_string(), sort.direction.to_string()),
        None => ("none".to_string(), String::new()),
    };
    html.push_str(&format!(
        "<input type='hidden' id='list-sort' name='sort' value='{}' hx-swap-oob='true'><input type='hidden' id='list-dir' name='dir' value='{}' hx-swap-oob='true'>",
        escape_html(&sort_value),
        escape_html(&dir_value)
    ));

    Html(html)
}

/// Load state above the table; stale items stay visible under a failure banner
fn status_banner<R: ViewRecord>(status: &ViewStatus, loaded: bool, query: &str) -> String {
    let path = R::RESOURCE.path();
    match status {
        ViewStatus::Failed(message) => format!(
            "<div class='mb-4 p-3 rounded-lg bg-red-50 border border-red-200 text-red-700 flex justify-between items-center'>\
             <span>Could not load {}: {}</span>\
             <button onclick='reloadView(\"{}\")' class='px-3 py-1 bg-red-600 text-white rounded hover:bg-red-700 text-sm'>Retry</button></div>",
            R::RESOURCE.title(),
            escape_html(message),
            path
        ),
        ViewStatus::Loading | ViewStatus::Idle if !loaded => format!(
            "<div hx-get='/{}/list?{}' hx-trigger='load delay:1s' hx-target='#list-content' class='text-gray-500 text-center py-12'>Loading...</div>",
            path, query
        ),
        ViewStatus::Loading => "<div class='mb-2 text-xs text-gray-400'>Refreshing...</div>".to_string(),
        _ => String::new(),
    }
}

/// Column header; sortable columns link to the toggled sort
fn sort_header<R: ViewRecord>(
    spec: &ListSpec<R>,
    query: &ListQuery<R::Field>,
    field: R::Field,
    sample: Option<&R>,
) -> String {
    let label = R::column_label(field);
    let numeric = sample.map_or(false, |item| {
        matches!(item.value(field), FieldValue::Number(_) | FieldValue::Amount(_))
    });
    let align = if numeric { " text-right" } else { "" };

    if !spec.is_sortable(field) {
        return format!("<th class='px-3 py-2 font-medium{}'>{}</th>", align, label);
    }

    let active = query.sort().filter(|s| s.field == field);
    let indicator = active
        .map(|s| format!(" <span class='text-indigo-600'>{}</span>", s.direction.indicator()))
        .unwrap_or_default();
    let aria = match active.map(|s| s.direction.to_string()) {
        Some(dir) if dir == "asc" => " aria-sort='ascending'",
        Some(_) => " aria-sort='descending'",
        None => "",
    };

    let mut next = query.clone();
    match next.toggle_sort(spec, field) {
        Ok(()) => format!(
            "<th class='px-3 py-2 font-medium{}'{}>{}</th>",
            align,
            aria,
            list_link(spec, &next, &format!("{}{}", label, indicator), "hover:text-indigo-600")
        ),
        Err(_) => format!("<th class='px-3 py-2 font-medium{}'>{}</th>", align, label),
    }
}

fn money(value: f64, currency: &CurrencyConfig) -> String {
    format_amount(value, currency.decimal_places as usize, &currency.thousands_separator)
}

fn render_cell(value: FieldValue<'_>, currency: &CurrencyConfig) -> String {
    match value {
        FieldValue::Amount(n) => format!(
            "<td class='px-3 py-2 text-right font-medium {}'>{}</td>",
            if n < 0.0 { "text-red-600" } else { "text-gray-900" },
            money(n, currency)
        ),
        FieldValue::Number(n) => format!("<td class='px-3 py-2 text-right'>{}</td>", money(n, currency)),
        FieldValue::Date(None) => "<td class='px-3 py-2 text-gray-400'>-</td>".to_string(),
        FieldValue::Date(Some(_)) => format!("<td class='px-3 py-2 whitespace-nowrap'>{}</td>", value),
        FieldValue::Text(s) if s.is_empty() => "<td class='px-3 py-2 text-gray-400'>-</td>".to_string(),
        FieldValue::Text(s) => format!("<td class='px-3 py-2'>{}</td>", escape_html(s)),
    }
}

/// Showing x to y of n, prev/next and a window of page links
fn pagination_controls<R: ViewRecord>(spec: &ListSpec<R>, query: &ListQuery<R::Field>, page: &PageInfo) -> String {
    let at_page = |index: usize| {
        let mut q = query.clone();
        q.set_page(index);
        q
    };
    let link_class = "px-3 py-1 border rounded hover:bg-gray-50";

    let mut html = format!(
        "<div class='flex items-center justify-between mt-4 text-sm text-gray-600'><span>Showing {} to {} of {}</span><div class='flex gap-1 items-center'>",
        format_number(page.first_item()),
        format_number(page.last_item()),
        format_number(page.total_items)
    );

    if page.has_previous() {
        html.push_str(&list_link(spec, &at_page(page.index - 1), "Prev", link_class));
    }
    let start = page.index.saturating_sub(2).max(1);
    let end = (start + 4).min(page.total_pages);
    for index in start..=end {
        if index == page.index {
            html.push_str(&format!(
                "<span class='px-3 py-1 border rounded bg-indigo-600 text-white'>{}</span>",
                index
            ));
        } else {
            html.push_str(&list_link(spec, &at_page(index), &index.to_string(), link_class));
        }
    }
    if page.has_next() {
        html.push_str(&list_link(spec, &at_page(page.index + 1), "Next", link_class));
    }

    html.push_str(&format!(
        "<a href='/api/{}/export.csv?{}' class='ml-3 px-3 py-1 border rounded text-indigo-600 hover:bg-indigo-50'>Export CSV</a>",
        R::RESOURCE.path(),
        link_query(spec, query)
    ));
    html.push_str("</div></div>");
    html
}
