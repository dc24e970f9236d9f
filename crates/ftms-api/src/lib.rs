//! HTTP API server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::lists: list pages, table partials, JSON lists, CSV export and charts per view
//! - routes::records: create, update, delete and loan status changes

pub mod error;
pub mod routes;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::Html;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use ftms_config::Config;
use ftms_core::reports::BalanceCheck;
use ftms_core::{
    Dashboard, EditableRecord, JournalEntry, LoanRequest, LoanStatus, ReportLine, Resource, Revenue, ViewRecord,
    ViewStatus,
};
use ftms_utils::{escape_html, format_amount, format_number};

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub config: Config,
}

/// List, export, chart and page routes of one view
fn list_routes<R: ViewRecord>(router: Router<AppState>) -> Router<AppState> {
    use routes::lists::{api_chart, api_export, api_list, htmx_list, page_list};

    let path = R::RESOURCE.path();
    router
        .route(&format!("/api/{}", path), get(api_list::<R>))
        .route(&format!("/api/{}/export.csv", path), get(api_export::<R>))
        .route(&format!("/api/{}/chart", path), get(api_chart::<R>))
        .route(&format!("/{}", path), get(page_list::<R>))
        .route(&format!("/{}/list", path), get(htmx_list::<R>))
}

/// Create, update and delete routes of an editable view
fn editable_routes<R: EditableRecord>(router: Router<AppState>) -> Router<AppState> {
    use routes::records::{api_create, api_delete, api_update};

    let path = R::RESOURCE.path();
    router
        .route(&format!("/api/{}", path), post(api_create::<R>))
        .route(&format!("/api/{}/:id", path), put(api_update::<R>).delete(api_delete::<R>))
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::lists::api_balance;
    use routes::records::api_loan_status;

    let cors = cors_layer(&state.config.server.cors_origins);

    let mut router = Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/reload", post(api_reload))
        .route("/api/journal-entries/balance", get(api_balance))
        .route("/api/loan-requests/:id/status", post(api_loan_status))
        // HTMX page routes
        .route("/", get(index_page))
        .route("/dashboard", get(index_page));

    router = list_routes::<Revenue>(router);
    router = list_routes::<LoanRequest>(router);
    router = list_routes::<JournalEntry>(router);
    router = list_routes::<ReportLine>(router);
    router = editable_routes::<Revenue>(router);
    router = editable_routes::<LoanRequest>(router);
    router = editable_routes::<JournalEntry>(router);

    router.layer(cors).with_state(state)
}

/// CORS for browser clients on other origins; an empty list or `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!(target: "ftms::api", "Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Health check endpoint with per-view load state
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let views = state.dashboard.summaries().await;
    let healthy = views.iter().all(|v| !matches!(v.status, ViewStatus::Failed(_)));
    Json(json!({
        "status": if healthy { "ok" } else { "degraded" },
        "backend": state.dashboard.backend().name(),
        "views": views,
    }))
}

/// Refetch one view (`?resource=revenues`) or every view
async fn api_reload(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let resource = match params.get("resource").map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(name) => Some(name.parse::<Resource>().map_err(ApiError::bad_request)?),
        None => None,
    };

    let body = match resource {
        Some(resource) => match state.dashboard.refresh_resource(resource).await {
            Ok(count) => json!({
                "success": true,
                "message": format!("Reloaded {} {}", count, resource.title()),
                "loaded": [{ "resource": resource.path(), "count": count }],
                "failed": [],
            }),
            Err(e) => json!({
                "success": false,
                "message": e.to_string(),
                "loaded": [],
                "failed": [{ "resource": resource.path(), "error": e.to_details() }],
            }),
        },
        None => {
            let report = state.dashboard.refresh_all().await;
            let loaded: Vec<Value> = report
                .loaded
                .iter()
                .map(|(r, count)| json!({ "resource": r.path(), "count": count }))
                .collect();
            let failed: Vec<Value> = report
                .failed
                .iter()
                .map(|(r, e)| json!({ "resource": r.path(), "error": e.to_details() }))
                .collect();
            let message = if report.is_ok() {
                "All views reloaded".to_string()
            } else {
                report
                    .failed
                    .iter()
                    .map(|(r, e)| format!("{}: {}", r.title(), e))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            json!({ "success": report.is_ok(), "message": message, "loaded": loaded, "failed": failed })
        }
    };
    Ok(Json(body))
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - FTMS</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        escape_html(title),
        content
    )
}

/// Navigation sidebar
pub fn nav_sidebar(current_path: &str) -> String {
    let links = [
        ("/", "Dashboard", "📊"),
        ("/revenues", "Revenue", "💰"),
        ("/loan-requests", "Loan Requests", "🤝"),
        ("/journal-entries", "Journal Entries", "📋"),
        ("/reports/lines", "Reports", "📈"),
    ];

    let mut nav = String::from("<div class='bg-white border-r h-screen flex flex-col'><div class='p-4 border-b'><h1 class='text-xl font-bold text-indigo-600'>FTMS</h1><p class='text-xs text-gray-500'>Finance dashboard</p></div><ul class='flex-1 py-2 space-y-1 px-2'>");

    for (path, label, icon) in &links {
        let is_active = if *path == "/" {
            current_path == "/" || current_path == "/dashboard"
        } else {
            current_path.starts_with(path)
        };
        let active_class = if is_active { "bg-indigo-50 text-indigo-600" } else { "text-gray-600 hover:bg-gray-50" };
        nav.push_str(&format!(
            r#"<li><a href='{}' class='flex items-center gap-2 px-3 py-2 rounded-lg {}'>{}<span>{}</span></a></li>"#,
            path, active_class, icon, label
        ));
    }
    nav.push_str("</ul></div>");
    nav
}

fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &HeaderMap, title: &str, current_path: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        // HTMX partial - just the content area
        format!(
            r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
            inner_content
        )
    } else {
        base_html(
            title,
            &format!(
                r#"<div class='flex flex-col h-screen'>
    <div class='flex flex-1 overflow-hidden'>
        <aside class='w-64 flex-shrink-0'>{}</aside>
        <main class='flex-1 overflow-auto bg-gray-50 p-6'>{}</main>
    </div>
</div>"#,
                nav_sidebar(current_path),
                inner_content
            ),
        )
    }
}

/// Count card for one view on the dashboard
async fn view_card<R: ViewRecord>(state: &AppState, color: &str) -> String {
    let view = R::view(&state.dashboard).read().await;
    let status = match view.status() {
        ViewStatus::Failed(message) => format!("<p class='text-xs text-red-600 truncate'>{}</p>", escape_html(message)),
        ViewStatus::Loading => "<p class='text-xs text-gray-500'>Loading...</p>".to_string(),
        ViewStatus::Idle => "<p class='text-xs text-gray-500'>Not loaded</p>".to_string(),
        ViewStatus::Ready => format!(
            "<p class='text-xs text-gray-500'>Updated {}</p>",
            view.loaded_at()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        ),
    };
    format!(
        "<a href='/{}' class='block bg-{}-50 p-4 rounded-lg border border-{}-200 hover:shadow'><p class='text-sm text-{}-600'>{}</p><p class='text-2xl font-bold text-{}-700'>{}</p>{}</a>",
        R::RESOURCE.path(),
        color,
        color,
        color,
        R::RESOURCE.title(),
        color,
        format_number(view.items().len()),
        status
    )
}

/// Index page with per-view counts and headline figures
async fn index_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let currency = &state.config.currency;
    let money = |value: f64| {
        format!(
            "{} {}",
            currency.default_currency,
            format_amount(value, currency.decimal_places as usize, &currency.thousands_separator)
        )
    };

    let cards = [
        view_card::<Revenue>(&state, "green").await,
        view_card::<LoanRequest>(&state, "blue").await,
        view_card::<JournalEntry>(&state, "purple").await,
        view_card::<ReportLine>(&state, "yellow").await,
    ]
    .join("");

    let revenue_total: f64 = Revenue::view(&state.dashboard)
        .read()
        .await
        .items()
        .iter()
        .map(|r| r.amount)
        .sum();
    let pending_loans = LoanRequest::view(&state.dashboard)
        .read()
        .await
        .items()
        .iter()
        .filter(|l| l.status == LoanStatus::Pending)
        .count();
    let balance = {
        let view = JournalEntry::view(&state.dashboard).read().await;
        let entries: Vec<&JournalEntry> = view.items().iter().collect();
        BalanceCheck::of(&entries)
    };

    let inner_content = format!(
        r#"<div class='mb-6 flex items-center justify-between'><h2 class='text-2xl font-bold'>Dashboard</h2>
            <button onclick='reloadAll()' class='px-4 py-2 bg-gray-100 text-gray-700 rounded-lg hover:bg-gray-200'>Reload all</button></div>
        <div class='grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4 mb-6'>{}</div>
        <div class='grid grid-cols-1 lg:grid-cols-3 gap-6'>
            <div class='bg-white rounded-xl shadow-sm p-6'><p class='text-sm text-gray-600'>Total revenue</p><p class='text-xl font-bold {}'>{}</p></div>
            <div class='bg-white rounded-xl shadow-sm p-6'><p class='text-sm text-gray-600'>Pending loan requests</p><p class='text-xl font-bold'>{}</p></div>
            <div class='bg-white rounded-xl shadow-sm p-6'><p class='text-sm text-gray-600'>Journal</p><p class='text-xl font-bold {}'>{}</p>
                <p class='text-xs text-gray-500'>Debit {} / Credit {}</p></div>
        </div>
        <script>
        function reloadAll() {{
            fetch('/api/reload', {{method: 'POST'}})
                .then(r => r.json())
                .then(data => {{
                    if (data.success) {{
                        window.location.reload();
                    }} else {{
                        alert('Reload failed: ' + data.message);
                    }}
                }})
                .catch(e => alert('Reload failed: ' + e));
        }}
        </script>"#,
        cards,
        if revenue_total < 0.0 { "text-red-600" } else { "text-green-600" },
        money(revenue_total),
        format_number(pending_loans),
        if balance.balanced { "text-green-600" } else { "text-red-600" },
        if balance.balanced { "Balanced".to_string() } else { format!("Off by {}", money(balance.difference)) },
        money(balance.total_debit),
        money(balance.total_credit),
    );

    Html(page_response(&headers, "Dashboard", "/", &inner_content))
}

/// Start the HTTP server
pub async fn start_server(config: Config, dashboard: Arc<Dashboard>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { dashboard, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting FTMS dashboard on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Dashboard)");
    for resource in Resource::ALL {
        log::info!("  - /{} ({})", resource.path(), resource.title());
    }
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use ftms_core::FileBackend;
    use tower::ServiceExt;

    async fn fixture() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("revenues.json"),
            json!([
                {"id": "REV-1", "referenceId": "OR-1001", "department": "Operations", "category": "Fare",
                 "amount": 1200.0, "date": "2024-01-05", "remarks": "Route 5"},
                {"id": "REV-2", "referenceId": "OR-1002", "department": "Operations", "category": "Fare",
                 "amount": 800.0, "date": "2024-01-20", "remarks": ""},
                {"id": "REV-3", "referenceId": "OR-1003", "department": "Admin", "category": "Rental",
                 "amount": 5000.0, "date": "2024-02-01", "remarks": "Terminal stall"},
                {"id": "REV-4", "referenceId": "OR-1004", "department": "Operations", "category": "Fare",
                 "amount": -150.0, "date": "2024-02-11", "remarks": "Refund"}
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("loan-requests.json"),
            json!([{"id": "LN-1", "employeeName": "Ana Cruz", "department": "Operations", "loanType": "Salary",
                    "purpose": "Tuition", "amount": 10000.0, "status": "pending", "requestDate": "2024-02-01"}])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("journal-entries.json"),
            json!([
                {"id": "JE-1", "reference": "JV-1", "date": "2024-01-05", "account": "Cash", "debit": 500.0, "credit": 0.0},
                {"id": "JE-2", "reference": "JV-1", "date": "2024-01-05", "account": "Revenue", "debit": 0.0, "credit": 500.0}
            ])
            .to_string(),
        )
        .unwrap();

        let mut config = Config::default();
        config.backend.data_path = dir.path().to_path_buf();
        let dashboard = Arc::new(Dashboard::new(
            Arc::new(FileBackend::new(dir.path())),
            &config.pagination,
        ));
        assert!(dashboard.refresh_all().await.is_ok());
        (dir, AppState { dashboard, config })
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn get(state: &AppState, uri: &str) -> Response {
        send(state, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn send_json(state: &AppState, method: &str, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn ids(body: &Value) -> Vec<String> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let (_dir, state) = fixture().await;

        let response = get(&state, "/api/revenues?category=Fare&sort=amount&dir=desc").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        // magnitude order: 1200, 800, |-150|
        assert_eq!(ids(&body), vec!["REV-1", "REV-2", "REV-4"]);
        assert_eq!(body["page"]["totalItems"], 3);
        assert_eq!(body["sort"]["field"], "amount");
        assert_eq!(body["status"]["state"], "ready");

        let body = body_json(get(&state, "/api/revenues?q=refund").await).await;
        assert_eq!(ids(&body), vec!["REV-4"]);

        let body = body_json(get(&state, "/api/revenues?dateFrom=2024-02-01&dateTo=2024-02-01").await).await;
        assert_eq!(ids(&body), vec!["REV-3"]);
    }

    #[tokio::test]
    async fn test_list_pages_are_clamped() {
        let (_dir, state) = fixture().await;
        let body = body_json(get(&state, "/api/revenues?size=3&page=9&sort=date&dir=asc").await).await;
        assert_eq!(body["page"]["index"], 2);
        assert_eq!(body["page"]["totalPages"], 2);
        assert_eq!(ids(&body), vec!["REV-4"]);
    }

    #[tokio::test]
    async fn test_bad_list_params() {
        let (_dir, state) = fixture().await;

        let response = get(&state, "/api/revenues?colour=red").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "UNKNOWN_FILTER");

        let response = get(&state, "/api/revenues?sort=remarks").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&state, "/api/revenues?size=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_PAGE_SIZE");
    }

    #[tokio::test]
    async fn test_export_uses_all_filtered_rows() {
        let (_dir, state) = fixture().await;
        let response = get(&state, "/api/revenues/export.csv?category=Fare&size=1&sort=date&dir=asc").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let csv = body_text(response).await;
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("OR-1001,"));
        assert!(lines[3].starts_with("OR-1004,"));
    }

    #[tokio::test]
    async fn test_chart_endpoints() {
        let (_dir, state) = fixture().await;

        let body = body_json(get(&state, "/api/revenues/chart?group=category").await).await;
        assert_eq!(body["labels"], json!(["Fare", "Rental"]));
        assert_eq!(body["datasets"][0]["data"], json!([1850.0, 5000.0]));

        let body = body_json(get(&state, "/api/revenues/chart?group=month&category=Fare").await).await;
        assert_eq!(body["labels"], json!(["2024-01", "2024-02"]));
        assert_eq!(body["datasets"][0]["data"], json!([2000.0, -150.0]));

        let response = get(&state, "/api/revenues/chart").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = get(&state, "/api/reports/lines/chart?group=month").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_validates_before_backend() {
        let (_dir, state) = fixture().await;

        let response = send_json(&state, "POST", "/api/revenues", json!({"department": "Operations"})).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["details"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"category"));
        assert!(fields.contains(&"amount"));
        assert_eq!(state.dashboard.view::<Revenue>().read().await.items().len(), 4);

        let response = send_json(
            &state,
            "POST",
            "/api/revenues",
            json!({"department": "Admin", "category": "Rental", "amount": 250.0, "date": "2024-03-01"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert!(created["id"].as_str().unwrap().starts_with("REV-"));
        assert_eq!(state.dashboard.view::<Revenue>().read().await.items().len(), 5);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_dir, state) = fixture().await;

        let response = send_json(
            &state,
            "PUT",
            "/api/revenues/REV-2",
            json!({"department": "Operations", "category": "Fare", "amount": 900.0, "date": "2024-01-20"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["amount"], 900.0);

        let response = send(
            &state,
            Request::builder().method("DELETE").uri("/api/revenues/REV-2").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(
            &state,
            Request::builder().method("DELETE").uri("/api/revenues/REV-404").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_loan_status_transition_rules() {
        let (_dir, state) = fixture().await;

        let response = send_json(&state, "POST", "/api/loan-requests/LN-1/status", json!({"status": "closed"})).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

        let response = send_json(&state, "POST", "/api/loan-requests/LN-1/status", json!({"status": "paid"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send_json(&state, "POST", "/api/loan-requests/LN-1/status", json!({"status": "approved"})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "approved");
    }

    #[tokio::test]
    async fn test_journal_balance() {
        let (_dir, state) = fixture().await;
        let body = body_json(get(&state, "/api/journal-entries/balance").await).await;
        assert_eq!(body["balanced"], true);
        assert_eq!(body["totalDebit"], 500.0);

        let body = body_json(get(&state, "/api/journal-entries/balance?account=Cash").await).await;
        assert_eq!(body["balanced"], false);
        assert_eq!(body["difference"], 500.0);
    }

    #[tokio::test]
    async fn test_health_and_reload() {
        let (dir, state) = fixture().await;

        let body = body_json(get(&state, "/api/health").await).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "file");
        assert_eq!(body["views"].as_array().unwrap().len(), 4);

        std::fs::write(dir.path().join("revenues.json"), "not json").unwrap();
        let response = send(
            &state,
            Request::builder().method("POST").uri("/api/reload").body(Body::empty()).unwrap(),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["failed"][0]["resource"], "revenues");

        let body = body_json(get(&state, "/api/health").await).await;
        assert_eq!(body["status"], "degraded");
        // stale rows stay visible after a failed refresh
        let body = body_json(get(&state, "/api/revenues").await).await;
        assert_eq!(body["page"]["totalItems"], 4);
        assert_eq!(body["status"]["state"], "failed");

        let response = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/api/reload?resource=nowhere")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pages_render() {
        let (_dir, state) = fixture().await;

        let html = body_text(get(&state, "/revenues?category=Rental").await).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("hx-get='/revenues/list?category=Rental"));
        assert!(html.contains("value='Rental' checked"));

        let html = body_text(get(&state, "/revenues/list?sort=amount&dir=asc").await).await;
        assert!(html.contains("▲"));
        assert!(html.contains("Showing 1 to 4 of 4"));
        assert!(html.contains("-150.00"));

        let html = body_text(get(&state, "/journal-entries/list").await).await;
        assert!(html.contains("id='balance-indicator'"));
        assert!(html.contains("Balanced"));

        let html = body_text(get(&state, "/").await).await;
        assert!(html.contains("Pending loan requests"));
    }
}
