pub mod pages;
pub mod views;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use actix_cors::Cors;
use actix_web::error::BlockingError;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::use_cases::data_diagnostics::DataDiagnostics;
use crate::application::use_cases::dataset_loader::{
    DatasetLoader, ExecutionData, LoaData, LOAD_ERROR_MESSAGE,
};
use crate::application::use_cases::detail_search::{
    function_options, search_expenses, search_revenues, ExpenseSearch, RevenueSearch,
};
use crate::application::use_cases::execution_summary::{
    expense_funnel, revenue_vs_expense, ExecutionTotals, FunnelStage,
};
use crate::application::use_cases::expense_analysis::{self, FunctionExecution, MonthlyAmount};
use crate::application::use_cases::expense_analysis::{PrincipalFunctions, StageTotals};
use crate::application::use_cases::fiscal_metrics::FiscalMetrics;
use crate::application::use_cases::indicator::LabeledAmount;
use crate::application::use_cases::insights::ExecutionInsights;
use crate::application::use_cases::loa_analysis::{
    LoaAnalysis, LoaFilter, NO_TAX_WARNING, NO_TRANSFER_WARNING,
};
use crate::application::use_cases::loa_reconciliation::Reconciliation;
use crate::application::use_cases::revenue_execution::{
    executed_breakdown, forecast_vs_collected, CategoryExecution, RevenueBreakdown,
};
use crate::domain::budget::{DashboardConfig, MAX_LEVEL};
use crate::domain::error::{AppError, Result};

pub const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

/// A dataset as last loaded: the data, or the message shown in its place
pub type Loaded<T> = std::result::Result<Arc<T>, String>;

pub struct DashboardState {
    pub config: DashboardConfig,
    loa: RwLock<Loaded<LoaData>>,
    execution: RwLock<Loaded<ExecutionData>>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Debug, Serialize)]
pub struct ReloadStatus {
    pub loa: bool,
    pub execution: bool,
    pub source_modified: Option<String>,
}

impl DashboardState {
    /// Load both datasets once; failures are kept and shown by the pages
    pub fn load(config: DashboardConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        let state = Self {
            config,
            loa: RwLock::new(Err(LOAD_ERROR_MESSAGE.to_string())),
            execution: RwLock::new(Err(LOAD_ERROR_MESSAGE.to_string())),
            logs,
        };
        state.reload();
        state
    }

    /// Re-read every CSV export and swap the datasets in
    pub fn reload(&self) -> ReloadStatus {
        let loader = DatasetLoader::new(&self.config);
        let loa = capture(loader.load_loa());
        let execution = capture(loader.load_execution());

        for (name, result) in [("LOA", loa.as_ref().err()), ("Execution", execution.as_ref().err())] {
            match result {
                Some(message) => add_log(&self.logs, "ERROR", "Dataset", &format!("{}: {}", name, message)),
                None => add_log(&self.logs, "INFO", "Dataset", &format!("{} datasets loaded", name)),
            }
        }

        let status = ReloadStatus {
            loa: loa.is_ok(),
            execution: execution.is_ok(),
            source_modified: execution
                .as_ref()
                .ok()
                .map(|d| d.source_modified.clone())
                .or_else(|| loa.as_ref().ok().map(|d| d.source_modified.clone())),
        };

        *self.loa.write().unwrap_or_else(PoisonError::into_inner) = loa;
        *self.execution.write().unwrap_or_else(PoisonError::into_inner) = execution;
        status
    }

    pub fn loa(&self) -> Loaded<LoaData> {
        self.loa.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn execution(&self) -> Loaded<ExecutionData> {
        self.execution
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subtitle(&self) -> String {
        format!(
            "{} · Exercício {}",
            self.config.municipality, self.config.fiscal_year
        )
    }
}

fn capture<T>(result: Result<T>) -> Loaded<T> {
    result.map(Arc::new).map_err(|err| match err {
        AppError::DataUnavailable(message) => message,
        other => format!("{} ({})", LOAD_ERROR_MESSAGE, other),
    })
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Optional analysis with the warning shown when it is empty
#[derive(Serialize)]
struct MaybeAnalysis<T> {
    data: Option<T>,
    warning: Option<&'static str>,
}

impl<T> MaybeAnalysis<T> {
    fn new(data: Option<T>, warning: &'static str) -> Self {
        let warning = if data.is_none() { Some(warning) } else { None };
        Self { data, warning }
    }
}

#[derive(Serialize)]
struct ExecutionOverview {
    totals: ExecutionTotals,
    funnel: Vec<FunnelStage>,
    revenue_vs_expense: Vec<LabeledAmount>,
}

#[derive(Serialize)]
struct RevenueExecution {
    breakdown: RevenueBreakdown,
    forecast_vs_collected: Vec<CategoryExecution>,
}

#[derive(Serialize)]
struct ExpenseOverview {
    functions: Vec<FunctionExecution>,
    natures: Vec<LabeledAmount>,
    monthly: Vec<MonthlyAmount>,
    suppliers: Vec<StageTotals>,
    principal: PrincipalFunctions,
}

fn unavailable_json(message: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorBody { error: message })
}

fn with_loa<T, F>(state: &DashboardState, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(LoaAnalysis<'_>) -> T,
{
    match state.loa() {
        Ok(data) => HttpResponse::Ok().json(f(LoaAnalysis::new(&data, state.config.population))),
        Err(message) => unavailable_json(&message),
    }
}

fn with_execution<T, F>(state: &DashboardState, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&ExecutionData) -> T,
{
    match state.execution() {
        Ok(data) => HttpResponse::Ok().json(f(&data)),
        Err(message) => unavailable_json(&message),
    }
}

// ============================================================
// LOA ENDPOINTS
// ============================================================

#[get("/loa/summary")]
async fn loa_summary(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.summary())
}

#[get("/loa/top-revenues")]
async fn loa_top_revenues(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.top_revenues())
}

#[get("/loa/categories")]
async fn loa_categories(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.category_breakdown())
}

#[get("/loa/levels/{level}")]
async fn loa_levels(data: web::Data<DashboardState>, path: web::Path<usize>) -> impl Responder {
    let level = path.into_inner();
    if level == 0 || level > MAX_LEVEL {
        return HttpResponse::BadRequest().json(ErrorBody {
            error: "level must be between 1 and 10",
        });
    }
    with_loa(&data, |analysis| analysis.level_breakdown(level))
}

#[get("/loa/tax")]
async fn loa_tax(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| {
        MaybeAnalysis::new(analysis.tax_analysis(), NO_TAX_WARNING)
    })
}

#[get("/loa/transfers")]
async fn loa_transfers(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| {
        MaybeAnalysis::new(analysis.transfer_analysis(), NO_TRANSFER_WARNING)
    })
}

#[get("/loa/filter")]
async fn loa_filter(data: web::Data<DashboardState>, query: web::Query<LoaFilter>) -> impl Responder {
    with_loa(&data, |analysis| analysis.filter(&query))
}

#[get("/loa/insights")]
async fn loa_insights(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.insights())
}

#[get("/loa/codes")]
async fn loa_codes(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.detected_codes())
}

#[get("/loa/structure")]
async fn loa_structure(data: web::Data<DashboardState>) -> impl Responder {
    with_loa(&data, |analysis| analysis.structure_overview())
}

// ============================================================
// EXECUTION ENDPOINTS
// ============================================================

#[get("/execution/summary")]
async fn execution_summary(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, |execution| {
        let totals = ExecutionTotals::from_data(execution);
        ExecutionOverview {
            funnel: expense_funnel(&totals),
            revenue_vs_expense: revenue_vs_expense(&totals),
            totals,
        }
    })
}

#[get("/execution/metrics")]
async fn execution_metrics(data: web::Data<DashboardState>) -> impl Responder {
    let population = data.config.population;
    let today = Local::now().date_naive();
    with_execution(&data, |execution| {
        FiscalMetrics::compute(execution, population, today)
    })
}

#[get("/execution/reconciliation")]
async fn execution_reconciliation(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, Reconciliation::from_data)
}

#[get("/execution/revenues")]
async fn execution_revenues(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, |execution| RevenueExecution {
        breakdown: executed_breakdown(&execution.revenues),
        forecast_vs_collected: forecast_vs_collected(&execution.revenues),
    })
}

#[get("/execution/expenses")]
async fn execution_expenses(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, |execution| {
        let expenses = &execution.expenses;
        ExpenseOverview {
            functions: expense_analysis::top_functions(expenses),
            natures: expense_analysis::top_natures(expenses),
            monthly: expense_analysis::monthly_evolution(expenses),
            suppliers: expense_analysis::top_suppliers(expenses),
            principal: expense_analysis::principal_functions(expenses),
        }
    })
}

#[get("/execution/functions")]
async fn execution_functions(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, |execution| function_options(&execution.expenses))
}

#[get("/execution/functions/{name}")]
async fn execution_function_drilldown(
    data: web::Data<DashboardState>,
    path: web::Path<String>,
) -> impl Responder {
    let name = path.into_inner();
    match data.execution() {
        Ok(execution) => match expense_analysis::drilldown(&execution.expenses, &name) {
            Some(detail) => HttpResponse::Ok().json(detail),
            None => HttpResponse::NotFound().json(ErrorBody {
                error: &format!("Função não encontrada: {}", name),
            }),
        },
        Err(message) => unavailable_json(&message),
    }
}

#[get("/execution/search/revenues")]
async fn execution_search_revenues(
    data: web::Data<DashboardState>,
    query: web::Query<RevenueSearch>,
) -> impl Responder {
    with_execution(&data, |execution| search_revenues(&execution.revenues, &query))
}

#[get("/execution/search/expenses")]
async fn execution_search_expenses(
    data: web::Data<DashboardState>,
    query: web::Query<ExpenseSearch>,
) -> impl Responder {
    with_execution(&data, |execution| search_expenses(&execution.expenses, &query))
}

#[get("/execution/insights")]
async fn execution_insights(data: web::Data<DashboardState>) -> impl Responder {
    with_execution(&data, ExecutionInsights::compute)
}

// ============================================================
// MAINTENANCE ENDPOINTS
// ============================================================

fn worker_failed(logs: &Mutex<Vec<LogEntry>>, task: &str, err: BlockingError) -> HttpResponse {
    error!(error = %err, "{} worker failed", task);
    add_log(logs, "ERROR", "HttpApi", &format!("{} worker failed", task));
    HttpResponse::InternalServerError().json(ErrorBody {
        error: "background task failed",
    })
}

#[get("/diagnostics")]
async fn diagnostics(data: web::Data<DashboardState>) -> impl Responder {
    let state = data.clone();
    let result = web::block(move || DataDiagnostics::run(&DatasetLoader::new(&state.config))).await;
    match result {
        Err(e) => worker_failed(&data.logs, "Diagnostics", e),
        Ok(Ok(report)) => HttpResponse::Ok().json(report),
        Ok(Err(e)) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Diagnostics failed: {}", e),
            );
            unavailable_json(&e.to_string())
        }
    }
}

#[post("/reload")]
async fn reload(data: web::Data<DashboardState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Reloading datasets");
    let state = data.clone();
    match web::block(move || state.reload()).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => worker_failed(&data.logs, "Reload", e),
    }
}

#[get("/health")]
async fn health(data: web::Data<DashboardState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "loa": data.loa().is_ok(),
        "execution": data.execution().is_ok(),
    }))
}

#[get("/logs")]
async fn get_logs(data: web::Data<DashboardState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(PoisonError::into_inner);
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Every dashboard route: HTML pages at the root, JSON under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(loa_summary)
            .service(loa_top_revenues)
            .service(loa_categories)
            .service(loa_levels)
            .service(loa_tax)
            .service(loa_transfers)
            .service(loa_filter)
            .service(loa_insights)
            .service(loa_codes)
            .service(loa_structure)
            .service(execution_summary)
            .service(execution_metrics)
            .service(execution_reconciliation)
            .service(execution_revenues)
            .service(execution_expenses)
            .service(execution_functions)
            .service(execution_function_drilldown)
            .service(execution_search_revenues)
            .service(execution_search_expenses)
            .service(execution_insights)
            .service(diagnostics)
            .service(reload)
            .service(health)
            .service(get_logs),
    )
    .configure(views::configure);
}

pub fn start_server(state: web::Data<DashboardState>) -> std::io::Result<Server> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host.as_str(), port))
    .map_err(|e| {
        error!(error = %e, host = %host, port, "Failed to bind dashboard server");
        e
    })?
    .run();

    info!(host = %host, port, "Dashboard server listening");
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    fn state_for(config: DashboardConfig) -> web::Data<DashboardState> {
        web::Data::new(DashboardState::load(config, Arc::new(Mutex::new(Vec::new()))))
    }

    #[actix_web::test]
    async fn test_loa_summary_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(fixtures::write_all(dir.path()));
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/api/loa/summary").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["total"], 7000.0);
        assert_eq!(body["tax"], 1500.0);
        assert_eq!(body["transfers"], 5300.0);
    }

    #[actix_web::test]
    async fn test_execution_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(fixtures::write_all(dir.path()));
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = actix_test::TestRequest::get()
            .uri("/api/execution/summary")
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totals"]["collected"], 4500.0);
        assert_eq!(body["funnel"][0]["stage"], "Dotado");

        let req = actix_test::TestRequest::get()
            .uri("/api/execution/search/expenses?min_committed=1000")
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 3);

        let req = actix_test::TestRequest::get()
            .uri("/api/execution/functions/Cultura")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_level_breakdown_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(fixtures::write_all(dir.path()));
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;

        for uri in ["/api/loa/levels/0", "/api/loa/levels/11", "/api/loa/levels/18446744073709551615"] {
            let req = actix_test::TestRequest::get().uri(uri).to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }

        let req = actix_test::TestRequest::get().uri("/api/loa/levels/2").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_diagnostics_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(fixtures::write_all(dir.path()));
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/api/diagnostics").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["revenue_rows"], 6);
        assert_eq!(body["loa_total"], 7000.0);

        let empty = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = empty.path().to_path_buf();
        let app = actix_test::init_service(App::new().app_data(state_for(config)).configure(configure)).await;
        let req = actix_test::TestRequest::get().uri("/api/diagnostics").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_missing_data_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();
        let state = state_for(config);
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/api/loa/summary").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let req = actix_test::TestRequest::get().uri("/loa").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(LOAD_ERROR_MESSAGE));
    }

    #[actix_web::test]
    async fn test_reload_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = dir.path().to_path_buf();
        let state = state_for(config);
        assert!(state.loa().is_err());

        fixtures::write_all(dir.path());
        let app =
            actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = actix_test::TestRequest::post().uri("/api/reload").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["loa"], true);
        assert_eq!(body["execution"], true);
        assert!(state.loa().is_ok());

        let req = actix_test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = actix_test::call_and_read_body_json(&app, req).await;
        assert!(logs.iter().any(|l| l.message == "Reloading datasets"));
    }

    #[test]
    fn test_log_buffer_is_bounded() {
        let logs = Mutex::new(Vec::new());
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            add_log(&logs, "INFO", "Test", &format!("entry {}", i));
        }
        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs[0].message, "entry 5");
    }
}
