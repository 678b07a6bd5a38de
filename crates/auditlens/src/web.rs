use crate::prelude::{eprintln, *};
use crate::services::Services;
use auditlens_core::analysis::AnalysisResult;
use auditlens_core::input::SubmissionForm;
use auditlens_core::report::{report_file_name, DownloadableReport};
use auditlens_core::ContractInput;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "AUDITLENS_PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "AUDITLENS_HOST", default_value = "127.0.0.1")]
    pub host: String,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let services = Arc::new(Services::from_global(&global)?);
    let addr = format!("{}:{}", options.host, options.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("auditlens listening on http://{}", addr);
    if global.verbose {
        eprintln!("auditlens listening on http://{}", addr);
        eprintln!("Analyze endpoint: http://{}/api/analyze", addr);
    }

    axum::serve(listener, router(services.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    if let Some(store) = &services.store {
        store.close();
    }
    log::info!("auditlens stopped");

    Ok(())
}

pub fn router(services: Arc<Services>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/reports", get(list_reports_handler))
        .route("/api/reports/{id}", get(get_report_handler))
        .route("/api/reports/{id}/download", get(download_report_handler))
        .layer(cors)
        .with_state(services)
}

async fn health_handler(State(services): State<Arc<Services>>) -> Json<serde_json::Value> {
    let store = match &services.store {
        Some(store) if store.is_healthy().await => "ok",
        Some(_) => "unavailable",
        None => "disabled",
    };
    Json(serde_json::json!({ "status": "ok", "store": store }))
}

/// Validates the form, then runs the analysis. Validation failures and
/// analysis failures both come back as a `failure` result.
async fn analyze_handler(
    State(services): State<Arc<Services>>,
    Json(form): Json<SubmissionForm>,
) -> Json<AnalysisResult> {
    let input = match ContractInput::from_form(form) {
        Ok(input) => input,
        Err((error, identifier)) => return Json(AnalysisResult::failure(error, identifier)),
    };

    Json(
        crate::analyze::analyze_contract(
            input,
            &services.analyzer,
            &services.fetcher,
            services.store.as_ref(),
        )
        .await,
    )
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

async fn list_reports_handler(
    State(services): State<Arc<Services>>,
    Query(params): Query<ListParams>,
) -> Response {
    let Some(store) = &services.store else {
        return store_disabled();
    };

    match store.list(params.limit.unwrap_or(20).min(100)).await {
        Ok(reports) => Json(reports).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_report_handler(
    State(services): State<Arc<Services>>,
    Path(id): Path<i64>,
) -> Response {
    let Some(store) = &services.store else {
        return store_disabled();
    };

    match store.get(id).await {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => not_found(id),
        Err(e) => internal_error(e),
    }
}

async fn download_report_handler(
    State(services): State<Arc<Services>>,
    Path(id): Path<i64>,
) -> Response {
    let Some(store) = &services.store else {
        return store_disabled();
    };

    let report = match store.get(id).await {
        Ok(Some(report)) => report,
        Ok(None) => return not_found(id),
        Err(e) => return internal_error(e),
    };

    let file_name = report_file_name(
        &report.document.contract_identifier,
        chrono::Utc::now().date_naive(),
    );
    let body = DownloadableReport::from(report.document);

    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )],
        Json(body),
    )
        .into_response()
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn not_found(id: i64) -> Response {
    error_body(StatusCode::NOT_FOUND, format!("Report {id} not found"))
}

fn store_disabled() -> Response {
    error_body(
        StatusCode::SERVICE_UNAVAILABLE,
        "Report persistence is disabled".to_string(),
    )
}

fn internal_error(e: color_eyre::eyre::Report) -> Response {
    log::error!("Report store error: {}", e);
    error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::SourceFetcher;
    use crate::llm::OllamaAnalyzer;
    use crate::store::ReportStore;
    use auditlens_core::analysis::{Severity, Vulnerability};
    use auditlens_core::report::ReportDocument;
    use chrono::{TimeZone, Utc};

    /// Services whose analyzer and fetcher point at closed ports; only the
    /// store is live.
    fn services(store: Option<ReportStore>) -> Arc<Services> {
        Arc::new(Services {
            analyzer: OllamaAnalyzer::new("http://127.0.0.1:9", "test-model").unwrap(),
            fetcher: SourceFetcher::new("http://127.0.0.1:9/api".into(), None, 1).unwrap(),
            store,
        })
    }

    async fn serve(services: Arc<Services>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(services)).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn seeded_store(dir: &tempfile::TempDir) -> (ReportStore, i64) {
        let store = ReportStore::open(dir.path().join("reports.db")).unwrap();
        let id = store
            .insert(ReportDocument::new(
                "https://example.com/Token.sol",
                vec!["Mythril".into()],
                vec![Vulnerability {
                    id: "VULN-001".into(),
                    title: "Integer overflow".into(),
                    severity: Severity::Low,
                    description: "Unchecked arithmetic in an assembly block.".into(),
                    tool: "Mythril".into(),
                }],
                Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap(),
            ))
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_invalid_address_is_a_failure_result() {
        let base = serve(services(None)).await;

        let result: AnalysisResult = reqwest::Client::new()
            .post(format!("{base}/api/analyze"))
            .json(&serde_json::json!({ "inputType": "address", "contractAddress": "0x123" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(
            result,
            AnalysisResult::failure(
                "Invalid Contract Address: Invalid Ethereum address format.",
                Some("0x123".into())
            )
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_failure_result() {
        let base = serve(services(None)).await;

        let result: AnalysisResult = reqwest::Client::new()
            .post(format!("{base}/api/analyze"))
            .json(&serde_json::json!({
                "inputType": "address",
                "contractAddress": "0xdAC17F958D2ee523a2206206994597C13D831ec7"
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let AnalysisResult::Failure { error, .. } = result else {
            panic!("expected a failure result");
        };
        assert!(error.contains("ETHERSCAN_API_KEY"));
    }

    #[tokio::test]
    async fn test_get_and_download_report() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = seeded_store(&dir).await;
        let base = serve(services(Some(store))).await;
        let client = reqwest::Client::new();

        let report: serde_json::Value = client
            .get(format!("{base}/api/reports/{id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(report["id"], id);
        assert_eq!(report["vulnerabilities"][0]["severity"], "Low");

        let response = client
            .get(format!("{base}/api/reports/{id}/download"))
            .send()
            .await
            .unwrap();
        let disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with(
            "attachment; filename=\"auditlens_report_https___example.com_Token.sol_"
        ));

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["aiSelectedTools"][0], "Mythril");
        assert!(body["summary"].as_str().unwrap().starts_with("This is an AI-generated"));
    }

    #[tokio::test]
    async fn test_missing_report_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = seeded_store(&dir).await;
        let base = serve(services(Some(store))).await;

        let response = reqwest::get(format!("{base}/api/reports/999")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reports_without_store() {
        let base = serve(services(None)).await;

        let response = reqwest::get(format!("{base}/api/reports")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        let health: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["store"], "disabled");
    }
}
