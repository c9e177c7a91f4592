//! # API REST
//!
//! HTTP surface for MedQuery.
//!
//! Handles:
//! - the single page at `/`
//! - `POST /api/analyze`, which runs one question through the analysis pipeline
//!
//! All pipeline work happens in `medquery-core`; this crate only moves it onto a blocking
//! thread and serialises the outcome.

#![warn(rust_2018_idioms)]

pub mod page;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use medquery_core::{Analysis, AnalysisService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(service: AnalysisService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeReq {
    #[serde(default)]
    pub question: String,
}

/// Response of `POST /api/analyze`. Every variant carries a `state` field.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyzeRes {
    Completed(Analysis),
    Failed(ErrorRes),
}

/// Generic failure caught at the top of the handler.
#[derive(Debug, Serialize)]
pub struct ErrorRes {
    state: &'static str,
    message: String,
}

impl ErrorRes {
    fn new(message: String) -> Self {
        Self {
            state: "error",
            message,
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[axum::debug_handler]
async fn index() -> Html<String> {
    Html(page::render_index())
}

/// Runs one analysis.
///
/// Every pipeline outcome, including generation and SQL failures, is a `200` whose `state`
/// tells the page what to show. Only a failure outside the pipeline itself (the blocking task
/// panicking or being cancelled) yields `500` with `state: "error"`.
#[axum::debug_handler]
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeReq>,
) -> (StatusCode, Json<AnalyzeRes>) {
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || service.analyse(&req.question)).await {
        Ok(analysis) => (StatusCode::OK, Json(AnalyzeRes::Completed(analysis))),
        Err(e) => {
            tracing::error!("Analysis task failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeRes::Failed(ErrorRes::new(format!(
                    "Error processing request: {e}"
                )))),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use medquery_core::{
        provision, CoreConfig, Database, GenerationConfig, GenerationError, MockGenerator,
        Question, SqlGenerator,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct PanickingGenerator;

    impl SqlGenerator for PanickingGenerator {
        fn generate_sql(
            &self,
            _question: &Question,
            _prompt: &str,
        ) -> Result<String, GenerationError> {
            panic!("renderer blew up");
        }
    }

    fn app(generator: Arc<dyn SqlGenerator>) -> (Router, TempDir) {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(
            temp.path().join("healthcare_db.sqlite3"),
            GenerationConfig::new(None, "http://127.0.0.1:1".into()),
        )
        .unwrap();
        provision(&cfg, true).unwrap();
        let service = AnalysisService::new(Database::new(&cfg), generator);
        (router(AppState::new(service)), temp)
    }

    fn analyze_request(question: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "question": question }).to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_serves_the_page() {
        let (app, _temp) = app(Arc::new(MockGenerator::replying("SELECT 1")));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Smart Healthcare Data Explorer"));
        assert!(html.contains("Upcoming appointments for cardiology department"));
    }

    #[tokio::test]
    async fn analyze_returns_sql_and_table() {
        let (app, _temp) = app(Arc::new(MockGenerator::replying(
            "```sql\nSELECT name FROM departments\n```",
        )));

        let response = app.oneshot(analyze_request("List all departments")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["state"], "results");
        assert_eq!(json["sql"], "SELECT name FROM departments");
        assert_eq!(json["table"]["columns"], serde_json::json!(["name"]));
        assert_eq!(json["table"]["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_question_is_a_warning() {
        let generator = Arc::new(MockGenerator::replying("SELECT 1"));
        let (app, _temp) = app(generator.clone());

        let response = app.oneshot(analyze_request("  ")).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["state"], "warning");
        assert_eq!(json["message"], "Please enter a question");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn generation_failure_has_no_sql_or_table() {
        let (app, _temp) = app(Arc::new(MockGenerator::failing("quota exceeded")));

        let response = app.oneshot(analyze_request("List all departments")).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["state"], "generation_failed");
        assert!(json.get("sql").is_none());
        assert!(json.get("table").is_none());
    }

    #[tokio::test]
    async fn execution_failure_keeps_sql_and_notice() {
        let (app, _temp) = app(Arc::new(MockGenerator::replying("SELECT * FROM wards")));

        let response = app.oneshot(analyze_request("List all wards")).await.unwrap();

        let json = body_json(response).await;
        assert_eq!(json["state"], "execution_failed");
        assert_eq!(json["sql"], "SELECT * FROM wards");
        assert!(json["message"].as_str().unwrap().starts_with("SQL Error:"));
        assert_eq!(json["notice"], "No results found for this query");
    }

    #[tokio::test]
    async fn unexpected_failure_is_a_generic_error() {
        let (app, _temp) = app(Arc::new(PanickingGenerator));

        let response = app.oneshot(analyze_request("List all departments")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["state"], "error");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("Error processing request:"));
    }
}
