use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analyze::Analyzer;
use crate::model::{AnalysisResult, HistoryItem};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/history", get(history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    content: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResp {
    #[serde(flatten)]
    result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    extracted_content: Option<String>,
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rej) => {
            tracing::debug!(error = %rej, "rejected /analyze body");
            return bad_request("Request body must be JSON like {\"content\": \"...\"}.");
        }
    };
    let content = req.content.unwrap_or_default();

    match state.analyzer.analyze(&content).await {
        Ok(report) => Json(AnalyzeResp {
            result: report.result,
            extracted_content: report.extracted,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn history(State(state): State<AppState>) -> Json<Vec<HistoryItem>> {
    Json(state.analyzer.history().items())
}
