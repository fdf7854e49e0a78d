use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use lexis_core::{DocId, EngineConfig, SearchEngine};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub display_id: u64,
    pub filename: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<SearchEngine>>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(engine: SearchEngine, admin_token: Option<String>) -> Self {
        Self { engine: Arc::new(RwLock::new(engine)), admin_token }
    }
}

pub fn build_app(config: EngineConfig) -> Result<Router> {
    let engine = SearchEngine::open(config)?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    Ok(router(AppState::new(engine, admin_token)))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let engine = state.engine.read();
    let (doc_ids, error) = match engine.process_query(&params.q) {
        Ok(doc_ids) => (doc_ids, None),
        Err(e) => {
            tracing::warn!(query = %params.q, error = %e, "malformed query");
            (Vec::new(), Some(e.to_string()))
        }
    };
    let results: Vec<SearchHit> = doc_ids
        .iter()
        .filter_map(|&doc_id| {
            let meta = engine.document(doc_id)?;
            let display_id = lexis_core::format::display_id(engine.index(), doc_id);
            Some(SearchHit { doc_id, display_id, filename: meta.filename.clone() })
        })
        .collect();
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results, error })
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let engine = state.engine.read();
    let meta = engine.document(doc_id).ok_or((StatusCode::NOT_FOUND, "not found".to_string()))?;
    let mut obj = serde_json::json!({
        "doc_id": doc_id,
        "display_id": lexis_core::format::display_id(engine.index(), doc_id),
        "filename": meta.filename,
    });
    if let Ok(text) = lexis_core::build::read_document(std::path::Path::new(&meta.path)) {
        obj["text"] = serde_json::Value::String(text);
    }
    Ok(Json(obj))
}

async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    // The corpus scan runs under a read lock so searches keep being served;
    // the write lock is only taken to swap the new index in.
    let (report, total_terms) = tokio::task::spawn_blocking(move || -> Result<_> {
        let (index, report) = engine.read().build_index()?;
        let total_terms = index.num_terms();
        engine.write().replace_index(index);
        Ok((report, total_terms))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    tracing::info!(processed = report.processed, failed = report.failed.len(), "index rebuilt");
    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|f| serde_json::json!({ "filename": f.filename, "error": f.error }))
        .collect();
    Ok(Json(serde_json::json!({
        "processed": report.processed,
        "failed": failed,
        "total_terms": total_terms,
    })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
