use std::time::Instant;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use log::{info, warn};
use tower_http::cors::{Any, CorsLayer};

use crate::AppState;
use crate::analyzer::{PageSummary, normalize};
use crate::api::models::AnalyzeQuery;
use crate::api::response;
use crate::error::Result;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", get(analyze_handler))
        .route("/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler() -> impl IntoResponse {
    response::success("ok")
}

async fn analyze_handler(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Response {
    let raw_url = query.url.unwrap_or_default();
    if raw_url.trim().is_empty() {
        return response::error::<PageSummary>(StatusCode::BAD_REQUEST, "url is empty".to_string())
            .into_response();
    }

    info!("Processing request for URL: {}", raw_url);
    let start_time = Instant::now();

    let result = tokio::time::timeout(
        state.config.request_timeout,
        process_analyze_request(&state, &raw_url),
    )
    .await;

    match result {
        Ok(Ok(summary)) => response::success(summary).into_response(),
        Ok(Err(err)) => {
            warn!("Analysis of {} failed: {}", raw_url, err);
            err.into_response()
        }
        Err(_) => {
            warn!("Analysis of {} timed out after {:?}", raw_url, start_time.elapsed());
            response::error::<PageSummary>(
                StatusCode::GATEWAY_TIMEOUT,
                "Request processing timed out".to_string(),
            )
            .into_response()
        }
    }
}

async fn process_analyze_request(state: &AppState, raw_url: &str) -> Result<PageSummary> {
    let cache_key = normalize(raw_url)?.to_string();

    if !state.config.cache_ttl.is_zero()
        && let Some(cached) = state.cache.get(&cache_key)
    {
        // A TTL too large for chrono never goes stale.
        let fresh = chrono::Duration::from_std(state.config.cache_ttl)
            .map(|ttl| cached.is_fresh(ttl, Utc::now()))
            .unwrap_or(true);
        if fresh {
            info!("Cache hit for URL: {}", cache_key);
            return Ok(cached.summary);
        }
    }

    let summary = state.analyzer.analyze_page(&cache_key).await?;
    state.cache.set(cache_key, summary.clone());
    Ok(summary)
}
