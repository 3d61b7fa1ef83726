use crate::api_error::ApiError;
use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use cb_core::template_service::TemplateService;
use cb_domain::{GenerateDashboardResponse, ProjectId, StoredChart, TemplateConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

#[derive(Clone, Debug)]
pub struct AppState {
    pub service: Arc<TemplateService>,
    /// When set, every route except `/health` requires `Authorization: Bearer <api_token>`.
    pub api_token: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/template/:provider", get(get_template))
        .route("/project/:project_id/template/:provider", post(generate_dashboard))
        .route("/project/:project_id/chart", get(list_charts))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_token));

    Router::new()
        .route("/health", get(health))
        .merge(api_router)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_request(trace::DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO))
                .on_failure(trace::DefaultOnFailure::new().level(Level::ERROR)),
        )
        .with_state(state)
}

async fn require_api_token(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if tokens_match(token, expected) => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Compares in time independent of where the tokens differ.
fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len() && provided.bytes().zip(expected.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

async fn health() -> &'static str {
    "ok"
}

async fn get_template(State(state): State<AppState>, Path(provider): Path<String>) -> Result<Json<TemplateConfig>, ApiError> {
    Ok(Json(state.service.catalog(&provider)?))
}

async fn generate_dashboard(
    State(state): State<AppState>,
    Path((project_id, provider)): Path<(i64, String)>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<GenerateDashboardResponse>, ApiError> {
    let response = state.service.generate(&provider, ProjectId(project_id), params).await?;

    Ok(Json(response))
}

async fn list_charts(State(state): State<AppState>, Path(project_id): Path<i64>) -> Result<Json<Vec<StoredChart>>, ApiError> {
    Ok(Json(state.service.list_charts(ProjectId(project_id)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("brew", "brew"));
        assert!(!tokens_match("brex", "brew"));
        assert!(!tokens_match("bre", "brew"));
        assert!(!tokens_match("", "brew"));
    }
}
