use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::FinanceRequest;
use crate::service::finance_service::FinanceService;

/// Every route the server exposes. The finance endpoint is not behind
/// authentication; only the client page is.
pub fn router(service: FinanceService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/finance", post(finance_handler))
        .route("/api/models", get(models_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST `/api/finance` — one chat turn, optionally producing a chart.
pub async fn finance_handler(
    State(svc): State<FinanceService>,
    body: Result<Json<FinanceRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("finance", %request_id);

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(parent: &span, "rejected request body: {rejection}");
            return AppError::validation("Invalid request body", rejection.body_text())
                .into_response();
        }
    };

    match svc.process(request).instrument(span.clone()).await {
        Ok(response) => {
            let mut resp = Json(response).into_response();
            resp.headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            resp
        }
        Err(err) => {
            if err.is_validation() {
                warn!(parent: &span, "finance request rejected: {err}");
            } else {
                error!(parent: &span, "finance request failed: {err}");
            }
            err.into_response()
        }
    }
}

/// GET `/api/models` — the model ids the client may pick from.
pub async fn models_handler(State(svc): State<FinanceService>) -> impl IntoResponse {
    Json(svc.models().to_vec())
}

/// GET `/health`
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
