mod agent;
mod assembler;
mod config;
mod errors;
mod models;
mod normalizer;
mod routes;
mod service;

use std::sync::Arc;

use tracing::info;

use crate::agent::AnthropicChartModel;
use crate::config::AppConfig;
use crate::routes::finance_routes::router;
use crate::service::finance_service::FinanceService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finchart=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = AppConfig::from_env()?;
    if let Some(model) = config.default_model() {
        info!(default_model = %model.id, models = config.models.len(), "model list loaded");
    }

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let model = AnthropicChartModel::new(&config)?;
    let service = FinanceService::new(Arc::new(model), config.models.clone());

    // ── Router ────────────────────────────────────────────────────────────────
    let app = router(service);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
