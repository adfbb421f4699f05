use gloo_net::http::Request;

use crate::models::{ErrorBody, FinanceRequest, FinanceResponse, ModelOption};

/// Base URL of the backend API server.
const API_BASE: &str = "http://localhost:3000";

/// Fetches the selectable models from the backend.
pub async fn fetch_models() -> Result<Vec<ModelOption>, String> {
    let resp = Request::get(&format!("{API_BASE}/api/models"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<Vec<ModelOption>>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

/// Sends one chat turn. Non-2xx replies surface the backend's `error` field.
pub async fn send_finance(body: &FinanceRequest) -> Result<FinanceResponse, String> {
    let resp = Request::post(&format!("{API_BASE}/api/finance"))
        .json(body)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        let status = resp.status();
        return Err(match resp.json::<ErrorBody>().await {
            Ok(err) if !err.error.is_empty() => {
                log::warn!("finance request failed ({status}): {} {}", err.error, err.details);
                err.error
            }
            _ => format!("HTTP error! status: {status}"),
        });
    }

    resp.json::<FinanceResponse>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}
