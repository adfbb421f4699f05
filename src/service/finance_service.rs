use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::{ChartModel, ModelReply};
use crate::assembler::assemble;
use crate::errors::AppError;
use crate::models::{ChatMessage, FileAttachment, FinanceRequest, FinanceResponse, ModelOption};
use crate::normalizer::normalize_tool_payload;

pub const CHART_ONLY_CONTENT: &str = "Generated a chart.";
pub const EMPTY_RESPONSE_CONTENT: &str = "I received an empty response.";

/// A request that passed validation, ready for the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTurn {
    pub messages: Vec<ChatMessage>,
    pub attachment: Option<FileAttachment>,
    pub model: String,
}

/// Runs one chat turn: validate, assemble, call the model, normalize the
/// chart. Holds no per-request state, so clones are shared freely across
/// handlers.
#[derive(Clone)]
pub struct FinanceService {
    model: Arc<dyn ChartModel>,
    models: Arc<[ModelOption]>,
}

impl FinanceService {
    pub fn new(model: Arc<dyn ChartModel>, models: Vec<ModelOption>) -> Self {
        Self { model, models: models.into() }
    }

    pub fn models(&self) -> &[ModelOption] {
        &self.models
    }

    pub async fn process(&self, request: FinanceRequest) -> Result<FinanceResponse, AppError> {
        let turn = validate(request)?;
        info!(
            model = %turn.model,
            messages = turn.messages.len(),
            file = turn.attachment.as_ref().map(|f| f.file_name.as_str()),
            media_type = turn.attachment.as_ref().map(|f| f.media_type.as_str()),
            "processing finance request"
        );

        // File decoding failures stop here, before the model is called.
        let outbound = assemble(&turn.messages, turn.attachment.as_ref())?;

        let reply = self.model.complete(&turn.model, outbound).await?;
        Ok(build_response(&reply))
    }
}

/// Checks the loosely-typed request body in the order the client expects
/// errors: the messages array, then model, then each entry, then file data.
pub fn validate(request: FinanceRequest) -> Result<ValidatedTurn, AppError> {
    let items = match request.messages {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(AppError::validation(
                "Messages array is required",
                "`messages` must be an array of { role, content } objects",
            ))
        }
    };

    let model = request
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            AppError::validation("Model selection is required", "`model` must name a model id")
        })?;

    let messages = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<ChatMessage>(item).map_err(|e| {
                AppError::validation("Invalid message entry", format!("messages[{i}]: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(file) = &request.file_data {
        if file.base64.is_empty() {
            return Err(AppError::validation("No file data", "`fileData.base64` is empty"));
        }
    }

    if messages.is_empty() && request.file_data.is_none() {
        return Err(AppError::validation(
            "Messages array is required",
            "`messages` must contain at least one message",
        ));
    }

    Ok(ValidatedTurn { messages, attachment: request.file_data, model })
}

/// Shapes the model reply for the client. A tool call whose payload cannot
/// be normalized still delivers the reply text.
pub fn build_response(reply: &ModelReply) -> FinanceResponse {
    let tool_use = reply.first_tool_use();
    let chart_data = tool_use.and_then(|(name, input)| {
        debug!(tool = name, "model called a tool");
        normalize_tool_payload(Some(input))
    });

    if tool_use.is_some() && chart_data.is_none() {
        warn!("tool use detected but chart data processing failed; returning text only");
    }

    let content = match reply.first_text().filter(|t| !t.is_empty()) {
        Some(text) => text.to_string(),
        None if chart_data.is_some() => CHART_ONLY_CONTENT.to_string(),
        None => EMPTY_RESPONSE_CONTENT.to_string(),
    };

    FinanceResponse { content, has_tool_use: tool_use.is_some(), chart_data }
}
