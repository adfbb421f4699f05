pub mod chart_tool;

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, ImageMediaType, Message as RigMessage, UserContent};
use rig::prelude::CompletionClient;
use rig::providers::anthropic;
use rig::OneOrMany;
use serde_json::Value;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{ContentPart, OutboundContent, OutboundMessage, Role};

use self::chart_tool::{chart_tool, PREAMBLE};

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u64 = 4096;

/// One content block of a model reply, in the order the model produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBlock {
    Text(String),
    ToolUse { name: String, input: Value },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub blocks: Vec<ReplyBlock>,
}

impl ModelReply {
    pub fn first_text(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            ReplyBlock::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// Name and input of the first tool call.
    pub fn first_tool_use(&self) -> Option<(&str, &Value)> {
        self.blocks.iter().find_map(|b| match b {
            ReplyBlock::ToolUse { name, input } => Some((name.as_str(), input)),
            _ => None,
        })
    }
}

/// The model-invocation step. One call per chat turn, no retries.
#[async_trait]
pub trait ChartModel: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<ModelReply, AppError>;
}

/// [`ChartModel`] backed by the rig Anthropic provider, offering the
/// `generate_graph_data` tool on every request.
#[derive(Clone)]
pub struct AnthropicChartModel {
    client: anthropic::Client,
}

impl AnthropicChartModel {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let mut builder = anthropic::Client::builder().api_key(config.api_key.as_str());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build Anthropic client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChartModel for AnthropicChartModel {
    async fn complete(
        &self,
        model_id: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<ModelReply, AppError> {
        let mut history = messages
            .into_iter()
            .map(to_rig_message)
            .collect::<Result<Vec<_>, _>>()?;
        let prompt = history.pop().ok_or_else(|| {
            AppError::validation("Messages array is required", "the conversation is empty")
        })?;

        info!(model = model_id, history = history.len(), "calling Anthropic with chart tool");

        let model = self.client.completion_model(model_id);
        let response = model
            .completion_request(prompt)
            .preamble(PREAMBLE.to_string())
            .messages(history)
            .tool(chart_tool())
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic completion failed for model {model_id}: {e}");
                upstream_error(e.to_string())
            })?;

        let blocks = response
            .choice
            .into_iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(ReplyBlock::Text(text.text)),
                AssistantContent::ToolCall(call) => Some(ReplyBlock::ToolUse {
                    name: call.function.name,
                    input: call.function.arguments,
                }),
                _ => None,
            })
            .collect();

        Ok(ModelReply { blocks })
    }
}

fn to_rig_message(message: OutboundMessage) -> Result<RigMessage, AppError> {
    match (message.role, message.content) {
        (Role::User, OutboundContent::Text(text)) => Ok(RigMessage::user(text)),
        (Role::Assistant, OutboundContent::Text(text)) => Ok(RigMessage::assistant(text)),
        (_, OutboundContent::Parts(parts)) => {
            let content = parts
                .into_iter()
                .map(|part| match part {
                    ContentPart::Text { text } => UserContent::text(text),
                    ContentPart::Image { source } => UserContent::image_base64(
                        source.data,
                        image_media_type(&source.media_type),
                        None,
                    ),
                })
                .collect::<Vec<_>>();
            let content = OneOrMany::many(content)
                .map_err(|_| AppError::Unexpected("multi-part message has no parts".to_string()))?;
            Ok(RigMessage::User { content })
        }
    }
}

fn image_media_type(mime: &str) -> Option<ImageMediaType> {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some(ImageMediaType::JPEG),
        "image/png" => Some(ImageMediaType::PNG),
        "image/gif" => Some(ImageMediaType::GIF),
        "image/webp" => Some(ImageMediaType::WEBP),
        _ => None,
    }
}

/// Wraps a provider failure, recovering the HTTP status from the provider's
/// error type where the message names one.
fn upstream_error(message: String) -> AppError {
    AppError::UpstreamProvider { status: status_hint(&message), message }
}

fn status_hint(message: &str) -> u16 {
    const KNOWN: [(&str, u16); 8] = [
        ("invalid_request_error", 400),
        ("authentication_error", 401),
        ("permission_error", 403),
        ("not_found_error", 404),
        ("request_too_large", 413),
        ("rate_limit_error", 429),
        ("overloaded_error", 529),
        ("api_error", 500),
    ];
    if let Some((_, status)) = KNOWN.iter().find(|(kind, _)| message.contains(kind)) {
        return *status;
    }
    let lower = message.to_ascii_lowercase();
    if lower.contains("error sending request") || lower.contains("connection refused") {
        return 502;
    }
    500
}
