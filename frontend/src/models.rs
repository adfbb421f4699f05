use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the conversation sent to the backend.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Matches the backend `FileAttachment` (`fileData` on the wire).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub base64: String,
    pub media_type: String,
    pub is_text: bool,
    pub file_name: String,
    #[serde(skip)]
    pub file_size: u64,
}

/// Request body for `POST /api/finance`.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRequest {
    pub messages: Vec<WireMessage>,
    pub file_data: Option<FileData>,
    pub model: String,
}

/// Response from `POST /api/finance`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub has_tool_use: bool,
    #[serde(default)]
    pub chart_data: Option<ChartData>,
}

/// Body of any non-2xx backend response.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub details: String,
}

/// Matches the backend `ModelOption`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ModelOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

/// Canonical chart as produced by the backend normalizer.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub chart_type: String,
    pub config: ChartConfig,
    #[serde(default)]
    pub data: Vec<Value>,
    /// Series in display order.
    #[serde(default)]
    pub chart_config: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub x_axis_key: Option<String>,
    pub total_label: Option<String>,
    pub footer: Option<String>,
    pub trend: Option<Trend>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Trend {
    pub percentage: f64,
    pub direction: String,
}

impl ChartData {
    /// `(key, label, color)` for each series, in order.
    pub fn series(&self) -> Vec<(String, String, String)> {
        self.chart_config
            .iter()
            .map(|(key, cfg)| {
                let label = cfg.get("label").and_then(Value::as_str).unwrap_or(key);
                let color = cfg.get("color").and_then(Value::as_str).unwrap_or("currentColor");
                (key.clone(), label.to_string(), color.to_string())
            })
            .collect()
    }
}
