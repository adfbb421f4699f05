use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ── Conversation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A single uploaded file riding along with the newest user turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileAttachment {
    pub base64: String,
    pub media_type: String,
    pub is_text: bool,
    pub file_name: String,
}

// ── HTTP wire types ───────────────────────────────────────────────────────────

/// Body of `POST /api/finance`. Fields stay loosely typed until
/// [`crate::service::finance_service::validate`] has checked them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub file_data: Option<FileAttachment>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceResponse {
    pub content: String,
    pub has_tool_use: bool,
    pub chart_data: Option<ChartDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelOption {
    pub id: String,
    pub name: String,
    pub default: bool,
}

// ── Outbound conversation (provider-facing) ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub content: OutboundContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn base64_image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        ContentPart::Image {
            source: ImageSource {
                kind: "base64".to_string(),
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }
}

// ── Canonical chart description ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartType {
    Bar,
    MultiBar,
    Line,
    Pie,
    Area,
    StackedArea,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::MultiBar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Area,
        ChartType::StackedArea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::MultiBar => "multiBar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
            ChartType::StackedArea => "stackedArea",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub percentage: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesConfig {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    pub color: String,
    /// Any other fields the model attached to the series, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Series keyed by data key, in the order the model listed them. Serializes
/// as a JSON object whose key order follows insertion. Keys come from a JSON
/// object, so they are already unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesConfigs(Vec<(String, SeriesConfig)>);

impl SeriesConfigs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: String, config: SeriesConfig) {
        self.0.push((key, config));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
impl SeriesConfigs {
    pub fn get(&self, key: &str) -> Option<&SeriesConfig> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesConfig)> {
        self.0.iter().map(|(k, c)| (k.as_str(), c))
    }
}

impl Serialize for SeriesConfigs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, config) in &self.0 {
            map.serialize_entry(key, config)?;
        }
        map.end()
    }
}

/// Renderer-ready chart produced by [`crate::normalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescription {
    pub chart_type: ChartType,
    pub config: ChartConfig,
    pub data: Vec<Value>,
    /// Serialized as `chartConfig`, the key the client reads.
    #[serde(rename = "chartConfig")]
    pub series_config: SeriesConfigs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chart_type_names_round_trip_through_parse() {
        for t in ChartType::ALL {
            assert_eq!(ChartType::parse(t.as_str()), Some(t));
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
        assert_eq!(ChartType::parse("donut"), None);
    }

    #[test]
    fn series_configs_keep_insertion_order_when_serialized() {
        let mut series = SeriesConfigs::new();
        for key in ["zeta", "alpha", "mid"] {
            series.push(
                key.to_string(),
                SeriesConfig {
                    label: key.to_uppercase(),
                    stacked: None,
                    color: "c".into(),
                    extra: Map::new(),
                },
            );
        }
        let value = serde_json::to_value(&series).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn image_part_uses_provider_shape() {
        let part = ContentPart::base64_image("image/png", "AAAA");
        assert_eq!(
            serde_json::to_value(part).unwrap(),
            json!({"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}})
        );
    }

    #[test]
    fn file_attachment_reads_camel_case_with_defaults() {
        let file: FileAttachment =
            serde_json::from_value(json!({"base64": "YQ==", "fileName": "a.txt", "isText": true}))
                .unwrap();
        assert!(file.is_text);
        assert_eq!(file.file_name, "a.txt");
        assert_eq!(file.media_type, "");
    }

    #[test]
    fn finance_response_serializes_null_chart() {
        let resp = FinanceResponse { content: "hi".into(), has_tool_use: false, chart_data: None };
        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({"content": "hi", "hasToolUse": false, "chartData": null})
        );
    }
}
