use rig::completion::ToolDefinition;
use serde_json::json;

use crate::models::ChartType;

pub const TOOL_NAME: &str = "generate_graph_data";

pub const PREAMBLE: &str = "You are a financial data visualization expert. \
Analyze the user's financial data and, whenever a chart helps, call the \
generate_graph_data tool instead of describing the chart in prose.

Chart types:
- line: time series, metrics over time, market performance
- bar: single metric comparisons, period-over-period analysis
- multiBar: several metrics side by side across categories
- area: volumes or cumulative quantities over time
- stackedArea: component breakdowns over time, composition changes
- pie: distributions, allocations, market share

Data layout:
- Time series and comparisons: one record per x-axis value, for example \
{ period: \"Q1 2024\", revenue: 1250000 }, with config.xAxisKey naming the \
x-axis field and one chartConfig entry per plotted metric, for example \
chartConfig: { revenue: { label: \"Revenue ($)\" } }.
- Pie: records of the form { segment: \"Equities\", value: 5500000 }, \
config.xAxisKey = \"segment\" and a config.totalLabel such as \"Total Assets\".

Always give a descriptive title and description, add trend information \
(percentage and direction) and a footer when they are meaningful, and use \
data keys named after the real metrics. Use the user's data, never \
placeholders. Do not mention the tool or implementation details in your \
reply.";

/// JSON schema of the single charting tool offered to the model.
pub fn chart_tool() -> ToolDefinition {
    let chart_types: Vec<&str> = ChartType::ALL.iter().map(|t| t.as_str()).collect();

    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: "Generate structured JSON data for creating financial charts and graphs."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "chartType": {
                    "type": "string",
                    "enum": chart_types,
                    "description": "The type of chart to generate"
                },
                "config": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "trend": {
                            "type": "object",
                            "properties": {
                                "percentage": { "type": "number" },
                                "direction": { "type": "string", "enum": ["up", "down"] }
                            }
                        },
                        "footer": { "type": "string" },
                        "totalLabel": { "type": "string" },
                        "xAxisKey": { "type": "string" }
                    },
                    "required": ["title", "description"]
                },
                "data": {
                    "type": "array",
                    "items": { "type": "object", "additionalProperties": true }
                },
                "chartConfig": {
                    "type": "object",
                    "additionalProperties": {
                        "type": "object",
                        "properties": {
                            "label": { "type": "string" },
                            "stacked": { "type": "boolean" }
                        },
                        "required": ["label"]
                    },
                    "description": "Configuration for chart series (lines, bars, pie slices)"
                }
            },
            "required": ["chartType", "config", "data", "chartConfig"]
        }),
    }
}
