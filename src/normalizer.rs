//! Turns the model's `generate_graph_data` tool input into a
//! [`ChartDescription`] the client can render.
//!
//! Nothing in the payload is trusted. Structural problems produce a
//! [`ChartRejection`]; everything else is repaired with fallbacks so a chart
//! is either fully formed or absent.

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    ChartConfig, ChartDescription, ChartType, SeriesConfig, SeriesConfigs, Trend, TrendDirection,
};

/// Display colors assigned to series by position, cycling after five.
pub const PALETTE: [&str; 5] = [
    "hsl(var(--chart-1))",
    "hsl(var(--chart-2))",
    "hsl(var(--chart-3))",
    "hsl(var(--chart-4))",
    "hsl(var(--chart-5))",
];

const UNKNOWN_SEGMENT: &str = "Unknown";
const DEFAULT_TOTAL_LABEL: &str = "Total";

/// Why a tool payload could not become a chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartRejection {
    #[error("tool payload is missing")]
    MissingPayload,

    #[error("tool payload is not an object")]
    NotAnObject,

    #[error("tool payload has no `{0}`")]
    MissingField(&'static str),

    #[error("`{field}` must be {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("unsupported chart type '{0}'")]
    UnknownChartType(String),
}

/// Fail-closed entry point used by the service: logs the rejection reason
/// and yields `None` so the accompanying text can still be delivered.
pub fn normalize_tool_payload(payload: Option<&Value>) -> Option<ChartDescription> {
    let result = match payload {
        Some(value) => normalize(value),
        None => Err(ChartRejection::MissingPayload),
    };
    match result {
        Ok(chart) => {
            debug!(
                chart_type = %chart.chart_type,
                records = chart.data.len(),
                series = chart.series_config.len(),
                "chart payload normalized"
            );
            Some(chart)
        }
        Err(reason) => {
            warn!(%reason, payload = ?payload, "invalid chart data structure received from tool");
            None
        }
    }
}

/// Validates `payload` and builds the canonical chart description.
pub fn normalize(payload: &Value) -> Result<ChartDescription, ChartRejection> {
    let root = payload.as_object().ok_or(ChartRejection::NotAnObject)?;

    let chart_type_name = match root.get("chartType") {
        Some(Value::String(s)) if !s.is_empty() => s.as_str(),
        Some(v) if truthy(v) => {
            return Err(ChartRejection::WrongType { field: "chartType", expected: "a string" })
        }
        _ => return Err(ChartRejection::MissingField("chartType")),
    };
    let data = required(root, "data")?
        .as_array()
        .ok_or(ChartRejection::WrongType { field: "data", expected: "an array" })?;
    let raw_config = required(root, "config")?
        .as_object()
        .ok_or(ChartRejection::WrongType { field: "config", expected: "an object" })?;
    let chart_config = required(root, "chartConfig")?
        .as_object()
        .ok_or(ChartRejection::WrongType { field: "chartConfig", expected: "an object" })?;

    let chart_type = ChartType::parse(chart_type_name)
        .ok_or_else(|| ChartRejection::UnknownChartType(chart_type_name.to_string()))?;

    let mut config = read_config(raw_config);

    let data = if chart_type == ChartType::Pie {
        let segment_key = config.x_axis_key.as_deref().unwrap_or("segment");
        let value_key = chart_config.keys().next().map(String::as_str).unwrap_or("value");
        let slices = pie_slices(data, segment_key, value_key);

        config.x_axis_key = Some("segment".to_string());
        if config.total_label.as_deref().map_or(true, str::is_empty) {
            config.total_label = Some(DEFAULT_TOTAL_LABEL.to_string());
        }
        slices
    } else {
        data.clone()
    };

    Ok(ChartDescription {
        chart_type,
        config,
        data,
        series_config: series_configs(chart_config),
    })
}

fn required<'a>(root: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ChartRejection> {
    root.get(field)
        .filter(|v| !v.is_null())
        .ok_or(ChartRejection::MissingField(field))
}

/// Reshapes records into `{segment, value}`, dropping any that have no usable
/// label or a non-numeric value.
fn pie_slices(records: &[Value], segment_key: &str, value_key: &str) -> Vec<Value> {
    records
        .iter()
        .filter_map(|record| {
            let fields = record.as_object();
            let field = |key: &str| fields.and_then(|f| f.get(key));

            let segment = [field(segment_key), field("segment"), field("category"), field("name")]
                .into_iter()
                .flatten()
                .find_map(segment_label)
                .unwrap_or_else(|| UNKNOWN_SEGMENT.to_string());

            let value = [field(value_key), field("value")]
                .into_iter()
                .flatten()
                .find(|v| truthy(v))
                .cloned()
                .unwrap_or_else(|| json!(0));

            if segment == UNKNOWN_SEGMENT || !value.is_number() {
                debug!(?record, "dropping pie record without a segment or numeric value");
                return None;
            }
            Some(json!({ "segment": segment, "value": value }))
        })
        .collect()
}

fn segment_label(value: &Value) -> Option<String> {
    if !truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Builds the series map in the model's key order, assigning each series a
/// palette color by position.
fn series_configs(chart_config: &Map<String, Value>) -> SeriesConfigs {
    chart_config
        .iter()
        .enumerate()
        .fold(SeriesConfigs::new(), |mut acc, (index, (key, value))| {
            let entry = value.as_object();
            let label = entry
                .and_then(|e| e.get("label"))
                .and_then(Value::as_str)
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(key)
                .to_string();
            let stacked = entry.and_then(|e| e.get("stacked")).and_then(Value::as_bool);
            let extra = entry
                .map(|e| {
                    e.iter()
                        .filter(|(k, _)| !matches!(k.as_str(), "label" | "stacked" | "color"))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();

            acc.push(
                key.clone(),
                SeriesConfig {
                    label,
                    stacked,
                    color: PALETTE[index % PALETTE.len()].to_string(),
                    extra,
                },
            );
            acc
        })
}

fn read_config(raw: &Map<String, Value>) -> ChartConfig {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

    ChartConfig {
        title: text("title").unwrap_or_default(),
        description: text("description").unwrap_or_default(),
        x_axis_key: text("xAxisKey").filter(|k| !k.is_empty()),
        total_label: text("totalLabel"),
        footer: text("footer"),
        trend: raw.get("trend").and_then(read_trend),
    }
}

fn read_trend(raw: &Value) -> Option<Trend> {
    let percentage = raw.get("percentage")?.as_f64()?;
    let direction = match raw.get("direction")?.as_str()? {
        "up" => TrendDirection::Up,
        "down" => TrendDirection::Down,
        other => {
            debug!(direction = other, "ignoring trend with unknown direction");
            return None;
        }
    };
    Some(Trend { percentage, direction })
}

/// JavaScript-style truthiness, which is how the model's payloads were
/// written against.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(chart_type: &str, data: Value, chart_config: Value) -> Value {
        json!({
            "chartType": chart_type,
            "config": { "title": "Revenue", "description": "Quarterly" },
            "data": data,
            "chartConfig": chart_config,
        })
    }

    fn reapply(chart: &ChartDescription) -> ChartDescription {
        let value = serde_json::to_value(chart).unwrap();
        normalize(&value).unwrap()
    }

    #[test]
    fn non_pie_data_passes_through_unchanged() {
        let data = json!([
            { "period": "Q1", "revenue": 1250000, "costs": 900000 },
            { "period": "Q2", "revenue": 1450000, "costs": null },
            { "period": "Q3", "revenue": "n/a" }
        ]);
        for chart_type in ChartType::ALL.into_iter().filter(|t| *t != ChartType::Pie) {
            let chart = normalize(&payload(
                chart_type.as_str(),
                data.clone(),
                json!({ "revenue": { "label": "Revenue" } }),
            ))
            .unwrap();
            assert_eq!(chart.chart_type, chart_type);
            assert_eq!(Value::Array(chart.data), data);
            assert_eq!(chart.config.x_axis_key, None);
            assert_eq!(chart.config.total_label, None);
        }
    }

    #[test]
    fn pie_allocation_scenario() {
        let input = json!({
            "chartType": "pie",
            "data": [
                { "segment": "Equities", "value": 5500000 },
                { "segment": "Bonds", "value": 3200000 }
            ],
            "config": { "title": "Alloc", "description": "d", "xAxisKey": "segment" },
            "chartConfig": { "equities": { "label": "Equities" } }
        });

        let chart = normalize(&input).unwrap();

        assert_eq!(
            Value::Array(chart.data),
            json!([
                { "segment": "Equities", "value": 5500000 },
                { "segment": "Bonds", "value": 3200000 }
            ])
        );
        assert_eq!(chart.config.total_label.as_deref(), Some("Total"));
        assert_eq!(chart.config.x_axis_key.as_deref(), Some("segment"));
    }

    #[test]
    fn pie_resolves_keys_through_fallbacks() {
        let input = json!({
            "chartType": "pie",
            "data": [
                { "asset": "Cash", "amount": 100 },
                { "category": "Gold", "amount": 0, "value": 40.5 },
                { "name": "Crypto" },
                { "segment": "", "label": "no name", "amount": 5 }
            ],
            "config": { "title": "t", "description": "d", "xAxisKey": "asset", "totalLabel": "Net worth" },
            "chartConfig": { "amount": { "label": "Amount" } }
        });

        let chart = normalize(&input).unwrap();

        assert_eq!(
            Value::Array(chart.data),
            json!([
                { "segment": "Cash", "value": 100 },
                { "segment": "Gold", "value": 40.5 },
                { "segment": "Crypto", "value": 0 }
            ])
        );
        assert_eq!(chart.config.total_label.as_deref(), Some("Net worth"));
        assert_eq!(chart.config.x_axis_key.as_deref(), Some("segment"));
    }

    #[test]
    fn pie_drops_non_numeric_values_and_keeps_order() {
        let input = payload(
            "pie",
            json!([
                { "segment": "A", "value": 1 },
                { "segment": "B", "value": "12%" },
                { "segment": "Unknown", "value": 3 },
                7,
                { "segment": "C", "value": 2 }
            ]),
            json!({}),
        );

        let chart = normalize(&input).unwrap();

        let segments: Vec<&str> =
            chart.data.iter().map(|r| r["segment"].as_str().unwrap()).collect();
        assert_eq!(segments, ["A", "C"]);
        assert!(chart.data.iter().all(|r| r["value"].is_number()));
        assert!(chart.data.iter().all(|r| r.as_object().unwrap().len() == 2));
    }

    #[test]
    fn empty_total_label_is_defaulted_for_pie() {
        let mut input = payload("pie", json!([]), json!({}));
        input["config"]["totalLabel"] = json!("");
        let chart = normalize(&input).unwrap();
        assert_eq!(chart.config.total_label.as_deref(), Some("Total"));
        assert!(chart.data.is_empty());
    }

    #[test]
    fn series_colors_cycle_by_insertion_index() {
        let chart_config: Map<String, Value> = ["f", "b", "e", "a", "d", "c", "g"]
            .iter()
            .map(|k| (k.to_string(), json!({ "label": k.to_uppercase() })))
            .collect();
        let chart = normalize(&payload("line", json!([]), Value::Object(chart_config))).unwrap();

        let entries: Vec<(&str, &SeriesConfig)> = chart.series_config.iter().collect();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["f", "b", "e", "a", "d", "c", "g"]);

        let colors: Vec<&str> = entries.iter().map(|(_, c)| c.color.as_str()).collect();
        for i in 0..5 {
            for j in (i + 1)..5 {
                assert_ne!(colors[i], colors[j]);
            }
        }
        assert_eq!(colors[0], colors[5]);
        assert_eq!(colors[1], colors[6]);
        assert_eq!(colors[0], "hsl(var(--chart-1))");
    }

    #[test]
    fn series_labels_and_colors_are_repaired() {
        let chart = normalize(&payload(
            "stackedArea",
            json!([]),
            json!({
                "sales": { "label": "Sales ($)", "stacked": true, "color": "#ff0000" },
                "costs": "not an object",
                "margin": { "label": "   " }
            }),
        ))
        .unwrap();

        let sales = chart.series_config.get("sales").unwrap();
        assert_eq!(sales.label, "Sales ($)");
        assert_eq!(sales.stacked, Some(true));
        assert_eq!(sales.color, PALETTE[0]);

        let costs = chart.series_config.get("costs").unwrap();
        assert_eq!(costs.label, "costs");
        assert_eq!(costs.stacked, None);
        assert_eq!(costs.color, PALETTE[1]);

        assert_eq!(chart.series_config.get("margin").unwrap().label, "margin");
    }

    #[test]
    fn extra_series_fields_pass_through() {
        let chart = normalize(&payload(
            "bar",
            json!([]),
            json!({ "rev": { "label": "R", "format": "currency", "stacked": "yes", "color": "red" } }),
        ))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&chart.series_config).unwrap(),
            json!({ "rev": { "label": "R", "color": PALETTE[0], "format": "currency" } })
        );
    }

    #[test]
    fn config_fields_are_read_leniently() {
        let input = json!({
            "chartType": "bar",
            "data": [],
            "config": {
                "title": 42,
                "description": "desc",
                "footer": "Source: 10-K",
                "trend": { "percentage": 5.2, "direction": "up" },
                "extra": true
            },
            "chartConfig": {}
        });
        let chart = normalize(&input).unwrap();
        assert_eq!(chart.config.title, "");
        assert_eq!(chart.config.description, "desc");
        assert_eq!(chart.config.footer.as_deref(), Some("Source: 10-K"));
        assert_eq!(
            chart.config.trend,
            Some(Trend { percentage: 5.2, direction: TrendDirection::Up })
        );

        let mut sideways = input.clone();
        sideways["config"]["trend"]["direction"] = json!("sideways");
        assert_eq!(normalize(&sideways).unwrap().config.trend, None);
    }

    #[test]
    fn normalizing_its_own_output_is_stable() {
        let pie = normalize(&json!({
            "chartType": "pie",
            "data": [
                { "segment": "Equities", "value": 5500000 },
                { "category": "Bonds", "value": 3200000 },
                { "segment": "Cash" }
            ],
            "config": { "title": "Alloc", "description": "d",
                        "trend": { "percentage": 3, "direction": "down" } },
            "chartConfig": { "equities": { "label": "Equities" }, "bonds": {} }
        }))
        .unwrap();
        assert_eq!(reapply(&pie), pie);

        let bars = normalize(&payload(
            "multiBar",
            json!([{ "category": "A", "sales": 1, "costs": 2 }]),
            json!({ "sales": { "label": "Sales" }, "costs": { "label": "Costs", "stacked": false } }),
        ))
        .unwrap();
        assert_eq!(reapply(&bars), bars);
    }

    #[test]
    fn structural_problems_are_rejections() {
        let valid = payload("bar", json!([]), json!({}));
        for field in ["chartType", "data", "config", "chartConfig"] {
            let mut broken = valid.clone();
            broken.as_object_mut().unwrap().remove(field);
            assert_eq!(normalize(&broken), Err(ChartRejection::MissingField(field)));
        }

        let mut wrong = valid.clone();
        wrong["data"] = json!({ "not": "an array" });
        assert!(matches!(normalize(&wrong), Err(ChartRejection::WrongType { field: "data", .. })));

        let mut wrong = valid.clone();
        wrong["config"] = json!("title");
        assert!(matches!(normalize(&wrong), Err(ChartRejection::WrongType { field: "config", .. })));

        let mut wrong = valid.clone();
        wrong["chartConfig"] = json!([1, 2]);
        assert!(matches!(
            normalize(&wrong),
            Err(ChartRejection::WrongType { field: "chartConfig", .. })
        ));

        let mut wrong = valid.clone();
        wrong["chartType"] = json!("donut");
        assert_eq!(normalize(&wrong), Err(ChartRejection::UnknownChartType("donut".into())));

        let mut wrong = valid;
        wrong["chartType"] = json!("");
        assert_eq!(normalize(&wrong), Err(ChartRejection::MissingField("chartType")));

        assert_eq!(normalize(&json!([1, 2, 3])), Err(ChartRejection::NotAnObject));
        assert_eq!(normalize(&Value::Null), Err(ChartRejection::NotAnObject));
    }

    #[test]
    fn fail_closed_wrapper_returns_none() {
        assert_eq!(normalize_tool_payload(None), None);
        assert_eq!(normalize_tool_payload(Some(&json!({ "chartType": "bar" }))), None);
        assert!(normalize_tool_payload(Some(&payload("area", json!([]), json!({})))).is_some());
    }
}
