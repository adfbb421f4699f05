use leptos::prelude::*;
use serde_json::Value;

use crate::models::ChartData;
use crate::state::AppState;

/// Side panel showing one chart at a time, with a dot per chart produced in
/// this session.
#[component]
pub fn ChartPanel() -> impl IntoView {
    let state = expect_context::<AppState>();

    let count = move || state.session.with(|s| s.charts().len());
    let current = move || {
        state.session.with(|s| s.charts().get(s.chart_index).map(|c| (*c).clone()))
    };

    view! {
        <aside class="chart-panel">
            {move || match current() {
                None => view! {
                    <div class="empty-state">"Charts you ask for will appear here"</div>
                }.into_any(),
                Some(chart) => view! { <ChartCard chart=chart /> }.into_any(),
            }}
            <div class="chart-dots">
                {move || {
                    let selected = state.session.with(|s| s.chart_index);
                    (0..count())
                        .map(|i| view! {
                            <button
                                class="chart-dot"
                                class:active={i == selected}
                                title={format!("Chart {}", i + 1)}
                                on:click=move |_| state.select_chart(i)
                            />
                        })
                        .collect_view()
                }}
            </div>
        </aside>
    }
}

#[component]
fn ChartCard(chart: ChartData) -> impl IntoView {
    let series = chart.series();
    let trend = chart.config.trend.clone().map(|t| {
        let arrow = if t.direction == "up" { "▲" } else { "▼" };
        view! {
            <div class={format!("trend trend-{}", t.direction)}>
                {format!("Trending {} by {}% {arrow}", t.direction, t.percentage)}
            </div>
        }
    });
    let body = if chart.chart_type == "pie" { pie_table(&chart) } else { series_table(&chart) };

    view! {
        <div class="chart-card">
            <div class="chart-type">{chart.chart_type.clone()}</div>
            <h3>{chart.config.title.clone()}</h3>
            <p class="chart-description">{chart.config.description.clone()}</p>
            <div class="chart-legend">
                {series
                    .into_iter()
                    .map(|(key, label, color)| view! {
                        <span class="legend-item" title=key>
                            <span class="swatch" style={format!("background:{color}")}></span>
                            {label}
                        </span>
                    })
                    .collect_view()}
            </div>
            {body}
            {trend}
            {chart.config.footer.clone().map(|f| view! { <div class="chart-footer">{f}</div> })}
        </div>
    }
}

/// Category column plus one column per series, each cell carrying a bar
/// scaled to the series maximum.
fn series_table(chart: &ChartData) -> AnyView {
    let x_key = chart.config.x_axis_key.clone().unwrap_or_default();
    let series = chart.series();
    let maxima: Vec<f64> = series
        .iter()
        .map(|(key, _, _)| {
            chart.data.iter().filter_map(|row| number(row, key)).fold(0.0, f64::max)
        })
        .collect();

    let header = series
        .iter()
        .map(|(_, label, _)| view! { <th>{label.clone()}</th> })
        .collect_view();

    let rows = chart
        .data
        .iter()
        .map(|row| {
            let cells = series
                .iter()
                .zip(&maxima)
                .map(|((key, _, color), max)| {
                    let value = number(row, key);
                    let width = match value {
                        Some(v) if *max > 0.0 => (v / max * 100.0).clamp(0.0, 100.0),
                        _ => 0.0,
                    };
                    view! {
                        <td>
                            <div class="bar" style={format!("width:{width:.1}%;background:{color}")}></div>
                            {value.map(format_number).unwrap_or_default()}
                        </td>
                    }
                })
                .collect_view();
            view! { <tr><td>{cell_text(row.get(&x_key))}</td>{cells}</tr> }
        })
        .collect_view();

    view! {
        <table class="chart-table">
            <thead><tr><th>{x_key.clone()}</th>{header}</tr></thead>
            <tbody>{rows}</tbody>
        </table>
    }
    .into_any()
}

/// Segment/value rows with each segment's share, and a total row.
fn pie_table(chart: &ChartData) -> AnyView {
    let total: f64 = chart.data.iter().filter_map(|row| number(row, "value")).sum();
    let total_label = chart.config.total_label.clone().unwrap_or_else(|| "Total".to_string());

    let rows = chart
        .data
        .iter()
        .map(|row| {
            let value = number(row, "value").unwrap_or(0.0);
            let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
            view! {
                <tr>
                    <td>{cell_text(row.get("segment"))}</td>
                    <td>{format_number(value)}</td>
                    <td>{format!("{share:.1}%")}</td>
                </tr>
            }
        })
        .collect_view();

    view! {
        <table class="chart-table">
            <thead><tr><th>"Segment"</th><th>"Value"</th><th>"Share"</th></tr></thead>
            <tbody>{rows}</tbody>
            <tfoot><tr><td>{total_label}</td><td>{format_number(total)}</td><td>"100%"</td></tr></tfoot>
        </table>
    }
    .into_any()
}

fn number(row: &Value, key: &str) -> Option<f64> {
    row.get(key).and_then(Value::as_f64)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_render_without_noise() {
        assert_eq!(format_number(60.0), "60");
        assert_eq!(format_number(12.5), "12.50");
    }

    #[test]
    fn cells_show_strings_bare() {
        assert_eq!(cell_text(Some(&json!("Q1"))), "Q1");
        assert_eq!(cell_text(Some(&json!(2024))), "2024");
        assert_eq!(cell_text(None), "");
    }
}
