//! HTML rendering for the dashboard
//!
//! Charts are drawn client-side by Plotly; this module only serializes the series.
//! The documents around it are askama templates under `templates/`.

use askama::Template;
use sensor_storage::SensorReading;
use serde::Serialize;

/// DOM id of the chart container
const CHART_ID: &str = "time-series-chart";

/// Series offered in the dashboard selector
pub const DATA_TYPES: [&str; 2] = ["temperature", "pH"];

#[derive(Serialize)]
struct Trace<'a> {
    x: Vec<&'a str>,
    y: Vec<f64>,
    mode: &'static str,
    name: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Title {
    text: &'static str,
}

#[derive(Serialize)]
struct Axis {
    title: Title,
}

#[derive(Serialize)]
struct Annotation {
    text: &'static str,
    xref: &'static str,
    yref: &'static str,
    x: f64,
    y: f64,
    showarrow: bool,
}

#[derive(Serialize)]
struct Layout {
    title: Title,
    xaxis: Axis,
    yaxis: Axis,
    template: &'static str,
    autosize: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<Annotation>,
}

impl Layout {
    fn new(title: &'static str) -> Self {
        Self {
            title: Title { text: title },
            xaxis: Axis {
                title: Title { text: "Date" },
            },
            yaxis: Axis {
                title: Title { text: "Average" },
            },
            template: "plotly_white",
            autosize: true,
            annotations: Vec::new(),
        }
    }
}

/// Serializes to JSON that can sit inside a `<script>` element
fn script_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

/// Renders a series as a Plotly line chart fragment.
///
/// Points are plotted in `insert_date` order. An empty series gives an empty chart
/// with a notice instead of an error.
pub fn render_time_series(readings: &[SensorReading]) -> askama::Result<String> {
    let mut sorted: Vec<&SensorReading> = readings.iter().collect();
    sorted.sort_by(|a, b| a.insert_date.cmp(&b.insert_date));

    let (data, layout) = if sorted.is_empty() {
        let mut layout = Layout::new("No data");
        layout.annotations.push(Annotation {
            text: "No data for the selected period",
            xref: "paper",
            yref: "paper",
            x: 0.5,
            y: 0.5,
            showarrow: false,
        });
        (Vec::new(), layout)
    } else {
        let trace = Trace {
            x: sorted.iter().map(|r| r.insert_date.as_str()).collect(),
            y: sorted.iter().map(|r| r.avg_value).collect(),
            mode: "lines+markers",
            name: "Average",
            kind: "scatter",
        };
        (vec![trace], Layout::new("Time series"))
    };

    ChartTemplate {
        chart_id: CHART_ID,
        data: script_json(&data),
        layout: script_json(&layout),
    }
    .render()
}

#[derive(Template)]
#[template(path = "chart.html")]
struct ChartTemplate {
    chart_id: &'static str,
    data: String,
    layout: String,
}

struct SeriesOption<'a> {
    name: &'a str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    options: Vec<SeriesOption<'a>>,
    days: u32,
    chart_id: &'static str,
    chart_html: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    message: &'a str,
}

/// Renders the full dashboard document around a chart fragment.
///
/// A `data_type` outside [`DATA_TYPES`] is still offered, as the selected option.
pub fn render_dashboard_page(
    data_type: &str,
    days: u32,
    chart_html: &str,
) -> askama::Result<String> {
    let mut options: Vec<SeriesOption<'_>> = DATA_TYPES
        .iter()
        .map(|&name| SeriesOption {
            name,
            selected: name == data_type,
        })
        .collect();
    if !DATA_TYPES.contains(&data_type) {
        options.push(SeriesOption {
            name: data_type,
            selected: true,
        });
    }

    DashboardTemplate {
        options,
        days,
        chart_id: CHART_ID,
        chart_html,
    }
    .render()
}

/// Renders a full error document
pub fn render_error_page(message: &str) -> askama::Result<String> {
    ErrorTemplate { message }.render()
}
