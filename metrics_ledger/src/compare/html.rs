use std::fmt::Write;

use serde_json::json;

use super::{ChartSeries, Comparison, Delta};
use crate::render::{document, escape_html};
use crate::value::MetricValue;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";
const NOT_AVAILABLE: &str = "N/A";

/// Render the comparison as a standalone HTML document with one chart per
/// key metric.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut body = String::new();
    body.push_str("<h1>Metrics Comparison</h1>\n");
    let _ = writeln!(
        body,
        "<p class=\"meta\">Generated at {} &middot; partitions: {}</p>",
        escape_html(&comparison.generated_at),
        escape_html(&comparison.labels.join(", "))
    );

    if !comparison.skipped.is_empty() {
        body.push_str("<ul class=\"skipped\">\n");
        for skipped in &comparison.skipped {
            let _ = writeln!(
                body,
                "<li>Skipped {}: {}</li>",
                escape_html(&skipped.label),
                escape_html(&skipped.reason)
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&render_summary(comparison));
    body.push_str(&render_charts(&comparison.charts));
    body.push_str(&render_details(comparison));

    let head = format!("<script src=\"{}\"></script>\n", CHART_JS);
    document("Metrics Comparison", &head, &body)
}

fn label_header(labels: &[String]) -> String {
    let mut html = String::new();
    for label in labels {
        let _ = write!(html, "<th>{}</th>", escape_html(label));
    }
    html
}

fn value_cell(value: Option<&MetricValue>) -> String {
    match value {
        Some(value) => format!("<td>{}</td>", escape_html(&value.to_string())),
        None => format!("<td class=\"na\">{}</td>", NOT_AVAILABLE),
    }
}

fn delta_cells(delta: Option<&Delta>) -> String {
    match delta {
        Some(delta) => format!(
            "<td class=\"{class}\">{delta}</td><td class=\"{class}\">{class}</td>",
            class = delta.trend.css_class(),
            delta = escape_html(&delta.to_string())
        ),
        None => format!(
            "<td class=\"na\">{}</td><td class=\"na\">{}</td>",
            NOT_AVAILABLE, NOT_AVAILABLE
        ),
    }
}

fn render_summary(comparison: &Comparison) -> String {
    let mut html = String::from("<section>\n<h2>Summary</h2>\n");
    let _ = writeln!(
        html,
        "<table class=\"summary\">\n<thead><tr><th>Metric</th>{}<th>Change</th><th>Status</th></tr></thead>\n<tbody>",
        label_header(&comparison.labels)
    );
    for row in &comparison.summary {
        let _ = write!(html, "<tr><td>{}</td>", row.metric);
        for value in &row.values {
            html.push_str(&value_cell(value.as_ref()));
        }
        html.push_str(&delta_cells(row.delta.as_ref()));
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</section>\n");
    html
}

fn render_details(comparison: &Comparison) -> String {
    let mut html = String::from("<section>\n<h2>Per-test details</h2>\n");
    for table in &comparison.details {
        let _ = writeln!(html, "<h3>{}</h3>", escape_html(&table.test_name));
        let _ = writeln!(
            html,
            "<table class=\"detail\">\n<thead><tr><th>Metric</th>{}<th>Change</th><th>Status</th></tr></thead>\n<tbody>",
            label_header(&comparison.labels)
        );
        for row in &table.rows {
            let _ = write!(html, "<tr><td>{}</td>", escape_html(row.column.name()));
            for value in &row.values {
                html.push_str(&value_cell(value.as_ref()));
            }
            if row.improvable {
                html.push_str(&delta_cells(row.delta.as_ref()));
            } else {
                html.push_str("<td></td><td></td>");
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
    }
    html.push_str("</section>\n");
    html
}

/// JSON for an inline `<script>`; `</` is broken up so data can never close
/// the script element.
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn render_charts(charts: &[ChartSeries]) -> String {
    let mut html = String::from("<section>\n<h2>Charts</h2>\n");
    for chart in charts {
        let id = format!("chart-{}", chart.metric);
        let _ = writeln!(
            html,
            "<h3>{metric}</h3>\n<div style=\"max-width:720px\"><canvas id=\"{id}\"></canvas></div>",
            metric = chart.metric,
            id = id
        );
        let config = json!({
            "type": "bar",
            "data": {
                "labels": chart.labels,
                "datasets": [{
                    "label": chart.metric.as_str(),
                    "data": chart.values,
                }],
            },
            "options": {
                "scales": { "y": { "beginAtZero": true } },
                "plugins": { "legend": { "display": false } },
            },
        });
        let _ = writeln!(
            html,
            "<script>new Chart(document.getElementById({}), {});</script>",
            script_json(&json!(id)),
            script_json(&config)
        );
    }
    html.push_str("</section>\n");
    html
}
