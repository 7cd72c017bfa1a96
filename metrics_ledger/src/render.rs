//! HTML report for a single partition.
//!
//! The report mirrors the table exactly: one `<tr>` per row, columns in
//! header order, cell text verbatim apart from HTML escaping. It is
//! regenerated from scratch after every write.

use std::fmt::Write;

use crate::table::Table;

pub(crate) const BASE_STYLE: &str = "\
body{font-family:system-ui,-apple-system,sans-serif;margin:2rem;color:#1f2937;}\n\
h1,h2,h3{margin-bottom:0.5rem;}\n\
table{border-collapse:collapse;margin:0.75rem 0 1.5rem 0;font-size:0.9rem;}\n\
th,td{border:1px solid #d1d5db;padding:0.3rem 0.6rem;text-align:left;}\n\
th{background:#f3f4f6;font-weight:600;}\n\
tr:nth-child(even) td{background:#fafafa;}\n\
.meta{color:#6b7280;margin-bottom:1rem;}\n\
.improvement{color:#047857;font-weight:600;}\n\
.regression{color:#b91c1c;font-weight:600;}\n\
.neutral{color:#6b7280;}\n\
.na{color:#9ca3af;font-style:italic;}\n";

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Wrap `body` in a complete HTML document.
pub(crate) fn document(title: &str, head_extra: &str, body: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(title));
    let _ = write!(html, "<style>\n{}</style>\n", BASE_STYLE);
    html.push_str(head_extra);
    html.push_str("</head>\n<body>\n");
    html.push_str(body);
    html.push_str("</body>\n</html>\n");
    html
}

/// Render a ledger table as a standalone HTML document.
pub fn render_table(table: &Table, title: &str) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(title));
    let _ = writeln!(
        body,
        "<p class=\"meta\">{} test(s), {} column(s)</p>",
        table.len(),
        table.header().len()
    );

    body.push_str("<table class=\"ledger\">\n<thead>\n<tr>");
    for column in table.header() {
        let _ = write!(body, "<th>{}</th>", escape_html(column));
    }
    body.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in table.rows() {
        body.push_str("<tr>");
        let _ = write!(body, "<td>{}</td>", escape_html(&row.test_name));
        for cell in &row.cells {
            let _ = write!(body, "<td>{}</td>", escape_html(cell));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</tbody>\n</table>\n");

    document(title, "", &body)
}
