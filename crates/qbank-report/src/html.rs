//! HTML upload report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use qbank_core::report::UploadBatchReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page for an upload report.
pub fn generate_html(report: &UploadBatchReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>qbank upload: {}</title>\n",
        html_escape(&report.module_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>qbank upload report</h1>\n");
    let topic = report
        .topic_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "none".to_string());
    html.push_str(&format!(
        "<p class=\"meta\">Module: <strong>{}</strong> | Topic: {} | {} {} | {}{}</p>\n",
        html_escape(&report.module_id),
        topic,
        report.question_type,
        report.format,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if report.dry_run { " | dry run" } else { "" }
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str(
        "<thead><tr><th>Total</th><th>Valid</th><th>Duplicate</th><th>Invalid</th></tr></thead>\n",
    );
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td class=\"pass\">{}</td><td class=\"dup\">{}</td><td class=\"fail\">{}</td></tr></tbody>\n",
        report.total,
        report.valid_count(),
        report.duplicate_count(),
        report.invalid_count()
    ));
    html.push_str("</table>\n");
    if report.total > 0 {
        html.push_str(&generate_split_bar(report));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Rows</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"rows\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0, true)\">Row</th><th onclick=\"sortTable(1)\">Status</th><th onclick=\"sortTable(2)\">Question</th><th onclick=\"sortTable(3)\">Detail</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    let mut rows: Vec<(usize, &str, &str, &str, String)> = Vec::with_capacity(report.total);
    for a in &report.accepted {
        let detail = a
            .question_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "not stored (dry run)".to_string());
        rows.push((a.row, "pass", "valid", a.text.as_str(), detail));
    }
    for d in &report.duplicates {
        rows.push((d.row, "dup", "duplicate", d.text.as_str(), d.reason.clone()));
    }
    for i in &report.invalid {
        rows.push((i.row, "fail", "invalid", i.text.as_str(), i.reason.clone()));
    }
    rows.sort_by_key(|r| r.0);

    for (row, class, status, text, detail) in rows {
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{row}</td><td>{status}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(text),
            html_escape(&detail)
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &UploadBatchReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// One horizontal bar split into valid / duplicate / invalid segments.
fn generate_split_bar(report: &UploadBatchReport) -> String {
    let width = 600.0;
    let height = 28;
    let total = report.total as f64;

    let segments = [
        (report.valid_count(), "#22c55e", "valid"),
        (report.duplicate_count(), "#eab308", "duplicate"),
        (report.invalid_count(), "#ef4444", "invalid"),
    ];

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        width as usize,
        height + 24
    );
    let mut x = 0.0;
    for (count, color, label) in segments {
        if count == 0 {
            continue;
        }
        let w = count as f64 / total * width;
        svg.push_str(&format!(
            "  <rect x=\"{x:.1}\" y=\"0\" width=\"{w:.1}\" height=\"{height}\" fill=\"{color}\"><title>{label}: {count}</title></rect>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\">{label} {:.0}%</text>\n",
            x + 4.0,
            height + 16,
            count as f64 / total * 100.0
        ));
        x += w;
    }
    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --dup: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --dup: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.dup { background: var(--dup); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col, numeric) {
  const table = document.getElementById('rows');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = !(table.dataset.sortCol == col && table.dataset.sortDir == 'asc');
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const cmp = numeric ? Number(va) - Number(vb) : va.localeCompare(vb);
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
