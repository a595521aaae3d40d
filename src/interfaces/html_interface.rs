use std::fs;
use std::path::{Path, PathBuf};
use chrono::Utc;
use crate::data_structures::{ReportRecord, SummaryStats};
use crate::error::Result;
use crate::interfaces::timestamped_filename;

/// Rendering cap per table; keeps the static document small for large sets.
pub const MAX_HTML_ROWS: usize = 50;

/// One rendered table with a heading, assembled per report before the
/// document is stitched together.
pub struct Section {
    heading: String,
    body: String,
}

pub fn section<R: ReportRecord>(heading: &str, records: &[R]) -> Section {
    Section {
        heading: heading.to_string(),
        body: render_table(records),
    }
}

/// Render the full static report document: summary tiles, then one table per
/// section. Inline CSS only, no scripting, no external resources.
pub fn render_document(
    title: &str,
    stats: &SummaryStats,
    sections: &[Section],
    synthetic: bool,
) -> String {
    let banner = if synthetic {
        r#"<div class="banner">Generated from sample data: the live service was unreachable or returned nothing.</div>"#
    } else {
        ""
    };

    let sections_html: String = sections
        .iter()
        .map(|s| format!("<h2>{}</h2>\n{}", escape_html(&s.heading), s.body))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<div class="container">
<header><h1>{title}</h1><div class="meta">Generated {generated} UTC</div></header>
{banner}
{tiles}
{sections}
<footer>exchange-report-collector</footer>
</div>
</body>
</html>"#,
        title = escape_html(title),
        css = inline_css(),
        generated = Utc::now().format("%Y-%m-%d %H:%M:%S"),
        banner = banner,
        tiles = render_tiles(stats),
        sections = sections_html,
    )
}

pub fn write_html(dir: &Path, stem: &str, document: &str) -> Result<PathBuf> {
    let path = dir.join(timestamped_filename(stem, "html"));
    fs::write(&path, document)?;
    Ok(path)
}

fn render_tiles(stats: &SummaryStats) -> String {
    let tiles: String = stats
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<div class="tile"><div class="tile-value">{}</div><div class="tile-label">{}</div></div>"#,
                escape_html(value),
                escape_html(name),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("<div class=\"tiles\">\n{}\n</div>", tiles)
}

fn render_table<R: ReportRecord>(records: &[R]) -> String {
    let names = R::field_names();
    let header: String = names
        .iter()
        .map(|n| format!("<th>{}</th>", escape_html(n)))
        .collect();

    let rows: String = if records.is_empty() {
        format!(
            "<tr class=\"placeholder\"><td colspan=\"{}\">No records for the selected window</td></tr>",
            names.len()
        )
    } else {
        records
            .iter()
            .take(MAX_HTML_ROWS)
            .map(|record| {
                let cells: String = record
                    .field_values()
                    .iter()
                    .map(|v| format!("<td>{}</td>", escape_html(v)))
                    .collect();
                let class = record.css_class();
                if class.is_empty() {
                    format!("<tr>{}</tr>", cells)
                } else {
                    format!("<tr class=\"{}\">{}</tr>", class, cells)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let truncation_note = if records.len() > MAX_HTML_ROWS {
        format!(
            "<p class=\"note\">Showing first {} of {} records; the full set is in the CSV.</p>",
            MAX_HTML_ROWS,
            records.len()
        )
    } else {
        String::new()
    };

    format!(
        "<table>\n<thead><tr>{}</tr></thead>\n<tbody>\n{}\n</tbody>\n</table>\n{}",
        header, rows, truncation_note
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; line-height: 1.5; color: #111827; background: #ffffff; }
.container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
header { margin-bottom: 1.5rem; padding-bottom: 1rem; border-bottom: 2px solid #e5e7eb; }
header h1 { font-size: 1.75rem; }
header .meta { color: #6b7280; font-size: 0.875rem; }
.banner { background: #fef3c7; border: 1px solid #f59e0b; padding: 0.75rem 1rem; border-radius: 4px; margin-bottom: 1.5rem; }
.tiles { display: flex; flex-wrap: wrap; gap: 1rem; margin-bottom: 2rem; }
.tile { background: #f9fafb; border: 1px solid #e5e7eb; border-radius: 6px; padding: 1rem 1.5rem; min-width: 10rem; }
.tile-value { font-size: 1.5rem; font-weight: 700; }
.tile-label { color: #6b7280; font-size: 0.8rem; text-transform: uppercase; }
h2 { font-size: 1.2rem; margin: 1.5rem 0 0.75rem; }
table { border-collapse: collapse; width: 100%; font-size: 0.875rem; }
th, td { text-align: left; padding: 0.4rem 0.75rem; border-bottom: 1px solid #e5e7eb; }
th { background: #f3f4f6; }
tr.status-ok td { background: #f0fdf4; }
tr.status-warn td { background: #fffbeb; }
tr.status-bad td { background: #fef2f2; }
tr.placeholder td { color: #6b7280; font-style: italic; text-align: center; padding: 1.5rem; }
.note { color: #6b7280; font-size: 0.8rem; margin: 0.5rem 0 1rem; }
footer { margin-top: 2rem; padding-top: 1rem; border-top: 1px solid #e5e7eb; color: #9ca3af; font-size: 0.75rem; }
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{SummaryStats, TransportRuleRecord};

    fn rules(n: usize) -> Vec<TransportRuleRecord> {
        (0..n)
            .map(|i| TransportRuleRecord {
                name: format!("Rule <{}> & \"co\"", i),
                state: "Enabled".to_string(),
                priority: i as i32,
            })
            .collect()
    }

    fn stats() -> SummaryStats {
        let mut stats = SummaryStats::new();
        stats.push("Rules", 3);
        stats
    }

    #[test]
    fn test_empty_set_renders_single_placeholder_row() {
        let document = render_document("Test", &stats(), &[section("Rules", &rules(0))], false);
        assert_eq!(document.matches("class=\"placeholder\"").count(), 1);
        assert!(document.contains("No records for the selected window"));
    }

    #[test]
    fn test_row_cap() {
        let document = render_document("Test", &stats(), &[section("Rules", &rules(80))], false);
        // header row plus the capped body rows
        assert_eq!(document.matches("<tr>").count(), MAX_HTML_ROWS + 1);
        assert!(document.contains("Showing first 50 of 80 records"));
    }

    #[test]
    fn test_no_scripting_and_escaped_values() {
        let document = render_document("Test", &stats(), &[section("Rules", &rules(2))], false);
        assert!(!document.contains("<script"));
        assert!(document.contains("Rule &lt;0&gt; &amp; &quot;co&quot;"));
    }

    #[test]
    fn test_synthetic_banner() {
        let with = render_document("Test", &stats(), &[], true);
        assert!(with.contains("sample data"));
        let without = render_document("Test", &stats(), &[], false);
        assert!(!without.contains("class=\"banner\""));
    }

    #[test]
    fn test_tiles_render_all_metrics() {
        let mut stats = SummaryStats::new();
        stats.push("Messages", 10);
        stats.push("Failed", 2);
        let document = render_document("Test", &stats, &[], false);
        assert_eq!(document.matches("class=\"tile\"").count(), 2);
    }
}
