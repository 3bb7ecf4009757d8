//! Output rendering for lint reports.
//!
//! Supports `json` (default) and `text`. JSON is the stable machine
//! contract; text groups findings by severity and carries the same fields.
//! Renderers return strings so callers decide where they go.

use crate::models::{Report, Severity};
use crate::rules::Registry;
use owo_colors::OwoColorize;
use serde::Deserialize;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> JsonVal {
    serde_json::to_value(report).unwrap_or_default()
}

/// Render one report without colors.
pub fn render(report: &Report, format: OutputFormat) -> String {
    render_styled(report, format, false)
}

pub fn render_styled(report: &Report, format: OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(&compose_report_json(report)).unwrap_or_default();
            s.push('\n');
            s
        }
        OutputFormat::Text => render_text(report, color),
    }
}

/// Render all reports of a run. A single report renders as itself; several
/// become a JSON array, or consecutive text blocks.
pub fn render_all(reports: &[Report], format: OutputFormat, color: bool) -> String {
    match (format, reports) {
        (_, [one]) => render_styled(one, format, color),
        (OutputFormat::Json, _) => {
            let items: Vec<JsonVal> = reports.iter().map(compose_report_json).collect();
            let mut s = serde_json::to_string_pretty(&items).unwrap_or_default();
            s.push('\n');
            s
        }
        (OutputFormat::Text, _) => reports
            .iter()
            .map(|r| render_text(r, color))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn paint_severity(sev: Severity, color: bool) -> String {
    let label = format!("[{}]", sev);
    if !color {
        return label;
    }
    match sev {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.yellow().bold().to_string(),
        Severity::Medium => label.cyan().bold().to_string(),
        Severity::Low => label.blue().to_string(),
    }
}

fn render_text(report: &Report, color: bool) -> String {
    let mut out = String::new();
    let title = format!("=== Architecture Lint: {} ===", report.file);
    if color {
        let _ = writeln!(out, "{}", title.bold());
    } else {
        let _ = writeln!(out, "{}", title);
    }
    let s = &report.summary;
    let _ = writeln!(
        out,
        "Summary: {} CRITICAL | {} HIGH | {} MEDIUM | {} LOW | {} total",
        s.critical, s.high, s.medium, s.low, s.total
    );
    if report.findings.is_empty() {
        let _ = writeln!(out, "\nNo findings.");
    }
    for sev in Severity::ALL {
        if s.count(sev) == 0 {
            continue;
        }
        let _ = writeln!(out, "\n-- {} ({}) --", sev, s.count(sev));
        for f in report.findings.iter().filter(|f| f.severity == sev) {
            let _ = writeln!(out, "{} {} {}", paint_severity(sev, color), f.id, f.rule);
            let _ = writeln!(out, "  Finding: {}", f.finding);
            let _ = writeln!(out, "  Pattern: {}", f.pattern_ref);
            let _ = writeln!(
                out,
                "  Evidence: p. {} \"{}\"",
                f.evidence_page, f.evidence_quote
            );
            let _ = writeln!(out, "  Action: {}", f.required_action);
        }
    }
    let verdict = if report.exit_status() == 0 { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "\nResult: {} (exit {})", verdict, report.exit_status());
    out
}

/// One line per registered rule, in registration order.
pub fn render_rule_list(registry: &Registry, color: bool) -> String {
    let mut out = String::new();
    for r in registry.rules() {
        let _ = writeln!(
            out,
            "{} {} {} ({})",
            r.meta.code,
            paint_severity(r.severity(), color),
            r.id(),
            r.meta.description
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Finding;

    fn sample() -> Report {
        Report::new(
            "adr.md",
            vec![
                Finding {
                    id: "LINT-004".into(),
                    severity: Severity::High,
                    rule: "error_handling_required".into(),
                    finding: "no retries".into(),
                    pattern_ref: "patterns/12.md".into(),
                    evidence_page: 203,
                    evidence_quote: "triad".into(),
                    required_action: "add retries".into(),
                },
                Finding {
                    id: "LINT-001".into(),
                    severity: Severity::Critical,
                    rule: "max_iterations_required".into(),
                    finding: "unbounded loop".into(),
                    pattern_ref: "patterns/11.md".into(),
                    evidence_page: 188,
                    evidence_quote: "set max_iterations".into(),
                    required_action: "add a cap".into(),
                },
            ],
        )
    }

    #[test]
    fn test_compose_report_json_shape() {
        let out = compose_report_json(&sample());
        assert_eq!(out["file"], "adr.md");
        assert_eq!(out["summary"]["critical"], 1);
        assert_eq!(out["summary"]["high"], 1);
        assert_eq!(out["summary"]["total"], 2);
        let f = &out["findings"][0];
        let keys: Vec<&str> = f.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "id",
                "severity",
                "rule",
                "finding",
                "pattern_ref",
                "evidence_page",
                "evidence_quote",
                "required_action"
            ]
        );
        assert_eq!(f["severity"], "HIGH");
        assert_eq!(f["evidence_page"], 203);
    }

    #[test]
    fn test_text_groups_by_severity() {
        let text = render(&sample(), OutputFormat::Text);
        let crit = text.find("[CRITICAL] LINT-001 max_iterations_required").unwrap();
        let high = text.find("[HIGH] LINT-004 error_handling_required").unwrap();
        assert!(crit < high);
        assert!(text.contains("Summary: 1 CRITICAL | 1 HIGH | 0 MEDIUM | 0 LOW | 2 total"));
        assert!(text.contains("Evidence: p. 188 \"set max_iterations\""));
        assert!(text.contains("Result: FAIL (exit 1)"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_empty_report_text() {
        let text = render(&Report::new("x.md", vec![]), OutputFormat::Text);
        assert!(text.contains("No findings."));
        assert!(text.contains("Result: PASS (exit 0)"));
    }

    #[test]
    fn test_render_all_json_array_for_many() {
        let reports = vec![sample(), Report::new("b.md", vec![])];
        let s = render_all(&reports, OutputFormat::Json, false);
        let v: JsonVal = serde_json::from_str(&s).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[1]["file"], "b.md");

        let single = render_all(&reports[..1], OutputFormat::Json, false);
        let v: JsonVal = serde_json::from_str(&single).unwrap();
        assert!(v.is_object());
    }

    #[test]
    fn test_rule_list_covers_registry() {
        let reg = Registry::builtin();
        let s = render_rule_list(&reg, false);
        assert_eq!(s.lines().count(), 17);
        assert!(s.starts_with("LINT-001 [CRITICAL] max_iterations_required"));
    }
}
