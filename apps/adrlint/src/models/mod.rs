//! Shared data models for lint results: severities, findings, summaries and
//! per-file reports.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
/// Fixed four-level severity. Declaration order is the display order, so
/// `Critical` sorts first.
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One triggered rule. Field order is the JSON key order.
pub struct Finding {
    /// Rule code, e.g. `LINT-001`.
    pub id: String,
    pub severity: Severity,
    /// Rule identifier, e.g. `max_iterations_required`.
    pub rule: String,
    pub finding: String,
    pub pattern_ref: String,
    pub evidence_page: u32,
    pub evidence_quote: String,
    pub required_action: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Counts per severity plus total.
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl Summary {
    /// Tally findings by severity.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut s = Summary::default();
        for f in findings {
            match f.severity {
                Severity::Critical => s.critical += 1,
                Severity::High => s.high += 1,
                Severity::Medium => s.medium += 1,
                Severity::Low => s.low += 1,
            }
        }
        s.total = findings.len();
        s
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// Only CRITICAL findings gate the run.
    pub fn exit_status(&self) -> i32 {
        if self.critical > 0 {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Lint result for a single document.
pub struct Report {
    pub file: String,
    pub summary: Summary,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn new(file: impl Into<String>, findings: Vec<Finding>) -> Self {
        Report {
            file: file.into(),
            summary: Summary::from_findings(&findings),
            findings,
        }
    }

    pub fn exit_status(&self) -> i32 {
        self.summary.exit_status()
    }
}
