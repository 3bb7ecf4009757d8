//! Lint runner: rule evaluation with per-rule failure isolation, plus the
//! file-level driver used by the CLI.
//!
//! Produces one `Report` per input. Findings keep registration order. A rule
//! that returns `RuleError` or panics contributes a single LOW finding and
//! the remaining rules still run.

use crate::document::{Builder, Document};
use crate::error::LintError;
use crate::models::{Finding, Report};
use crate::rules::{Outcome, Registry, RuleError};
use glob::glob;
use rayon::prelude::*;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Apply every registered rule to `doc`, in registration order.
pub fn evaluate(doc: &Document, registry: &Registry) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rule in registry.rules() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| rule.check(doc)))
            .unwrap_or_else(|payload| Err(RuleError::Panicked(panic_message(payload.as_ref()))));
        match result {
            Ok(Outcome::Pass) => {
                tracing::debug!(rule = rule.id(), "pass");
            }
            Ok(Outcome::Finding(detail)) => {
                tracing::debug!(rule = rule.id(), severity = %rule.severity(), "finding");
                findings.push(rule.finding(detail));
            }
            Err(e) => {
                tracing::warn!(rule = rule.id(), error = %e, "rule execution failed");
                findings.push(rule.execution_error(&e));
            }
        }
    }
    findings
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Build and evaluate one document held in memory.
pub fn lint_text(file: &str, raw_text: &str, builder: &Builder, registry: &Registry) -> Report {
    let doc = builder.build(raw_text);
    Report::new(file, evaluate(&doc, registry))
}

/// Read one input as UTF-8 text.
pub fn read_input(path: &Path) -> Result<String, LintError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            LintError::NotText {
                path: path.to_path_buf(),
            }
        } else {
            LintError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Expand CLI arguments. Arguments with glob metacharacters are expanded
/// (sorted, must match at least one file); others pass through unchanged so
/// a missing path surfaces as a read error.
pub fn expand_inputs(args: &[String]) -> Result<Vec<String>, LintError> {
    let mut out: Vec<String> = Vec::new();
    for arg in args {
        if !arg.contains(|c: char| matches!(c, '*' | '?' | '[')) {
            out.push(arg.clone());
            continue;
        }
        let entries = glob(arg).map_err(|source| LintError::Pattern {
            pattern: arg.clone(),
            source,
        })?;
        let mut matched: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
        if matched.is_empty() {
            return Err(LintError::NoMatch(arg.clone()));
        }
        matched.sort();
        out.extend(matched.into_iter().map(|p| p.to_string_lossy().to_string()));
    }
    Ok(out)
}

/// Lint every input. All files are read before any is evaluated, so an
/// unreadable input fails the run without partial output. Evaluation runs
/// in parallel; reports come back in input order.
pub fn run_lint(
    inputs: &[String],
    builder: &Builder,
    registry: &Registry,
) -> Result<Vec<Report>, LintError> {
    let texts: Vec<(&str, String)> = inputs
        .iter()
        .map(|p| read_input(Path::new(p)).map(|t| (p.as_str(), t)))
        .collect::<Result<_, _>>()?;
    tracing::info!(files = texts.len(), rules = registry.len(), "linting");
    Ok(texts
        .par_iter()
        .map(|(file, text)| lint_text(file, text, builder, registry))
        .collect())
}

/// Overall verdict across reports.
pub fn exit_status(reports: &[Report]) -> i32 {
    reports.iter().map(Report::exit_status).max().unwrap_or(0)
}
