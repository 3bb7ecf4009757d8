//! Rule definitions and the registry that holds them.
//!
//! A rule is static metadata plus a pure predicate over a `Document`. The
//! predicate answers `Outcome::Pass` or `Outcome::Finding(detail)`; it may
//! return `RuleError` for a defect of its own, which the evaluator turns into
//! a LOW finding instead of aborting the run.

pub mod builtin;

use crate::document::Document;
use crate::models::{Finding, Severity};
use serde::Deserialize;
use thiserror::Error;

/// Result of one rule over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    /// Document-specific description of what was found or missing.
    Finding(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
/// A defect inside a rule predicate (never a property of the input).
pub enum RuleError {
    #[error("rule invariant violated: {0}")]
    Invariant(String),
    #[error("rule panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reference-material citation attached to a rule.
pub struct Evidence {
    pub page: u32,
    pub quote: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Static description of a rule.
pub struct RuleMeta {
    pub code: &'static str,
    pub id: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub pattern_ref: &'static str,
    pub evidence: Evidence,
    pub required_action: &'static str,
}

pub type Predicate = Box<dyn Fn(&Document) -> Result<Outcome, RuleError> + Send + Sync>;

/// A named predicate with fixed severity.
pub struct Rule {
    pub meta: RuleMeta,
    predicate: Predicate,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("meta", &self.meta).finish()
    }
}

impl Rule {
    pub fn new<F>(meta: RuleMeta, predicate: F) -> Self
    where
        F: Fn(&Document) -> Result<Outcome, RuleError> + Send + Sync + 'static,
    {
        Rule {
            meta,
            predicate: Box::new(predicate),
        }
    }

    pub fn id(&self) -> &'static str {
        self.meta.id
    }

    pub fn severity(&self) -> Severity {
        self.meta.severity
    }

    pub fn check(&self, doc: &Document) -> Result<Outcome, RuleError> {
        (self.predicate)(doc)
    }

    /// Build the finding for this rule with a document-specific message.
    pub fn finding(&self, detail: impl Into<String>) -> Finding {
        self.finding_with(self.meta.severity, detail, self.meta.required_action)
    }

    /// LOW finding recording that this rule could not be evaluated.
    pub fn execution_error(&self, err: &RuleError) -> Finding {
        self.finding_with(
            Severity::Low,
            format!("Rule execution error in '{}': {}", self.meta.id, err),
            "Report the defective rule; its verdict for this document is unknown",
        )
    }

    fn finding_with(&self, severity: Severity, detail: impl Into<String>, action: &str) -> Finding {
        Finding {
            id: self.meta.code.to_string(),
            severity,
            rule: self.meta.id.to_string(),
            finding: detail.into(),
            pattern_ref: self.meta.pattern_ref.to_string(),
            evidence_page: self.meta.evidence.page,
            evidence_quote: self.meta.evidence.quote.to_string(),
            required_action: action.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
/// Named registry subsets.
pub enum Profile {
    /// Every rule (CI gate).
    #[default]
    Strict,
    /// Drops LOW-severity rules for early draft review.
    Draft,
}

#[derive(Debug, Default)]
/// Ordered rule set. Constructed once and passed by reference.
pub struct Registry {
    rules: Vec<Rule>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { rules: Vec::new() }
    }

    /// The 17 reference rules in registration order.
    pub fn builtin() -> Self {
        Registry {
            rules: builtin::rules(),
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        let reg = Registry::builtin();
        match profile {
            Profile::Strict => reg,
            Profile::Draft => reg.retain(|r| r.severity() != Severity::Low),
        }
    }

    pub fn register(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Drop rules whose id is listed. Unknown ids are ignored.
    pub fn without(self, ids: &[String]) -> Self {
        self.retain(|r| !ids.iter().any(|id| id == r.id()))
    }

    fn retain(mut self, keep: impl Fn(&Rule) -> bool) -> Self {
        self.rules.retain(|r| keep(r));
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_seventeen_unique_rules() {
        let reg = Registry::builtin();
        assert_eq!(reg.len(), 17);
        let mut ids: Vec<&str> = reg.rules().iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 17);
        assert_eq!(reg.rules()[0].meta.code, "LINT-001");
        assert_eq!(reg.rules()[16].meta.code, "LINT-017");
    }

    #[test]
    fn test_draft_profile_drops_low_rules() {
        let draft = Registry::for_profile(Profile::Draft);
        assert!(draft.rules().iter().all(|r| r.severity() != Severity::Low));
        assert!(draft.get("cost_optimization").is_none());
        assert_eq!(draft.len(), 16);
        // Both profiles can live side by side.
        let strict = Registry::for_profile(Profile::Strict);
        assert_eq!(strict.len(), 17);
    }

    #[test]
    fn test_without_removes_listed_ids() {
        let reg = Registry::builtin().without(&["least_privilege".into(), "nope".into()]);
        assert_eq!(reg.len(), 16);
        assert!(reg.get("least_privilege").is_none());
    }

    #[test]
    fn test_execution_error_is_low() {
        let reg = Registry::builtin();
        let rule = reg.get("max_iterations_required").unwrap();
        let f = rule.execution_error(&RuleError::Invariant("boom".into()));
        assert_eq!(f.severity, Severity::Low);
        assert_eq!(f.rule, "max_iterations_required");
        assert!(f.finding.contains("boom"));
    }
}
