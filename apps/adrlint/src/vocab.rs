//! Detector vocabulary: the phrase lists behind every document field.
//!
//! Each `FieldKey` names one detection capability. Phrase detectors record
//! the lines where any of their terms occur; structural detectors derive
//! their values from other fields (and, for `privileged_tools`, from a verb
//! list kept here too).
//!
//! Term syntax:
//! - Matching is case-insensitive.
//! - A term matches whole words only: `rag` does not match `storage` or
//!   `ragged`.
//! - A trailing `*` turns the term into a prefix: `evaluat*` matches
//!   `evaluation` and `evaluate`.
//! - Word boundaries are only enforced next to alphanumeric characters, so
//!   `user:` and `.well-known` work as written.
//!
//! Defaults can be replaced or extended per key from `adrlint.toml`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Names of the extracted document fields.
pub enum FieldKey {
    // Phrase detectors.
    LoopLanguage,
    IterationLimit,
    MultiStep,
    TerminationCriteria,
    ToolMention,
    ToolGrant,
    PrivilegeScoping,
    ReadOnlyRole,
    Justification,
    ProductionIntent,
    ErrorHandling,
    UserInput,
    InputValidation,
    OutputFiltering,
    ToolRestriction,
    EscalationPath,
    AgentMention,
    EvalMetrics,
    HumanOversight,
    EscalationTriggers,
    EscalationTimeout,
    MemoryState,
    MemoryScoping,
    Retrieval,
    HybridSearch,
    RelevanceThreshold,
    AgentToAgent,
    AgentCard,
    ExternalDeployment,
    TransportAuth,
    MultiAgent,
    AgentContracts,
    ExternalToolResults,
    InjectionMitigation,
    CostConcern,
    CostOptimization,
    SideEffects,
    Workflow,
    Checkpointing,
    // Structural detectors.
    ToolList,
    PrivilegedTools,
    UnjustifiedGrants,
    ReadOnlyGrants,
    GuardrailLayersMentioned,
}

impl FieldKey {
    /// Keys whose values are source lines matched by a phrase list.
    pub const PHRASE: [FieldKey; 39] = [
        FieldKey::LoopLanguage,
        FieldKey::IterationLimit,
        FieldKey::MultiStep,
        FieldKey::TerminationCriteria,
        FieldKey::ToolMention,
        FieldKey::ToolGrant,
        FieldKey::PrivilegeScoping,
        FieldKey::ReadOnlyRole,
        FieldKey::Justification,
        FieldKey::ProductionIntent,
        FieldKey::ErrorHandling,
        FieldKey::UserInput,
        FieldKey::InputValidation,
        FieldKey::OutputFiltering,
        FieldKey::ToolRestriction,
        FieldKey::EscalationPath,
        FieldKey::AgentMention,
        FieldKey::EvalMetrics,
        FieldKey::HumanOversight,
        FieldKey::EscalationTriggers,
        FieldKey::EscalationTimeout,
        FieldKey::MemoryState,
        FieldKey::MemoryScoping,
        FieldKey::Retrieval,
        FieldKey::HybridSearch,
        FieldKey::RelevanceThreshold,
        FieldKey::AgentToAgent,
        FieldKey::AgentCard,
        FieldKey::ExternalDeployment,
        FieldKey::TransportAuth,
        FieldKey::MultiAgent,
        FieldKey::AgentContracts,
        FieldKey::ExternalToolResults,
        FieldKey::InjectionMitigation,
        FieldKey::CostConcern,
        FieldKey::CostOptimization,
        FieldKey::SideEffects,
        FieldKey::Workflow,
        FieldKey::Checkpointing,
    ];

    /// Safety layers every document handling untrusted input must name.
    pub const GUARDRAIL_LAYERS: [FieldKey; 4] = [
        FieldKey::InputValidation,
        FieldKey::OutputFiltering,
        FieldKey::ToolRestriction,
        FieldKey::EscalationPath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::LoopLanguage => "loop_language",
            FieldKey::IterationLimit => "iteration_limit",
            FieldKey::MultiStep => "multi_step",
            FieldKey::TerminationCriteria => "termination_criteria",
            FieldKey::ToolMention => "tool_mention",
            FieldKey::ToolGrant => "tool_grant",
            FieldKey::PrivilegeScoping => "privilege_scoping",
            FieldKey::ReadOnlyRole => "read_only_role",
            FieldKey::Justification => "justification",
            FieldKey::ProductionIntent => "production_intent",
            FieldKey::ErrorHandling => "error_handling",
            FieldKey::UserInput => "user_input",
            FieldKey::InputValidation => "input_validation",
            FieldKey::OutputFiltering => "output_filtering",
            FieldKey::ToolRestriction => "tool_restriction",
            FieldKey::EscalationPath => "escalation_path",
            FieldKey::AgentMention => "agent_mention",
            FieldKey::EvalMetrics => "eval_metrics",
            FieldKey::HumanOversight => "human_oversight",
            FieldKey::EscalationTriggers => "escalation_triggers",
            FieldKey::EscalationTimeout => "escalation_timeout",
            FieldKey::MemoryState => "memory_state",
            FieldKey::MemoryScoping => "memory_scoping",
            FieldKey::Retrieval => "retrieval",
            FieldKey::HybridSearch => "hybrid_search",
            FieldKey::RelevanceThreshold => "relevance_threshold",
            FieldKey::AgentToAgent => "agent_to_agent",
            FieldKey::AgentCard => "agent_card",
            FieldKey::ExternalDeployment => "external_deployment",
            FieldKey::TransportAuth => "transport_auth",
            FieldKey::MultiAgent => "multi_agent",
            FieldKey::AgentContracts => "agent_contracts",
            FieldKey::ExternalToolResults => "external_tool_results",
            FieldKey::InjectionMitigation => "injection_mitigation",
            FieldKey::CostConcern => "cost_concern",
            FieldKey::CostOptimization => "cost_optimization",
            FieldKey::SideEffects => "side_effects",
            FieldKey::Workflow => "workflow",
            FieldKey::Checkpointing => "checkpointing",
            FieldKey::ToolList => "tool_list",
            FieldKey::PrivilegedTools => "privileged_tools",
            FieldKey::UnjustifiedGrants => "unjustified_grants",
            FieldKey::ReadOnlyGrants => "read_only_grants",
            FieldKey::GuardrailLayersMentioned => "guardrail_layers_mentioned",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in term lists. `PrivilegedTools` holds verbs compared against the
/// segments of a tool name rather than phrases matched against lines.
fn builtin_terms(key: FieldKey) -> &'static [&'static str] {
    match key {
        FieldKey::LoopLanguage => &[
            "loop*", "while", "iteration*", "iterate*", "cycle*", "agentic loop",
            "goals_met", "goal check*", "react", "plan-and-execute", "repeat until",
            "until enough",
        ],
        FieldKey::IterationLimit => &[
            "max_iter*", "max_step*", "max iteration*", "maximum iteration*",
            "maximum number of iterations", "iteration limit*", "iteration cap*",
            "step limit*", "max steps", "timeout*",
        ],
        FieldKey::MultiStep => &[
            "multi-step", "multi step", "planning", "plan", "plans", "pipeline*",
            "sequential*", "agentic", "autonomous*",
        ],
        FieldKey::TerminationCriteria => &[
            "goals_met", "terminat*", "completion criteri*", "completion threshold*",
            "done condition*", "success criteri*", "stopping", "stop condition*",
            "exit condition*",
        ],
        FieldKey::ToolMention => &[
            "tool*", "function call*", "api", "apis", "mcp", "capabilit*", "action*",
        ],
        FieldKey::ToolGrant => &[
            "tool*", "access", "capabilit*", "permission*", "grant*", "allowed",
            "function call*",
        ],
        FieldKey::PrivilegeScoping => &[
            "least privilege", "least-privilege", "minimum permission*", "scoped",
            "read-only", "tool restriction*", "permission*", "access control*",
        ],
        FieldKey::ReadOnlyRole => &[
            "read-only", "read only", "readonly", "research-only", "research only",
            "analysis-only", "view-only", "observe-only", "no write access",
        ],
        FieldKey::Justification => &[
            "because", "justif*", "rationale", "needed to", "needs to", "required to",
            "required for", "in order to", "so that", "necessary",
        ],
        FieldKey::ProductionIntent => &[
            "production", "deploy*", "agent*", "pipeline*", "tool*", "api call*",
        ],
        FieldKey::ErrorHandling => &[
            "error handling", "exception*", "retry", "retries", "fallback*", "recover*",
            "rollback*", "fault toleran*", "resilien*", "error triad",
        ],
        FieldKey::UserInput => &[
            "user input*", "user quer*", "user message*", "user request*",
            "user-provided", "user-supplied", "external input*", "untrusted input*",
            "customer*",
        ],
        FieldKey::InputValidation => &[
            "input validation", "validate input*", "validates input*",
            "validating input*", "input filter*", "input sanitiz*", "sanitiz*",
        ],
        FieldKey::OutputFiltering => &[
            "output filter*", "output validation", "content filter*", "moderation",
            "output guardrail*",
        ],
        FieldKey::ToolRestriction => &[
            "tool restriction*", "restricted tool*", "tool allowlist*",
            "tool whitelist*", "least privilege", "least-privilege",
        ],
        FieldKey::EscalationPath => &[
            "escalat*", "human review*", "human-in-the-loop", "hitl", "human approval*",
        ],
        FieldKey::AgentMention => &["agent*"],
        FieldKey::EvalMetrics => &[
            "evaluat*", "metric*", "accuracy", "latency", "benchmark*", "test set*",
            "eval set*", "quality", "measurement*", "kpi*",
        ],
        FieldKey::HumanOversight => &[
            "human-in-the-loop", "hitl", "human review*", "human approval*", "escalat*",
            "human oversight", "human intervention",
        ],
        FieldKey::EscalationTriggers => &[
            "trigger*", "escalation condition*", "when to escalate", "escalate when",
            "escalation criteri*",
        ],
        FieldKey::EscalationTimeout => &[
            "timeout*", "time limit*", "deadline*", "safe default*", "fallback action*",
        ],
        FieldKey::MemoryState => &[
            "session*", "state", "stateful", "memory", "memories", "persist*",
            "cross-session", "user preference*", "long-term memory", "remember*",
        ],
        FieldKey::MemoryScoping => &[
            "user:", "app:", "temp:", "session scope*", "session-scoped", "user scope*",
            "user-scoped", "memory scope*", "state prefix*", "ttl",
        ],
        FieldKey::Retrieval => &[
            "rag", "retrieval-augmented", "vector search*", "embedding search*",
            "knowledge base", "document retrieval",
        ],
        FieldKey::HybridSearch => &[
            "hybrid*", "bm25", "keyword search*", "sparse", "dense + sparse",
        ],
        FieldKey::RelevanceThreshold => &[
            "threshold*", "relevance score*", "confidence", "fallback*", "no result*",
            "knowledge gap*",
        ],
        FieldKey::AgentToAgent => &[
            "a2a", "agent-to-agent", "inter-agent", "agent communication",
            "agent discovery", "remote agent*",
        ],
        FieldKey::AgentCard => &[
            "agent card*", ".well-known", "agent.json", "agent descriptor*",
        ],
        FieldKey::ExternalDeployment => &[
            "production", "deploy*", "external*", "cross-service",
        ],
        FieldKey::TransportAuth => &[
            "mtls", "oauth*", "authenticat*", "authoriz*", "tls", "jwt*",
        ],
        FieldKey::MultiAgent => &[
            "multi-agent", "sub-agent*", "subagent*", "supervisor*", "orchestrat*",
            "crew*", "agent team*",
        ],
        FieldKey::AgentContracts => &[
            "contract*", "interface*", "schema*", "input format*", "output format*",
            "pydantic", "json schema*", "api contract*",
        ],
        FieldKey::ExternalToolResults => &[
            "web search*", "api call*", "external api*", "tool result*",
            "search result*", "database quer*", "crawl*",
        ],
        FieldKey::InjectionMitigation => &[
            "untrusted", "sanitize tool*", "tool output filter*", "injection*",
            "prompt injection*", "validate tool*",
        ],
        FieldKey::CostConcern => &[
            "cost*", "budget*", "token*", "expense*", "scale", "high volume",
        ],
        FieldKey::CostOptimization => &[
            "model switch*", "flash", "haiku", "cheap model*", "cost optim*",
            "token optim*", "pruning", "caching", "graceful degrad*",
        ],
        FieldKey::SideEffects => &[
            "write*", "delete*", "send*", "update*", "create*", "modif*",
            "side effect*", "side-effect*", "irreversible", "destructive",
        ],
        FieldKey::Workflow => &[
            "multi-step", "multi step", "pipeline*", "workflow*", "sequential*", "chain*",
        ],
        FieldKey::Checkpointing => &[
            "checkpoint*", "rollback*", "roll back", "snapshot*", "undo", "revert*",
            "state backup*",
        ],
        FieldKey::PrivilegedTools => &[
            "send", "delete", "write", "update", "create", "remove", "post", "publish",
            "execute", "exec", "transfer", "pay", "drop", "modify", "purchase",
        ],
        FieldKey::ToolList
        | FieldKey::UnjustifiedGrants
        | FieldKey::ReadOnlyGrants
        | FieldKey::GuardrailLayersMentioned => &[],
    }
}

#[derive(Debug, Error)]
/// A term list that cannot be compiled (in practice: one over the regex size
/// limit).
#[error("vocabulary for '{key}' does not compile: {source}")]
pub struct VocabError {
    pub key: FieldKey,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Term lists keyed by field.
pub struct Vocabulary {
    terms: BTreeMap<FieldKey, Vec<String>>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let mut terms = BTreeMap::new();
        for key in FieldKey::PHRASE
            .iter()
            .copied()
            .chain(std::iter::once(FieldKey::PrivilegedTools))
        {
            terms.insert(
                key,
                builtin_terms(key).iter().map(|t| t.to_string()).collect(),
            );
        }
        Vocabulary { terms }
    }
}

impl Vocabulary {
    pub fn terms(&self, key: FieldKey) -> &[String] {
        self.terms.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the term list for `key`.
    pub fn replace(&mut self, key: FieldKey, terms: Vec<String>) {
        self.terms.insert(key, normalize(terms));
    }

    /// Append terms for `key`, skipping ones already present.
    pub fn extend(&mut self, key: FieldKey, terms: Vec<String>) {
        let entry = self.terms.entry(key).or_default();
        for t in normalize(terms) {
            if !entry.contains(&t) {
                entry.push(t);
            }
        }
    }

    /// Compile the term list for `key` into one case-insensitive regex.
    /// Returns `Ok(None)` for an empty list: such a detector never fires.
    pub fn matcher(&self, key: FieldKey) -> Result<Option<Regex>, VocabError> {
        let alts: Vec<String> = self.terms(key).iter().map(|t| term_pattern(t)).collect();
        if alts.is_empty() {
            return Ok(None);
        }
        Regex::new(&format!("(?i)(?:{})", alts.join("|")))
            .map(Some)
            .map_err(|source| VocabError { key, source })
    }
}

fn normalize(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && t != "*")
        .collect()
}

/// Translate one term into a regex fragment.
fn term_pattern(term: &str) -> String {
    let (body, prefix) = match term.strip_suffix('*') {
        Some(b) => (b, true),
        None => (term, false),
    };
    let mut out = String::new();
    if body.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(body));
    if !prefix && body.chars().last().is_some_and(|c| c.is_alphanumeric()) {
        out.push_str(r"\b");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(term: &str, text: &str) -> bool {
        let mut v = Vocabulary::default();
        v.replace(FieldKey::Retrieval, vec![term.to_string()]);
        v.matcher(FieldKey::Retrieval).unwrap().unwrap().is_match(text)
    }

    #[test]
    fn test_whole_word_by_default() {
        assert!(matches("rag", "We use RAG over the wiki."));
        assert!(!matches("rag", "object storage"));
        assert!(!matches("rag", "ragged edges"));
    }

    #[test]
    fn test_star_makes_prefix() {
        assert!(matches("evaluat*", "An evaluation set exists"));
        assert!(!matches("evaluat*", "a devaluation"));
    }

    #[test]
    fn test_punctuated_terms() {
        assert!(matches("user:", "keys use the user: prefix"));
        assert!(matches(".well-known", "served at /.well-known/agent.json"));
        assert!(matches("max_iter*", "max_iterations = 8"));
    }

    #[test]
    fn test_replace_and_extend() {
        let mut v = Vocabulary::default();
        v.replace(FieldKey::CostConcern, vec!["  Spend ".into(), "".into()]);
        assert_eq!(v.terms(FieldKey::CostConcern), &["spend".to_string()]);
        v.extend(FieldKey::CostConcern, vec!["spend".into(), "invoice*".into()]);
        assert_eq!(v.terms(FieldKey::CostConcern).len(), 2);
    }

    #[test]
    fn test_empty_list_has_no_matcher() {
        let mut v = Vocabulary::default();
        v.replace(FieldKey::AgentMention, vec![]);
        assert!(v.matcher(FieldKey::AgentMention).unwrap().is_none());
    }

    #[test]
    fn test_every_phrase_key_has_builtin_terms() {
        let v = Vocabulary::default();
        for key in FieldKey::PHRASE {
            assert!(!v.terms(key).is_empty(), "{} has no terms", key);
            assert!(v.matcher(key).unwrap().is_some());
        }
        assert!(!v.terms(FieldKey::PrivilegedTools).is_empty());
    }

    #[test]
    fn test_oversized_term_list_is_an_error() {
        let mut v = Vocabulary::default();
        v.replace(FieldKey::Retrieval, vec!["x".repeat(2_000_000)]);
        let err = v.matcher(FieldKey::Retrieval).unwrap_err();
        assert_eq!(err.key, FieldKey::Retrieval);
        assert!(err.to_string().contains("retrieval"));
    }
}
