//! The 17 reference rules.
//!
//! Most rules are "trigger without safeguard" checks: the document talks
//! about X (a trigger field is present) but never declares the matching
//! safeguard field. Two rules look at structure as well: `least_privilege`
//! inspects side-effecting tool grants, and `guardrails_required` checks the
//! full safety-layer checklist.

use super::{Evidence, Outcome, Rule, RuleError, RuleMeta};
use crate::document::Document;
use crate::models::Severity;
use crate::vocab::FieldKey;

type Check = Result<Outcome, RuleError>;

/// Registration order is report order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(MAX_ITERATIONS, max_iterations),
        Rule::new(TERMINATION_CRITERIA, termination_criteria),
        Rule::new(LEAST_PRIVILEGE, least_privilege),
        Rule::new(ERROR_HANDLING, error_handling),
        Rule::new(GUARDRAILS, guardrails),
        Rule::new(EVAL_METRICS, eval_metrics),
        Rule::new(HITL_TRIGGERS, hitl_triggers),
        Rule::new(HITL_TIMEOUT, hitl_timeout),
        Rule::new(MEMORY_SCOPING, memory_scoping),
        Rule::new(RAG_HYBRID_SEARCH, rag_hybrid_search),
        Rule::new(A2A_AGENT_CARD, a2a_agent_card),
        Rule::new(A2A_SECURITY, a2a_security),
        Rule::new(AGENT_CONTRACTS, agent_contracts),
        Rule::new(TOOL_INJECTION, tool_injection),
        Rule::new(COST_OPTIMIZATION, cost_optimization),
        Rule::new(CHECKPOINT_ROLLBACK, checkpoint_rollback),
        Rule::new(RAG_RELEVANCE, rag_relevance),
    ]
}

/// Fires when `trigger` is present and `safeguard` is absent.
fn gap(doc: &Document, trigger: FieldKey, safeguard: FieldKey, message: &str) -> Outcome {
    if doc.has(trigger) && !doc.has(safeguard) {
        Outcome::Finding(cited(doc, trigger, message))
    } else {
        Outcome::Pass
    }
}

fn cited(doc: &Document, key: FieldKey, message: &str) -> String {
    match doc.cite(key) {
        Some(c) => format!("{} Trigger: {}", message, c),
        None => message.to_string(),
    }
}

pub const MAX_ITERATIONS: RuleMeta = RuleMeta {
    code: "LINT-001",
    id: "max_iterations_required",
    severity: Severity::Critical,
    description: "Agent loops require a max_iterations or max_steps limit",
    pattern_ref: "patterns/11-goal-setting-monitoring.md",
    evidence: Evidence {
        page: 188,
        quote: "Set max_iterations alongside the goal — prevents infinite loops when goals_met() never returns true",
    },
    required_action: "Add max_iterations (or max_steps) parameter to all agent loops; document the value and rationale",
};

/// A declared completion criterion bounds the loop as well as a cap does.
fn max_iterations(doc: &Document) -> Check {
    if doc.has(FieldKey::TerminationCriteria) {
        return Ok(Outcome::Pass);
    }
    Ok(gap(
        doc,
        FieldKey::LoopLanguage,
        FieldKey::IterationLimit,
        "ADR describes an agent loop but defines neither a maximum iteration limit nor a completion criterion.",
    ))
}

pub const TERMINATION_CRITERIA: RuleMeta = RuleMeta {
    code: "LINT-002",
    id: "termination_criteria_required",
    severity: Severity::High,
    description: "Multi-step agents require explicit termination criteria",
    pattern_ref: "patterns/11-goal-setting-monitoring.md",
    evidence: Evidence {
        page: 185,
        quote: "SMART goals: Specific, Measurable, Achievable, Relevant, Time-bound — all five required for reliable agent termination",
    },
    required_action: "Define a goals_met() check or explicit success criteria; include in the ADR",
};

fn termination_criteria(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::MultiStep,
        FieldKey::TerminationCriteria,
        "ADR describes a multi-step agent but does not define explicit completion/termination criteria.",
    ))
}

pub const LEAST_PRIVILEGE: RuleMeta = RuleMeta {
    code: "LINT-003",
    id: "least_privilege",
    severity: Severity::Critical,
    description: "Tool access must follow Principle of Least Privilege",
    pattern_ref: "patterns/18-guardrails-safety.md",
    evidence: Evidence {
        page: 288,
        quote: "Apply the Principle of Least Privilege: grant agents only the tools they need for the task",
    },
    required_action: "Add a Tool Access Matrix to the ADR; justify each tool-agent assignment; separate read/write agents",
};

/// Two ways to fail: a side-effecting tool handed to a read-only role with no
/// justification nearby, or tools discussed with no scoping language at all.
fn least_privilege(doc: &Document) -> Check {
    if doc.has(FieldKey::ReadOnlyGrants) {
        let tools = doc.get(FieldKey::ReadOnlyGrants).join("`, `");
        let msg = format!(
            "Side-effecting tool access `{}` is granted to a role described as read-only, with no justification nearby.",
            tools
        );
        return Ok(Outcome::Finding(cited(doc, FieldKey::ReadOnlyRole, &msg)));
    }
    Ok(gap(
        doc,
        FieldKey::ToolMention,
        FieldKey::PrivilegeScoping,
        "ADR references tools but does not apply Principle of Least Privilege: no mention of scoping or access restrictions.",
    ))
}

pub const ERROR_HANDLING: RuleMeta = RuleMeta {
    code: "LINT-004",
    id: "error_handling_required",
    severity: Severity::High,
    description: "Production agents require an error handling strategy",
    pattern_ref: "patterns/12-exception-handling-recovery.md",
    evidence: Evidence {
        page: 203,
        quote: "The Error Triad: Error Detection → Error Handling → Recovery. All three must be addressed.",
    },
    required_action: "Add error handling section covering: error classification, retry strategy, fallback handlers, escalation path",
};

fn error_handling(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::ProductionIntent,
        FieldKey::ErrorHandling,
        "ADR does not describe error handling, retry logic, or recovery strategies.",
    ))
}

pub const GUARDRAILS: RuleMeta = RuleMeta {
    code: "LINT-005",
    id: "guardrails_required",
    severity: Severity::Critical,
    description: "Agents with user-facing inputs require multi-layer safety guardrails",
    pattern_ref: "patterns/18-guardrails-safety.md",
    evidence: Evidence {
        page: 286,
        quote: "Six-layer defense: (1) Input Validation, (2) Output Filtering, (3) Behavioral Constraints, (4) Tool Restrictions, (5) Moderation API, (6) HITL",
    },
    required_action: "Define at minimum: input validation, output filtering, tool restrictions, and an escalation path",
};

fn guardrails(doc: &Document) -> Check {
    if !doc.has(FieldKey::UserInput) {
        return Ok(Outcome::Pass);
    }
    let present = doc.get(FieldKey::GuardrailLayersMentioned);
    let missing: Vec<&str> = FieldKey::GUARDRAIL_LAYERS
        .iter()
        .map(|k| k.as_str())
        .filter(|k| !present.iter().any(|p| p == k))
        .collect();
    if missing.is_empty() {
        return Ok(Outcome::Pass);
    }
    let msg = format!(
        "ADR handles user or untrusted input but does not define these safety layers: {}.",
        missing.join(", ")
    );
    Ok(Outcome::Finding(cited(doc, FieldKey::UserInput, &msg)))
}

pub const EVAL_METRICS: RuleMeta = RuleMeta {
    code: "LINT-006",
    id: "eval_metrics_required",
    severity: Severity::High,
    description: "Agent deployments require evaluation metrics defined before deployment",
    pattern_ref: "patterns/19-evaluation-monitoring.md",
    evidence: Evidence {
        page: 303,
        quote: "Define metrics before building the agent — retrofitting metrics is unreliable",
    },
    required_action: "Add Evaluation Plan to ADR: define accuracy target, latency target, token budget, and eval method",
};

fn eval_metrics(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::AgentMention,
        FieldKey::EvalMetrics,
        "ADR does not define evaluation metrics, eval set, or quality measurement approach.",
    ))
}

pub const HITL_TRIGGERS: RuleMeta = RuleMeta {
    code: "LINT-007",
    id: "hitl_triggers_required",
    severity: Severity::High,
    description: "HITL integration requires explicit escalation triggers",
    pattern_ref: "patterns/13-hitl.md",
    evidence: Evidence {
        page: 211,
        quote: "Define explicit escalation triggers in the agent's system prompt — don't rely on the agent to infer when to escalate",
    },
    required_action: "List all escalation triggers explicitly in the ADR and in the agent system prompt",
};

fn hitl_triggers(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::HumanOversight,
        FieldKey::EscalationTriggers,
        "ADR mentions HITL but does not define explicit escalation triggers.",
    ))
}

pub const HITL_TIMEOUT: RuleMeta = RuleMeta {
    code: "LINT-008",
    id: "hitl_timeout_required",
    severity: Severity::Medium,
    description: "HITL escalation requires a timeout with a safe default action",
    pattern_ref: "patterns/13-hitl.md",
    evidence: Evidence {
        page: 214,
        quote: "Implement timeouts on escalation requests — if no human responds within N minutes, use a safe default action or abort",
    },
    required_action: "Define timeout duration and safe default action (abort task, return partial result, etc.)",
};

fn hitl_timeout(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::HumanOversight,
        FieldKey::EscalationTimeout,
        "HITL is defined but no timeout or safe default action is specified for unresponsive humans.",
    ))
}

pub const MEMORY_SCOPING: RuleMeta = RuleMeta {
    code: "LINT-009",
    id: "memory_scoping_required",
    severity: Severity::High,
    description: "Agents with state/memory must use correct prefix scoping",
    pattern_ref: "patterns/08-memory-management.md",
    evidence: Evidence {
        page: 151,
        quote: "Use user: prefix for user-scoped state, app: for app-global, temp: for ephemeral. Mixing scopes causes data leakage between users.",
    },
    required_action: "Add Memory Design table to ADR defining scope, storage, and TTL for each data type",
};

fn memory_scoping(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::MemoryState,
        FieldKey::MemoryScoping,
        "ADR mentions state/memory but does not define scoping (user:/app:/temp: prefixes or equivalent).",
    ))
}

pub const RAG_HYBRID_SEARCH: RuleMeta = RuleMeta {
    code: "LINT-010",
    id: "rag_hybrid_search",
    severity: Severity::Medium,
    description: "RAG implementations should use hybrid search (BM25 + vector)",
    pattern_ref: "patterns/14-rag.md",
    evidence: Evidence {
        page: 222,
        quote: "Hybrid search (BM25 + vector) significantly outperforms either alone for production retrieval",
    },
    required_action: "Consider adding BM25 keyword search to augment vector search; use a re-ranker for final results",
};

fn rag_hybrid_search(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::Retrieval,
        FieldKey::HybridSearch,
        "ADR uses RAG but only mentions vector/embedding search, not hybrid (BM25 + vector).",
    ))
}

pub const A2A_AGENT_CARD: RuleMeta = RuleMeta {
    code: "LINT-011",
    id: "a2a_agent_card_required",
    severity: Severity::High,
    description: "A2A integrations require an Agent Card at /.well-known/agent.json",
    pattern_ref: "patterns/15-a2a-communication.md",
    evidence: Evidence {
        page: 243,
        quote: "Every A2A agent must publish an Agent Card at /.well-known/agent.json — this is the discovery mechanism",
    },
    required_action: "Define Agent Card JSON structure; specify capabilities, endpoints, and authentication scheme",
};

fn a2a_agent_card(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::AgentToAgent,
        FieldKey::AgentCard,
        "ADR describes A2A communication but does not define Agent Cards for discovery.",
    ))
}

pub const A2A_SECURITY: RuleMeta = RuleMeta {
    code: "LINT-012",
    id: "a2a_security_required",
    severity: Severity::Critical,
    description: "A2A production deployments require mTLS + OAuth2 authentication",
    pattern_ref: "patterns/15-a2a-communication.md",
    evidence: Evidence {
        page: 248,
        quote: "Use mTLS (mutual TLS) for transport-layer authentication + OAuth2 bearer tokens for agent-level authorization",
    },
    required_action: "Specify mTLS certificate strategy and OAuth2 token flow for all A2A endpoints",
};

fn a2a_security(doc: &Document) -> Check {
    if !doc.has(FieldKey::ExternalDeployment) {
        return Ok(Outcome::Pass);
    }
    Ok(gap(
        doc,
        FieldKey::AgentToAgent,
        FieldKey::TransportAuth,
        "A2A communication described for production but no authentication mechanism defined.",
    ))
}

pub const AGENT_CONTRACTS: RuleMeta = RuleMeta {
    code: "LINT-013",
    id: "agent_contracts_required",
    severity: Severity::High,
    description: "Multi-agent systems require defined input/output contracts",
    pattern_ref: "patterns/07-multi-agent-collaboration.md",
    evidence: Evidence {
        page: 126,
        quote: "Define explicit contracts between agents: what input format, what output format",
    },
    required_action: "Define input/output schemas (Pydantic models or JSON schemas) for all inter-agent interfaces",
};

fn agent_contracts(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::MultiAgent,
        FieldKey::AgentContracts,
        "Multi-agent system described but no contracts defined between agents.",
    ))
}

pub const TOOL_INJECTION: RuleMeta = RuleMeta {
    code: "LINT-014",
    id: "tool_injection_risk",
    severity: Severity::High,
    description: "External tool outputs must be treated as potentially adversarial",
    pattern_ref: "patterns/18-guardrails-safety.md",
    evidence: Evidence {
        page: 289,
        quote: "Never trust tool outputs — treat them as potentially adversarial (prompt injection risk)",
    },
    required_action: "Add output filtering/validation for tool results before including in agent context",
};

fn tool_injection(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::ExternalToolResults,
        FieldKey::InjectionMitigation,
        "ADR uses external tool calls but does not address prompt injection from tool outputs.",
    ))
}

pub const COST_OPTIMIZATION: RuleMeta = RuleMeta {
    code: "LINT-015",
    id: "cost_optimization",
    severity: Severity::Low,
    description: "Consider resource-aware optimization for cost management",
    pattern_ref: "patterns/16-resource-aware-optimization.md",
    evidence: Evidence {
        page: 257,
        quote: "Route simple tasks to Flash/Haiku (fast, cheap); complex tasks to Pro/Opus (high-quality). Use cheap model for routing decision.",
    },
    required_action: "Consider adding: dynamic model selection, contextual pruning, response caching",
};

fn cost_optimization(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::CostConcern,
        FieldKey::CostOptimization,
        "ADR mentions cost concerns but does not describe dynamic model switching or other optimization techniques.",
    ))
}

pub const CHECKPOINT_ROLLBACK: RuleMeta = RuleMeta {
    code: "LINT-016",
    id: "checkpoint_rollback",
    severity: Severity::Medium,
    description: "Multi-step tasks with side effects should implement checkpointing",
    pattern_ref: "patterns/12-exception-handling-recovery.md",
    evidence: Evidence {
        page: 290,
        quote: "Implement checkpoint-and-rollback for multi-step tasks with side effects",
    },
    required_action: "Define checkpoint locations (at major milestones) and rollback procedure for each",
};

fn checkpoint_rollback(doc: &Document) -> Check {
    if !doc.has(FieldKey::SideEffects) {
        return Ok(Outcome::Pass);
    }
    Ok(gap(
        doc,
        FieldKey::Workflow,
        FieldKey::Checkpointing,
        "ADR describes multi-step workflow with side effects but no checkpoint/rollback mechanism.",
    ))
}

pub const RAG_RELEVANCE: RuleMeta = RuleMeta {
    code: "LINT-017",
    id: "rag_relevance_threshold",
    severity: Severity::Medium,
    description: "RAG should define a relevance threshold to avoid hallucination",
    pattern_ref: "patterns/14-rag.md",
    evidence: Evidence {
        page: 225,
        quote: "Set a relevance threshold — if no chunk exceeds the threshold, acknowledge the knowledge gap rather than hallucinating",
    },
    required_action: "Define minimum relevance score; specify behavior when no chunks meet threshold (e.g., 'I don't have information on this')",
};

fn rag_relevance(doc: &Document) -> Check {
    Ok(gap(
        doc,
        FieldKey::Retrieval,
        FieldKey::RelevanceThreshold,
        "RAG described but no relevance threshold defined; the agent may hallucinate when no relevant chunks are found.",
    ))
}
