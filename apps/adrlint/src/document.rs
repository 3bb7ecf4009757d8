//! Document model: sections and heuristic fields extracted from ADR markdown.
//!
//! Building never fails. Anything the detectors cannot recognize simply
//! leaves its field absent, which is what most rules key off.
//!
//! Detectors:
//! - Phrase fields (`FieldKey::PHRASE`): trimmed lines containing any
//!   vocabulary term, in document order, deduplicated.
//! - `tool_list`: inline-code spans and snake_case identifiers found on
//!   `tool_grant` lines or under a tool-grant heading.
//! - `privileged_tools`: listed tools whose name has a side-effecting verb
//!   segment (`email_send`, `delete-file`).
//! - `unjustified_grants`: privileged tools with no `justification` phrase on
//!   any line within one line of a mention.
//! - `read_only_grants`: unjustified grants whose owning role is read-only.
//!   The owner of a mention is the closest line at or above it that
//!   describes a role (`read_only_role` or `agent_mention`); a heading that
//!   is not a tool-grant heading ends the search with no owner.
//! - `guardrail_layers_mentioned`: the checklist layers that were detected.

use crate::vocab::{FieldKey, VocabError, Vocabulary};
use regex::Regex;
use std::collections::BTreeMap;

/// Longest excerpt kept per matched line.
const EXCERPT_CHARS: usize = 160;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A markdown section. Text before the first heading becomes a level-0
/// section with an empty heading.
pub struct Section {
    pub heading: String,
    pub level: usize,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable, queryable view of one input document.
pub struct Document {
    raw_text: String,
    sections: Vec<Section>,
    fields: BTreeMap<FieldKey, Vec<String>>,
}

impl Document {
    /// Build with the built-in vocabulary.
    pub fn parse(raw_text: &str) -> Document {
        Builder::default().build(raw_text)
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn fields(&self) -> &BTreeMap<FieldKey, Vec<String>> {
        &self.fields
    }

    /// Values for `key`; empty when the field is absent.
    pub fn get(&self, key: FieldKey) -> &[String] {
        self.fields.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, key: FieldKey) -> bool {
        !self.get(key).is_empty()
    }

    pub fn first(&self, key: FieldKey) -> Option<&str> {
        self.get(key).first().map(String::as_str)
    }

    /// First section whose body contains `excerpt`. Truncated excerpts are
    /// matched on their kept prefix.
    pub fn section_of(&self, excerpt: &str) -> Option<&Section> {
        let needle = excerpt.strip_suffix(ELLIPSIS).unwrap_or(excerpt);
        self.sections
            .iter()
            .find(|s| s.body.lines().any(|l| l.contains(needle)))
    }

    /// Render the first value of `key` as a quoted excerpt, naming its
    /// section when it has a heading.
    pub fn cite(&self, key: FieldKey) -> Option<String> {
        let excerpt = self.first(key)?;
        match self.section_of(excerpt) {
            Some(s) if !s.heading.is_empty() => {
                Some(format!("\"{}\" (section \"{}\")", excerpt, s.heading))
            }
            _ => Some(format!("\"{}\"", excerpt)),
        }
    }
}

#[derive(Debug, Clone)]
/// Compiled detectors. Build once per run and share across documents.
pub struct Builder {
    matchers: Vec<(FieldKey, Regex)>,
    grant: Option<Regex>,
    privileged_verbs: Vec<String>,
    heading: Regex,
    inline_code: Regex,
    snake_ident: Regex,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new(&Vocabulary::default()).expect("built-in vocabulary compiles")
    }
}

impl Builder {
    /// Compile every detector. Fails only when a configured term list does
    /// not compile.
    pub fn new(vocab: &Vocabulary) -> Result<Self, VocabError> {
        let mut matchers = Vec::new();
        for key in FieldKey::PHRASE {
            if let Some(re) = vocab.matcher(key)? {
                matchers.push((key, re));
            }
        }
        Ok(Builder {
            matchers,
            grant: vocab.matcher(FieldKey::ToolGrant)?,
            privileged_verbs: vocab.terms(FieldKey::PrivilegedTools).to_vec(),
            heading: Regex::new(r"^\s{0,3}(#{1,6})\s+(.*?)\s*#*\s*$").expect("static regex"),
            inline_code: Regex::new(r"`([A-Za-z][A-Za-z0-9_.\-]*)`").expect("static regex"),
            snake_ident: Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b").expect("static regex"),
        })
    }

    /// Build the document model. Total over all inputs.
    pub fn build(&self, raw_text: &str) -> Document {
        let lines: Vec<&str> = raw_text.lines().collect();
        let mut fields: BTreeMap<FieldKey, Vec<String>> = BTreeMap::new();

        let hits = self.detect_phrases(&lines);
        for (key, idxs) in hits.iter() {
            let values = excerpts(&lines, idxs);
            if !values.is_empty() {
                fields.insert(*key, values);
            }
        }

        let grant_lines = hits.get(&FieldKey::ToolGrant).cloned().unwrap_or_default();
        let tools = self.detect_tools(&lines, &grant_lines);
        let privileged = self.detect_privileged(&tools);
        let justified = hits.get(&FieldKey::Justification).cloned().unwrap_or_default();
        let unjustified = detect_unjustified(&lines, &privileged, &justified);
        let read_only = self.detect_read_only_grants(&lines, &unjustified, &hits);
        let layers = detect_guardrail_layers(&fields);

        for (key, values) in [
            (FieldKey::ToolList, tools),
            (FieldKey::PrivilegedTools, privileged),
            (FieldKey::UnjustifiedGrants, unjustified),
            (FieldKey::ReadOnlyGrants, read_only),
            (FieldKey::GuardrailLayersMentioned, layers),
        ] {
            if !values.is_empty() {
                fields.insert(key, values);
            }
        }

        tracing::debug!(
            lines = lines.len(),
            fields = fields.len(),
            "document model built"
        );
        Document {
            raw_text: raw_text.to_string(),
            sections: self.split_sections(&lines),
            fields,
        }
    }

    /// Line indices per phrase field.
    fn detect_phrases(&self, lines: &[&str]) -> BTreeMap<FieldKey, Vec<usize>> {
        let mut out: BTreeMap<FieldKey, Vec<usize>> = BTreeMap::new();
        for (key, re) in self.matchers.iter() {
            let idxs: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, l)| re.is_match(l))
                .map(|(i, _)| i)
                .collect();
            if !idxs.is_empty() {
                out.insert(*key, idxs);
            }
        }
        out
    }

    /// Tool identifiers declared on tool-grant lines, or anywhere under a
    /// heading that reads like a tool-grant heading ("Tools", "Access").
    fn detect_tools(&self, lines: &[&str], grant_lines: &[usize]) -> Vec<String> {
        let mut tools: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            let name = name.trim_matches(|c: char| c == '.' || c == '-');
            if !name.is_empty() && !tools.iter().any(|t| t == name) {
                tools.push(name.to_string());
            }
        };
        let mut in_grant_section = false;
        for (i, line) in lines.iter().enumerate() {
            if let Some(cap) = self.heading.captures(line) {
                in_grant_section = self
                    .grant
                    .as_ref()
                    .is_some_and(|re| re.is_match(&cap[2]));
                continue;
            }
            if !in_grant_section && !grant_lines.contains(&i) {
                continue;
            }
            for cap in self.inline_code.captures_iter(line) {
                push(&cap[1]);
            }
            for m in self.snake_ident.find_iter(line) {
                push(m.as_str());
            }
        }
        tools
    }

    /// Tools whose name contains a side-effecting verb as a whole segment.
    fn detect_privileged(&self, tools: &[String]) -> Vec<String> {
        tools
            .iter()
            .filter(|t| {
                t.to_lowercase()
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .any(|seg| self.privileged_verbs.iter().any(|v| v == seg))
            })
            .cloned()
            .collect()
    }

    /// Unjustified grants with at least one mention owned by a read-only role.
    fn detect_read_only_grants(
        &self,
        lines: &[&str],
        unjustified: &[String],
        hits: &BTreeMap<FieldKey, Vec<usize>>,
    ) -> Vec<String> {
        let hit = |key: FieldKey, i: usize| hits.get(&key).is_some_and(|v| v.contains(&i));
        let owned_by_read_only = |mention: usize| {
            for j in (0..=mention).rev() {
                if hit(FieldKey::ReadOnlyRole, j) {
                    return true;
                }
                if hit(FieldKey::AgentMention, j) {
                    return false;
                }
                if let Some(cap) = self.heading.captures(lines[j]) {
                    let grant_heading = self.grant.as_ref().is_some_and(|re| re.is_match(&cap[2]));
                    if !grant_heading {
                        return false;
                    }
                }
            }
            false
        };
        unjustified
            .iter()
            .filter(|tool| {
                lines
                    .iter()
                    .enumerate()
                    .any(|(i, l)| l.contains(tool.as_str()) && owned_by_read_only(i))
            })
            .cloned()
            .collect()
    }

    /// Split into ATX sections, ignoring `#` lines inside fenced code.
    fn split_sections(&self, lines: &[&str]) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut current = Section {
            heading: String::new(),
            level: 0,
            body: String::new(),
        };
        let mut fence: Option<&str> = None;
        for line in lines {
            let trimmed = line.trim_start();
            if let Some(marker) = fence {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
            } else if trimmed.starts_with("```") {
                fence = Some("```");
            } else if trimmed.starts_with("~~~") {
                fence = Some("~~~");
            } else if let Some(cap) = self.heading.captures(line) {
                let done = std::mem::replace(
                    &mut current,
                    Section {
                        heading: cap[2].to_string(),
                        level: cap[1].len(),
                        body: String::new(),
                    },
                );
                if done.level > 0 || !done.body.trim().is_empty() {
                    sections.push(done);
                }
                continue;
            }
            if !current.body.is_empty() {
                current.body.push('\n');
            }
            current.body.push_str(line);
        }
        if current.level > 0 || !current.body.trim().is_empty() {
            sections.push(current);
        }
        sections
    }
}

fn excerpts(lines: &[&str], idxs: &[usize]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for &i in idxs {
        let e = excerpt(lines[i]);
        if !e.is_empty() && !out.contains(&e) {
            out.push(e);
        }
    }
    out
}

fn excerpt(line: &str) -> String {
    let t = line.trim();
    if t.chars().count() <= EXCERPT_CHARS {
        return t.to_string();
    }
    let mut s: String = t.chars().take(EXCERPT_CHARS).collect();
    s.push_str(ELLIPSIS);
    s
}

/// A grant is justified when any mention of the tool sits within one line of
/// a justification phrase.
fn detect_unjustified(lines: &[&str], privileged: &[String], justified: &[usize]) -> Vec<String> {
    privileged
        .iter()
        .filter(|tool| {
            let mentions: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, l)| l.contains(tool.as_str()))
                .map(|(i, _)| i)
                .collect();
            !mentions
                .iter()
                .any(|&m| justified.iter().any(|&j| j.abs_diff(m) <= 1))
        })
        .cloned()
        .collect()
}

fn detect_guardrail_layers(fields: &BTreeMap<FieldKey, Vec<String>>) -> Vec<String> {
    FieldKey::GUARDRAIL_LAYERS
        .iter()
        .filter(|k| fields.contains_key(k))
        .map(|k| k.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_fields() {
        let doc = Document::parse("");
        assert!(doc.fields().is_empty());
        assert!(doc.sections().is_empty());
        assert_eq!(doc.raw_text(), "");
    }

    #[test]
    fn test_garbage_input_is_tolerated() {
        let text = "\u{0}\u{1}### \n#\n```\n# not a heading\n";
        let doc = Document::parse(text);
        assert_eq!(doc.raw_text(), text);
        assert!(doc.sections().iter().all(|s| s.heading != "not a heading"));
    }

    #[test]
    fn test_sections_split_on_headings() {
        let doc = Document::parse(
            "Intro text\n# Title\nbody one\n## Tools ##\n- `web_search`\n```\n# code\n```\n",
        );
        let secs = doc.sections();
        assert_eq!(secs.len(), 3);
        assert_eq!(secs[0].heading, "");
        assert_eq!(secs[0].level, 0);
        assert_eq!(secs[1].heading, "Title");
        assert_eq!(secs[2].heading, "Tools");
        assert_eq!(secs[2].level, 2);
        assert!(secs[2].body.contains("# code"));
    }

    #[test]
    fn test_phrase_fields_hold_matching_lines() {
        let doc = Document::parse("The agent will Loop until done.\nSet MAX_ITERATIONS = 5.\n");
        assert_eq!(doc.get(FieldKey::LoopLanguage), &["The agent will Loop until done."]);
        assert!(doc.has(FieldKey::IterationLimit));
        assert!(!doc.has(FieldKey::Retrieval));
    }

    #[test]
    fn test_tool_list_and_privileged_tools() {
        let doc = Document::parse(
            "## Tool access\n- `web_search` and `email_send`\nThe fetch_page tool is granted.\n",
        );
        assert_eq!(
            doc.get(FieldKey::ToolList),
            &["web_search", "email_send", "fetch_page"]
        );
        assert_eq!(doc.get(FieldKey::PrivilegedTools), &["email_send"]);
        assert_eq!(doc.get(FieldKey::UnjustifiedGrants), &["email_send"]);
    }

    #[test]
    fn test_justification_nearby_clears_grant() {
        let doc = Document::parse(
            "Tools: `email_send`\nThe notifier needs to mail weekly digests.\n",
        );
        assert_eq!(doc.get(FieldKey::PrivilegedTools), &["email_send"]);
        assert!(!doc.has(FieldKey::UnjustifiedGrants));
    }

    #[test]
    fn test_guardrail_layers_listed() {
        let doc = Document::parse("We apply input validation and output filtering.");
        assert_eq!(
            doc.get(FieldKey::GuardrailLayersMentioned),
            &["input_validation", "output_filtering"]
        );
    }

    #[test]
    fn test_cite_names_section() {
        let doc = Document::parse("# Design\nWe loop forever.\n");
        assert_eq!(
            doc.cite(FieldKey::LoopLanguage).unwrap(),
            "\"We loop forever.\" (section \"Design\")"
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "# A\nuser input flows to the agent; retry on failure.\n- `db_write`\n";
        assert_eq!(Document::parse(text), Document::parse(text));
    }

    #[test]
    fn test_custom_vocabulary_changes_detection() {
        let mut vocab = Vocabulary::default();
        vocab.extend(FieldKey::IterationLimit, vec!["hard stop".into()]);
        let doc = Builder::new(&vocab).unwrap().build("We loop with a hard stop at 10.");
        assert!(doc.has(FieldKey::IterationLimit));
    }

    #[test]
    fn test_read_only_grant_follows_owning_role() {
        let doc = Document::parse(
            "The analyst agent is research-only.\n\n## Tools\n- `email_send`\n",
        );
        assert_eq!(doc.get(FieldKey::ReadOnlyGrants), &["email_send"]);

        let other_agent = Document::parse(
            "## Roles\nThe reporter agent is read-only over the warehouse.\n\n## Notifier\nThe notifier agent has tool access: `email_send`.\n",
        );
        assert_eq!(other_agent.get(FieldKey::UnjustifiedGrants), &["email_send"]);
        assert!(!other_agent.has(FieldKey::ReadOnlyGrants));

        let other_section = Document::parse(
            "The reporter agent is read-only.\n## Delivery\n- `email_send` tool\n",
        );
        assert_eq!(other_section.get(FieldKey::UnjustifiedGrants), &["email_send"]);
        assert!(!other_section.has(FieldKey::ReadOnlyGrants));
    }

    #[test]
    fn test_cite_names_section_of_truncated_line() {
        let long = format!("We loop {}", "over every source ".repeat(12));
        let doc = Document::parse(&format!("# Crawl\n{}\n", long));
        let cite = doc.cite(FieldKey::LoopLanguage).unwrap();
        assert!(cite.contains("...\""));
        assert!(cite.ends_with("(section \"Crawl\")"));
    }
}
