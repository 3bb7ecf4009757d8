//! Configuration discovery and effective settings resolution.
//!
//! adrlint reads `adrlint.toml|yaml|yml` from the current directory (or the
//! closest ancestor, stopping at a `.git` root), or the file passed with
//! `--config`, and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `format`: `json`
//! - `profile`: `strict`
//! - `color`: true (text output to a terminal only; `NO_COLOR` wins)
//! - `rules.disable`: none
//! - `vocabulary` / `vocabulary_extend`: built-in term lists
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::document::Builder;
use crate::error::LintError;
use crate::output::OutputFormat;
use crate::rules::Profile;
use crate::vocab::{FieldKey, Vocabulary};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["adrlint.toml", "adrlint.yaml", "adrlint.yml"];

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
/// Root configuration loaded from `adrlint.toml|yaml`.
pub struct AdrlintConfig {
    pub format: Option<OutputFormat>,
    pub profile: Option<Profile>,
    pub color: Option<bool>,
    #[serde(default)]
    pub rules: Option<RulesCfg>,
    /// `[vocabulary] <field> = [terms]` replaces the built-in list.
    #[serde(default)]
    pub vocabulary: Option<BTreeMap<FieldKey, Vec<String>>>,
    /// `[vocabulary_extend] <field> = [terms]` appends to it.
    #[serde(default)]
    pub vocabulary_extend: Option<BTreeMap<FieldKey, Vec<String>>>,
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RulesCfg {
    /// Rule ids to skip entirely.
    #[serde(default)]
    pub disable: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the lint command.
pub struct Effective {
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub profile: Profile,
    pub color: bool,
    pub disabled: Vec<String>,
    pub vocabulary: Vocabulary,
}

impl Effective {
    /// Compile the detectors for the resolved vocabulary. A term list that
    /// does not compile is reported against the config file it came from.
    pub fn builder(&self) -> Result<Builder, LintError> {
        Builder::new(&self.vocabulary).map_err(|e| LintError::Config {
            path: self.config_path.clone().unwrap_or_default(),
            message: e.to_string(),
        })
    }
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding `adrlint.toml|yaml|yml`, or at a
/// directory containing `.git` (the repository root) without one.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_NAMES {
            let p = cur.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Load `AdrlintConfig` from a TOML or YAML file, chosen by extension.
pub fn load_config(path: &Path) -> Result<AdrlintConfig, LintError> {
    let invalid = |message: String| LintError::Config {
        path: path.to_path_buf(),
        message,
    };
    let s = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&s).map_err(|e| invalid(e.to_string()))
    } else {
        toml::from_str(&s).map_err(|e| invalid(e.to_string()))
    }
}

/// Resolve `Effective` by merging CLI flags, the config file, and defaults.
pub fn resolve_effective(
    cli_config: Option<&Path>,
    cli_format: Option<OutputFormat>,
    cli_profile: Option<Profile>,
    cli_no_color: bool,
    start: &Path,
) -> Result<Effective, LintError> {
    let config_path = match cli_config {
        Some(p) => Some(p.to_path_buf()),
        None => discover_config(start),
    };
    let cfg = match config_path.as_deref() {
        Some(p) => load_config(p)?,
        None => AdrlintConfig::default(),
    };

    let format = cli_format.or(cfg.format).unwrap_or_default();
    let profile = cli_profile.or(cfg.profile).unwrap_or_default();
    let color = !cli_no_color && cfg.color.unwrap_or(true);
    let disabled = cfg.rules.map(|r| r.disable).unwrap_or_default();

    let mut vocabulary = Vocabulary::default();
    for (key, terms) in cfg.vocabulary.unwrap_or_default() {
        vocabulary.replace(key, terms);
    }
    for (key, terms) in cfg.vocabulary_extend.unwrap_or_default() {
        vocabulary.extend(key, terms);
    }

    Ok(Effective {
        config_path,
        format,
        profile,
        color,
        disabled,
        vocabulary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_config() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let eff = resolve_effective(None, None, None, false, dir.path()).unwrap();
        assert!(eff.config_path.is_none());
        assert_eq!(eff.format, OutputFormat::Json);
        assert_eq!(eff.profile, Profile::Strict);
        assert!(eff.color);
        assert!(eff.disabled.is_empty());
        assert_eq!(eff.vocabulary, Vocabulary::default());
    }

    #[test]
    fn test_discover_and_load_toml_from_ancestor() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("adrlint.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
format = "text"
profile = "draft"
color = false
[rules]
disable = ["cost_optimization"]
[vocabulary]
iteration_limit = ["hard stop"]
[vocabulary_extend]
loop_language = ["poll*"]
"#
        )
        .unwrap();
        let nested = root.join("docs/adr");
        fs::create_dir_all(&nested).unwrap();

        let eff = resolve_effective(None, None, None, false, &nested).unwrap();
        assert_eq!(eff.config_path.as_deref(), Some(root.join("adrlint.toml").as_path()));
        assert_eq!(eff.format, OutputFormat::Text);
        assert_eq!(eff.profile, Profile::Draft);
        assert!(!eff.color);
        assert_eq!(eff.disabled, vec!["cost_optimization".to_string()]);
        assert_eq!(
            eff.vocabulary.terms(FieldKey::IterationLimit),
            &["hard stop".to_string()]
        );
        assert!(eff
            .vocabulary
            .terms(FieldKey::LoopLanguage)
            .contains(&"poll*".to_string()));
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("adrlint.toml"), "format = \"text\"\nprofile = \"draft\"\n").unwrap();
        let eff = resolve_effective(
            None,
            Some(OutputFormat::Json),
            Some(Profile::Strict),
            true,
            root,
        )
        .unwrap();
        assert_eq!(eff.format, OutputFormat::Json);
        assert_eq!(eff.profile, Profile::Strict);
        assert!(!eff.color);
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("adrlint.yaml");
        fs::write(
            &p,
            "format: text\nrules:\n  disable:\n    - rag_hybrid_search\n",
        )
        .unwrap();
        let cfg = load_config(&p).unwrap();
        assert_eq!(cfg.format, Some(OutputFormat::Text));
        assert_eq!(cfg.rules.unwrap().disable, vec!["rag_hybrid_search".to_string()]);
    }

    #[test]
    fn test_git_root_stops_discovery() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("adrlint.toml"), "format = \"text\"\n").unwrap();
        let repo = root.join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        assert!(discover_config(&repo).is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("adrlint.toml");
        fs::write(&p, "[vocabulary]\nnot_a_field = [\"x\"]\n").unwrap();
        let err = resolve_effective(Some(&p), None, None, false, dir.path()).unwrap_err();
        assert!(matches!(err, LintError::Config { .. }));

        let missing = dir.path().join("nope.toml");
        assert!(resolve_effective(Some(&missing), None, None, false, dir.path()).is_err());
    }

    #[test]
    fn test_uncompilable_vocabulary_is_config_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("adrlint.toml");
        let huge = "x".repeat(2_000_000);
        fs::write(&p, format!("[vocabulary]\nretrieval = [\"{}\"]\n", huge)).unwrap();
        let eff = resolve_effective(Some(&p), None, None, false, dir.path()).unwrap();
        match eff.builder() {
            Err(LintError::Config { path, message }) => {
                assert_eq!(path, p);
                assert!(message.contains("retrieval"));
            }
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
