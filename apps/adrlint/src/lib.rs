//! adrlint core library.
//!
//! This crate exposes programmatic APIs for linting architecture decision
//! records (ADR markdown) against a fixed set of agentic-architecture rules.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `vocab`: Field keys and the phrase lists behind each detector.
//! - `document`: Tolerant markdown model with extracted fields.
//! - `rules`: Rule definitions, the 17 built-in rules, and the registry.
//! - `lint`: Rule evaluation with failure isolation, and the file driver.
//! - `models`: Severity, finding, summary and report structs.
//! - `output`: JSON/text renderers.
//! - `error`: Input errors.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod lint;
pub mod models;
pub mod output;
pub mod rules;
pub mod utils;
pub mod vocab;

pub use document::{Builder, Document};
pub use error::LintError;
pub use models::{Finding, Report, Severity, Summary};
pub use rules::{Outcome, Profile, Registry, Rule, RuleError};
