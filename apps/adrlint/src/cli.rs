//! CLI argument parsing via `clap`.

use crate::output::OutputFormat;
use crate::rules::Profile;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "adrlint",
    version,
    about = "Deterministic linter for agentic architecture decision records",
    long_about = "adrlint scans ADR markdown for missing or risky architecture decisions and reports severity-tagged findings.\n\nExit codes: 0 = no CRITICAL finding, 1 = at least one CRITICAL finding, 2 = input error.\nConfiguration precedence: CLI > adrlint.toml > defaults.",
    after_help = "Examples:\n  adrlint docs/adr/0007-research-agent.md\n  adrlint docs/adr/0007-research-agent.md --format text\n  adrlint 'docs/adr/*.md' --profile draft\n  adrlint --list-rules",
    arg_required_else_help = true
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(
        value_name = "ADR",
        required_unless_present = "list_rules",
        help = "ADR markdown file(s); glob patterns are expanded"
    )]
    pub paths: Vec<String>,
    #[arg(long, value_enum, help = "Output format: json|text (default: json)")]
    pub format: Option<OutputFormat>,
    #[arg(long, value_enum, help = "Rule profile: strict|draft (default: strict)")]
    pub profile: Option<Profile>,
    #[arg(long, help = "Path to adrlint.toml|yaml (default: discovered)")]
    pub config: Option<PathBuf>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable colored text output")]
    pub no_color: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the active rules and exit")]
    pub list_rules: bool,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Log more to stderr (-v info, -vv debug)")]
    pub verbose: u8,
}
