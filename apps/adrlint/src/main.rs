//! adrlint CLI binary entry point.
//! Resolves configuration, lints the inputs, prints the report and maps the
//! verdict to the exit code.

use adrlint::cli::Cli;
use adrlint::error::LintError;
use adrlint::output::{self, OutputFormat};
use adrlint::rules::Registry;
use adrlint::{config, lint, utils};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            ExitCode::from(LintError::EXIT_CODE)
        }
    }
}

/// Logs go to stderr; stdout carries only the report. `RUST_LOG`, when set,
/// takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, LintError> {
    let cwd = std::env::current_dir().map_err(|source| LintError::Read {
        path: PathBuf::from("."),
        source,
    })?;
    let eff = config::resolve_effective(
        cli.config.as_deref(),
        cli.format,
        cli.profile,
        cli.no_color,
        &cwd,
    )?;
    match eff.config_path.as_ref() {
        Some(p) => tracing::info!(config = %p.display(), "using config"),
        None if cli.verbose > 0 => {
            eprintln!("{} No adrlint.toml found; using defaults.", utils::note_prefix())
        }
        None => {}
    }

    let registry = Registry::for_profile(eff.profile).without(&eff.disabled);
    let color = eff.color
        && eff.format == OutputFormat::Text
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();

    if cli.list_rules {
        print!("{}", output::render_rule_list(&registry, color));
        return Ok(ExitCode::SUCCESS);
    }

    let inputs = lint::expand_inputs(&cli.paths)?;
    if inputs.len() > 1 {
        tracing::info!(files = inputs.len(), "linting multiple files");
    }
    let builder = eff.builder()?;
    let reports = lint::run_lint(&inputs, &builder, &registry)?;
    print!("{}", output::render_all(&reports, eff.format, color));

    let status = lint::exit_status(&reports);
    if status != 0 && eff.format == OutputFormat::Text {
        eprintln!(
            "{} CRITICAL findings present; failing the run.",
            utils::info_prefix()
        );
    }
    Ok(ExitCode::from(status as u8))
}
