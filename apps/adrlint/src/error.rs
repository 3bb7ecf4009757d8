//! Input errors: the only failures that stop a lint run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LintError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a UTF-8 text file", path.display())]
    NotText { path: PathBuf },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no files match '{0}'")]
    NoMatch(String),

    #[error("invalid config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl LintError {
    /// Process exit code for input errors; distinct from the 0/1 verdicts.
    pub const EXIT_CODE: u8 = 2;
}
