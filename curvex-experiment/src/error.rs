use std::path::PathBuf;
use thiserror::Error;

/// Problems that stop the experiment before the first stage runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required driver `{0}` was not supplied")]
    MissingDriver(&'static str),

    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no trial-definition (.csv) files found in {}", .0.display())]
    NoTrialFiles(PathBuf),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read trial file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trial file contains no usable rows ({skipped} skipped)")]
    NoTrials { skipped: usize },
}

/// Why a single trial row was dropped. Logged, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("unknown rotation direction `{0}`")]
    UnknownDirection(String),

    #[error("field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` is not a boolean: `{value}`")]
    InvalidBool { field: &'static str, value: String },

    #[error("field `{field}` out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("trial data was already flushed")]
    AlreadyFlushed,

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode session summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed trial data at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
